//! JSON Web Token encoding and decoding.
//!
//! Tokens are issued at login and verified by the auth middleware on every
//! protected route.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use time::{Duration, OffsetDateTime};

use crate::{Error, user::UserID};

/// How long a token issued at login stays valid.
pub const DEFAULT_TOKEN_DURATION: Duration = Duration::minutes(15);

/// The contents of a JSON Web Token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The user the token was issued to.
    pub sub: TokenSubject,
    /// The time the token was issued, as a unix timestamp.
    pub iat: usize,
    /// The expiry time of the token, as a unix timestamp.
    pub exp: usize,
}

/// The subject claim of a token: the ID of the user it was issued to.
///
/// Tokens issued by earlier releases carried the ID as a bare JSON number,
/// so deserialization accepts both a number and a numeric string. New tokens
/// always serialize the ID as a string, which is what RFC 7519 expects of
/// `sub`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSubject(i64);

impl TokenSubject {
    /// Cast the subject to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl From<UserID> for TokenSubject {
    fn from(user_id: UserID) -> Self {
        Self(user_id.as_i64())
    }
}

impl Serialize for TokenSubject {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TokenSubject {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum NumberOrText {
            Number(i64),
            Text(String),
        }

        match NumberOrText::deserialize(deserializer)? {
            NumberOrText::Number(id) => Ok(Self(id)),
            NumberOrText::Text(text) => text
                .parse::<i64>()
                .map(Self)
                .map_err(|_| de::Error::custom(format!("\"{text}\" is not a numeric user ID"))),
        }
    }
}

/// Create a signed token for `user_id` that expires after `duration`.
///
/// # Errors
///
/// Returns [Error::TokenCreation] if signing fails, which indicates a
/// problem with the encoding key rather than the request.
pub fn encode_token(
    user_id: UserID,
    duration: Duration,
    encoding_key: &EncodingKey,
) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        sub: user_id.into(),
        iat: now.unix_timestamp() as usize,
        exp: (now + duration).unix_timestamp() as usize,
    };

    encode(&Header::default(), &claims, encoding_key).map_err(|error| {
        tracing::error!("could not sign a token: {}", error);
        Error::TokenCreation
    })
}

/// Verify `token` and extract the ID of the user it was issued to.
///
/// # Errors
///
/// Returns [Error::InvalidToken] if the signature does not match, the token
/// has expired, the payload cannot be parsed, or the subject is not a
/// positive integer.
pub fn decode_token(token: &str, decoding_key: &DecodingKey) -> Result<UserID, Error> {
    let token_data = decode::<Claims>(token, decoding_key, &Validation::default())
        .map_err(|_| Error::InvalidToken)?;

    let raw_id = token_data.claims.sub.as_i64();

    if raw_id <= 0 {
        return Err(Error::InvalidToken);
    }

    Ok(UserID::new(raw_id))
}
