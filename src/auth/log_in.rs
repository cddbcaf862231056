//! Handling of log-in requests: credential verification and token issuance.
//! The token module handles the lower level signing logic.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Json,
    extract::{FromRef, State},
};
use email_address::EmailAddress;
use jsonwebtoken::EncodingKey;
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error,
    auth::token::{DEFAULT_TOKEN_DURATION, encode_token},
    user::get_user_by_email,
};

/// Selects how much detail a failed log-in reveals.
///
/// The mode is read from the `LOGIN_ERROR_MODE` environment variable by the
/// server binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginErrorMode {
    /// Answer every credential failure with the same generic message, so
    /// responses do not disclose whether an email address is registered.
    #[default]
    Unified,
    /// Distinguish an unknown email address from a wrong password.
    Split,
}

impl FromStr for LoginErrorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unified" => Ok(Self::Unified),
            "split" => Ok(Self::Split),
            other => Err(format!(
                "unknown login error mode \"{other}\", expected \"unified\" or \"split\""
            )),
        }
    }
}

/// The state needed to perform a log-in.
#[derive(Clone)]
pub struct LoginState {
    /// The key used to sign issued tokens.
    pub encoding_key: EncodingKey,
    /// How long issued tokens stay valid.
    pub token_duration: Duration,
    /// Selects unified or split log-in error messages.
    pub login_error_mode: LoginErrorMode,
    /// The database connection holding the user table.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl LoginState {
    /// Create the signing key from a secret and set the default token duration.
    pub fn new(
        jwt_secret: &str,
        login_error_mode: LoginErrorMode,
        db_connection: Arc<Mutex<Connection>>,
    ) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_ref()),
            token_duration: DEFAULT_TOKEN_DURATION,
            login_error_mode,
            db_connection,
        }
    }
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            encoding_key: state.encoding_key.clone(),
            token_duration: state.token_duration,
            login_error_mode: state.login_error_mode,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The raw data entered by the user at log-in.
///
/// The email and password are plain strings. There is no need for strength
/// validation here since they are compared against the email and password in
/// the database, which have been verified.
#[derive(Clone, Deserialize)]
pub struct LogInData {
    /// Email entered during log-in.
    pub email: String,
    /// Password entered during log-in.
    pub password: String,
}

/// Handler for log-in requests via the POST method.
///
/// On success the response body is the signed token as a JSON string.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The email does not belong to a registered user.
/// - The password is not correct.
/// - An internal error occurred when verifying the password or signing the
///   token.
///
/// Which of the first two cases is reported depends on
/// [LoginState::login_error_mode]; both respond with 401.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn post_log_in(
    State(state): State<LoginState>,
    Json(user_data): Json<LogInData>,
) -> Result<Json<String>, Error> {
    let no_such_user = match state.login_error_mode {
        LoginErrorMode::Unified => Error::InvalidCredentials,
        LoginErrorMode::Split => Error::UnknownEmail,
    };

    // An unparseable email cannot belong to a registered user.
    let Ok(email) = EmailAddress::from_str(&user_data.email) else {
        return Err(no_such_user);
    };

    let user = {
        let connection = state
            .db_connection
            .lock()
            .expect("Could not acquire database lock");

        get_user_by_email(&email, &connection)
    };

    let user = match user {
        Ok(user) => user,
        Err(Error::NotFound) => return Err(no_such_user),
        Err(error) => return Err(error),
    };

    let is_password_valid = user
        .password_hash
        .verify(&user_data.password)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    if !is_password_valid {
        return Err(match state.login_error_mode {
            LoginErrorMode::Unified => Error::InvalidCredentials,
            LoginErrorMode::Split => Error::IncorrectPassword,
        });
    }

    let token = encode_token(user.id, state.token_duration, &state.encoding_key)?;

    Ok(Json(token))
}
