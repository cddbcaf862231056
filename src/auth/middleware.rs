//! Authentication middleware that verifies bearer tokens on protected routes.

use axum::{
    RequestPartsExt,
    extract::{FromRef, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use jsonwebtoken::DecodingKey;

use crate::{AppState, Error, auth::token::decode_token};

/// The state needed for the auth middleware.
#[derive(Clone)]
pub struct AuthState {
    /// The key used to verify token signatures.
    pub decoding_key: DecodingKey,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            decoding_key: state.decoding_key.clone(),
        }
    }
}

/// Middleware function that checks for a valid bearer token in the
/// Authorization header.
///
/// A request without the header is rejected with 401 before any identity is
/// established; a request with an invalid or expired token is rejected with
/// 401 as well. Otherwise the ID of the user the token was issued to is
/// placed into the request and the request executed normally.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let bearer = match parts
        .extract::<TypedHeader<Authorization<Bearer>>>()
        .await
    {
        Ok(TypedHeader(Authorization(bearer))) => bearer,
        Err(rejection) if rejection.is_missing() => return Error::Unauthorized.into_response(),
        Err(_) => return Error::InvalidToken.into_response(),
    };

    let user_id = match decode_token(bearer.token(), &state.decoding_key) {
        Ok(user_id) => user_id,
        Err(error) => return error.into_response(),
    };

    parts.extensions.insert(user_id);
    let request = Request::from_parts(parts, body);

    next.run(request).await
}
