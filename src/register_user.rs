//! The registration endpoint for creating new user accounts.
use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use email_address::EmailAddress;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    user::{UserID, create_user},
};

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The connection to the database holding the user table.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The credentials for registering a new user.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterUserData {
    /// The email address to register the user under.
    pub email: String,
    /// The user's plain-text password.
    pub password: String,
}

/// The body of a successful registration response.
///
/// The password hash is deliberately absent.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisteredUser {
    /// The ID of the newly created user.
    pub id: UserID,
    /// The email address the user registered with.
    pub email: String,
}

/// A route handler for registering a new user.
///
/// # Errors
///
/// This function will return an error in the response if:
/// - the email could not be parsed as an email address (422),
/// - the password is too weak (422),
/// - the email already belongs to a registered user (409).
pub async fn post_register_user(
    State(state): State<RegistrationState>,
    Json(user_data): Json<RegisterUserData>,
) -> Result<Response, Error> {
    let email = EmailAddress::from_str(&user_data.email)
        .map_err(|_| Error::InvalidEmail(user_data.email.clone()))?;
    let validated_password = ValidatedPassword::new(&user_data.password)?;
    let password_hash = PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST)?;

    let user = create_user(
        email,
        password_hash,
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    )?;

    Ok((
        StatusCode::CREATED,
        Json(RegisteredUser {
            id: user.id,
            email: user.email.to_string(),
        }),
    )
        .into_response())
}
