//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use jsonwebtoken::{DecodingKey, EncodingKey};
use rusqlite::Connection;
use time::Duration;

use crate::{
    Error,
    auth::{DEFAULT_TOKEN_DURATION, LoginErrorMode},
    db::initialize,
};

/// The state of the REST server.
///
/// Route handlers extract the slice of this state they need through their
/// own `FromRef` substates.
#[derive(Clone)]
pub struct AppState {
    /// The key used to sign new access tokens.
    pub encoding_key: EncodingKey,

    /// The key used to verify access tokens on protected routes.
    pub decoding_key: DecodingKey,

    /// How long a newly issued access token stays valid.
    pub token_duration: Duration,

    /// How precisely log-in failures are reported.
    pub login_error_mode: LoginErrorMode,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// Both the token signing and verification keys are derived from `jwt_secret`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        jwt_secret: &str,
        login_error_mode: LoginErrorMode,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_ref()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_ref()),
            token_duration: DEFAULT_TOKEN_DURATION,
            login_error_mode,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}
