//! Bookkeeper is a personal bookkeeping service: a JSON API for tracking
//! financial accounts, expense records, and group expense splits.
//!
//! This library provides the REST API served by the `server` binary, plus the
//! demo fixture loader used by the `seed_demo` binary.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use time::Date;
use tokio::signal;

mod account;
mod app_state;
mod auth;
mod db;
mod endpoints;
mod group;
mod lexicon;
mod logging;
mod not_found;
mod note;
mod notification;
mod purge;
mod record;
mod register_user;
mod routing;
mod seed;
mod user;

pub use account::{Account, AccountDetails, BankDetails, CreditCardDetails};
pub use app_state::AppState;
pub use auth::{LoginErrorMode, PasswordHash, ValidatedPassword};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use seed::{DEMO_EMAIL, DEMO_PASSWORD, seed_demo_data};
pub use user::{User, UserID, get_user_by_id};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request had no credential attached, so no identity could be
    /// established.
    #[error("authentication is required")]
    Unauthorized,

    /// The bearer token failed verification: bad signature, expired, or a
    /// payload that does not carry a usable user ID.
    #[error("the access token is invalid")]
    InvalidToken,

    /// Signing a new token failed.
    ///
    /// This indicates a server misconfiguration and should never be shown to
    /// the client in detail.
    #[error("could not create an access token")]
    TokenCreation,

    /// The user provided an invalid combination of email and password.
    ///
    /// This is the unified login error; it deliberately does not reveal which
    /// part was wrong.
    #[error("incorrect email or password")]
    InvalidCredentials,

    /// No user exists with the given email address.
    ///
    /// Only reported when the login error mode is set to `split`.
    #[error("no account exists with that email address")]
    UnknownEmail,

    /// The password did not match the stored hash.
    ///
    /// Only reported when the login error mode is set to `split`.
    #[error("incorrect password")]
    IncorrectPassword,

    /// The string could not be parsed as an email address.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A date in the future was used to create an expense record.
    ///
    /// Records describe purchases that have already happened, therefore future
    /// dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// The email address used for registration already belongs to a user.
    #[error("a user with that email address already exists")]
    DuplicateEmail,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to delete an expense record that does not exist
    #[error("tried to delete a record that is not in the database")]
    DeleteMissingRecord,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Error::Unauthorized | Error::InvalidToken => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            Error::InvalidCredentials | Error::UnknownEmail | Error::IncorrectPassword => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            Error::InvalidEmail(_) | Error::TooWeak(_) | Error::FutureDate(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string())
            }
            Error::DuplicateEmail => (StatusCode::CONFLICT, self.to_string()),
            Error::NotFound | Error::DeleteMissingRecord => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            // Anything else is a server fault and is not shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        };

        let body = Json(json!({
            "message": message,
        }));

        (status, body).into_response()
    }
}
