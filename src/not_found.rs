//! The fallback route handler.

use axum::response::{IntoResponse, Response};

use crate::Error;

/// A route handler that responds with 404 and the API's JSON error shape.
///
/// Used as the router fallback for paths no route matches.
pub async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}
