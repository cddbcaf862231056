//! User authentication: passwords, bearer tokens, and the route guard.

mod log_in;
mod middleware;
mod password;
mod token;

pub use log_in::{LogInData, LoginErrorMode, LoginState, post_log_in};
pub use middleware::{AuthState, auth_guard};
pub use password::{PasswordHash, ValidatedPassword};
pub use token::{Claims, DEFAULT_TOKEN_DURATION, TokenSubject, decode_token, encode_token};
