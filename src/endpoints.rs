//! The API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/records/{record_id}', use
//! [format_endpoint].

/// The route for registering a new user.
pub const USERS: &str = "/api/users";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/log_in";
/// The route to list and upsert the caller's accounts.
pub const ACCOUNTS: &str = "/api/accounts";
/// The route to list and create the caller's expense records.
pub const RECORDS: &str = "/api/records";
/// The route to delete a single expense record.
pub const RECORD: &str = "/api/records/{record_id}";
/// The route to list and create the caller's groups.
pub const GROUPS: &str = "/api/groups";
/// The route that purges all data owned by the caller.
pub const ME: &str = "/api/me";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/records/{record_id}',
/// '{record_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
