//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/entries/{entry_id}', use [format_endpoint].

/// The route to register users.
pub const USERS: &str = "/api/users";
/// The route for checking a user's email and password.
pub const AUTHENTICATE: &str = "/api/users/authenticate";
/// The route for getting a user's balance.
pub const USER_BALANCE: &str = "/api/users/{user_id}/balance";
/// The route to create and search ledger entries.
pub const ENTRIES: &str = "/api/entries";
/// The route to get, update or delete a single ledger entry.
pub const ENTRY: &str = "/api/entries/{entry_id}";
/// The route to change the status of a ledger entry.
pub const ENTRY_STATUS: &str = "/api/entries/{entry_id}/status";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// Only the first parameter, a segment of the form `{name}`, is replaced.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    match (endpoint_path.find('{'), endpoint_path.find('}')) {
        (Some(start), Some(end)) if start < end => format!(
            "{}{}{}",
            &endpoint_path[..start],
            id,
            &endpoint_path[end + 1..]
        ),
        _ => endpoint_path.to_owned(),
    }
}
