//! A backend for tracking personal finances.
//!
//! Users register and authenticate with an email and password, record ledger
//! entries (income and expenses for a given month), move entries between
//! statuses and query their balance. The library exposes the services that
//! own those rules and a JSON REST API built on top of them.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod db;
pub mod endpoints;
mod entry;
mod logging;
mod password;
mod routing;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::{AppState, SQLiteAppState, create_app_state};
pub use db::initialize as initialize_db;
pub use entry::{
    EntryId, EntryStatus, EntryStore, EntryType, EntryViolation, LedgerEntry, LedgerService,
    SQLiteEntryStore,
};
pub use logging::{LOG_BODY_LENGTH_LIMIT, REQUEST_BODY_LIMIT, logging_middleware};
pub use password::PasswordHash;
pub use routing::build_router;
pub use user::{
    AuthenticationFailure, NewUser, NewUserRecord, SQLiteUserStore, User, UserId, UserService,
    UserStore,
};

/// How long in-flight requests get to finish once shutdown starts.
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(1);

/// Wait for a shutdown signal, then tell the server behind `handle` to stop
/// accepting connections and finish its in-flight requests.
///
/// Ctrl+C is always handled. SIGTERM is also handled on Unix.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let signal_name = wait_for_shutdown_signal().await;

    tracing::info!("Received {signal_name}, shutting down the ledger server.");
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE_PERIOD));
}

async fn wait_for_ctrl_c() -> &'static str {
    if let Err(error) = signal::ctrl_c().await {
        tracing::error!("Could not listen for Ctrl+C: {error}");
        std::future::pending::<()>().await;
    }

    "Ctrl+C"
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(terminate) => terminate,
        Err(error) => {
            tracing::warn!("Could not listen for SIGTERM: {error}");
            return wait_for_ctrl_c().await;
        }
    };

    tokio::select! {
        signal_name = wait_for_ctrl_c() => signal_name,
        _ = terminate.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> &'static str {
    wait_for_ctrl_c().await
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A ledger entry broke one of the entry validation rules.
    ///
    /// The client should correct the field named by the violation and try again.
    #[error("{0}")]
    InvalidEntry(EntryViolation),

    /// The email and password could not be matched to a registered user.
    #[error("{0}")]
    Authentication(AuthenticationFailure),

    /// A user with the email address is already registered.
    #[error("a user with this email is already registered")]
    DuplicateEmail,

    /// Tried to update or delete a ledger entry that has no ID, i.e., one
    /// that was never saved.
    #[error("the ledger entry has not been saved yet")]
    UnsavedEntry,

    /// The user ID given for an entry or query does not belong to a
    /// registered user.
    #[error("user not found for the ID {0}")]
    UnknownUser(UserId),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a ledger entry that does not exist
    #[error("tried to update a ledger entry that is not in the database")]
    UpdateMissingEntry,

    /// Tried to delete a ledger entry that does not exist
    #[error("tried to delete a ledger entry that is not in the database")]
    DeleteMissingEntry,

    /// A user's entries add up to more than a [rust_decimal::Decimal] can hold.
    #[error("the total of the ledger entries is too large to calculate")]
    BalanceOverflow,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
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
        let status = match &self {
            Error::InvalidEntry(_)
            | Error::Authentication(_)
            | Error::DuplicateEmail
            | Error::UnsavedEntry
            | Error::UnknownUser(_) => StatusCode::BAD_REQUEST,
            Error::NotFound | Error::UpdateMissingEntry | Error::DeleteMissingEntry => {
                StatusCode::NOT_FOUND
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);

                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "An unexpected error occurred, check the server logs for more details."
                    })),
                )
                    .into_response();
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
