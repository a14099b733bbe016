//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    EntryStore, Error, LedgerService, SQLiteEntryStore, SQLiteUserStore, UserService, UserStore,
    db::initialize,
};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState<E, U>
where
    E: EntryStore + Send + Sync,
    U: UserStore + Send + Sync,
{
    /// The service for managing [ledger entries](crate::LedgerEntry).
    pub ledger_service: LedgerService<E>,
    /// The service for registering and authenticating [users](crate::User).
    pub user_service: UserService<U>,
}

impl<E, U> AppState<E, U>
where
    E: EntryStore + Send + Sync,
    U: UserStore + Send + Sync,
{
    /// Create a new [AppState].
    ///
    /// `password_cost` is the bcrypt cost used when hashing new passwords.
    pub fn new(entry_store: E, user_store: U, password_cost: u32) -> Self {
        Self {
            ledger_service: LedgerService::new(entry_store),
            user_service: UserService::new(user_store, password_cost),
        }
    }
}

/// An alias for an [AppState] that uses SQLite for the backend.
pub type SQLiteAppState = AppState<SQLiteEntryStore, SQLiteUserStore>;

/// Creates an [AppState] instance that uses SQLite for the backend.
///
/// This function will modify the database by adding the tables for the domain
/// models to the database.
///
/// # Errors
/// Returns an error if the database cannot be initialized.
pub fn create_app_state(
    db_connection: Connection,
    password_cost: u32,
) -> Result<SQLiteAppState, Error> {
    initialize(&db_connection)?;

    let connection = Arc::new(Mutex::new(db_connection));

    Ok(AppState::new(
        SQLiteEntryStore::new(connection.clone()),
        SQLiteUserStore::new(connection),
        password_cost,
    ))
}
