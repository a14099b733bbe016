//! Implements a SQLite backed user store.
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, OptionalExtension, Row};

use crate::{
    Error, PasswordHash,
    user::{NewUserRecord, User, UserId, UserStore},
};

/// Handles the creation and retrieval of User objects.
#[derive(Debug, Clone)]
pub struct SQLiteUserStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteUserStore {
    /// Create a new user store.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl UserStore for SQLiteUserStore {
    /// Create and insert a new user into the database.
    ///
    /// # Errors
    ///
    /// Returns a:
    /// - [Error::DuplicateEmail] if the email is already in use,
    /// - [Error::DatabaseLockError] if the database lock is poisoned,
    /// - or [Error::SqlError] if some other SQL error occurred.
    fn create(&mut self, user: NewUserRecord) -> Result<User, Error> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        connection.execute(
            "INSERT INTO user (name, email, password) VALUES (?1, ?2, ?3)",
            (&user.name, &user.email, user.password_hash.as_ref()),
        )?;

        let id = UserId::new(connection.last_insert_rowid());

        Ok(user.finalise(id))
    }

    /// Get the user from the database that has the specified `id`.
    ///
    /// # Errors
    ///
    /// Returns a [Error::DatabaseLockError] if the database lock is poisoned
    /// or [Error::SqlError] if there are SQL related errors.
    fn get(&self, id: UserId) -> Result<Option<User>, Error> {
        self.connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?
            .prepare("SELECT id, name, email, password FROM user WHERE id = :id")?
            .query_row(&[(":id", &id.as_i64())], map_row)
            .optional()
            .map_err(|error| error.into())
    }

    /// Get the user from the database that has the specified `email` address.
    ///
    /// # Errors
    ///
    /// Returns a [Error::DatabaseLockError] if the database lock is poisoned
    /// or [Error::SqlError] if there are SQL related errors.
    fn get_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        self.connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?
            .prepare("SELECT id, name, email, password FROM user WHERE email = :email")?
            .query_row(&[(":email", email)], map_row)
            .optional()
            .map_err(|error| error.into())
    }

    /// Check whether any user in the database has the `email` address.
    ///
    /// # Errors
    ///
    /// Returns a [Error::DatabaseLockError] if the database lock is poisoned
    /// or [Error::SqlError] if there are SQL related errors.
    fn exists_by_email(&self, email: &str) -> Result<bool, Error> {
        self.connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM user WHERE email = ?1)",
                [email],
                |row| row.get(0),
            )
            .map_err(|error| error.into())
    }
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let name = row.get(1)?;
    let email = row.get(2)?;
    let raw_password_hash: String = row.get(3)?;

    Ok(User {
        id: UserId::new(raw_id),
        name,
        email,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}
