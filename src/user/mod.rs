//! Registered users of the application and the rules for registering and
//! authenticating them.

mod endpoints;
mod service;
mod sqlite;
mod store;

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::PasswordHash;

pub use endpoints::{authenticate_endpoint, get_balance_endpoint, register_user_endpoint};
pub use service::UserService;
pub use sqlite::{SQLiteUserStore, create_user_table};
pub use store::UserStore;

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
///
/// The password hash is never serialized, so a `User` can be sent to clients as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserId,
    /// The user's display name.
    pub name: String,
    /// The email the user logs in with. Unique across all users.
    pub email: String,
    /// The user's password hash.
    #[serde(skip_serializing)]
    pub password_hash: PasswordHash,
}

/// The details a client sends to register a new user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    /// The user's display name.
    pub name: String,
    /// The email the user will log in with.
    pub email: String,
    /// The raw password. It is hashed before it is stored.
    pub password: String,
}

/// A user that is ready to be inserted into a [UserStore].
#[derive(Debug, Clone, PartialEq)]
pub struct NewUserRecord {
    /// The user's display name.
    pub name: String,
    /// The email the user will log in with.
    pub email: String,
    /// The hash of the user's password.
    pub password_hash: PasswordHash,
}

impl NewUserRecord {
    /// Attach the store assigned `id`.
    pub fn finalise(self, id: UserId) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
        }
    }
}

/// Why an authentication attempt was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthenticationFailure {
    /// No user is registered with the email.
    #[error("user not found for the given email")]
    UserNotFound,
    /// The password did not match the registered user's password.
    #[error("invalid password")]
    InvalidPassword,
}
