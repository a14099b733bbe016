//! Defines the user store trait.

use crate::{
    Error,
    user::{NewUserRecord, User, UserId},
};

/// Handles the creation and retrieval of [User] objects.
pub trait UserStore {
    /// Insert a new user and return it with its store assigned ID.
    ///
    /// Implementers must return [Error::DuplicateEmail] if the email is already in use.
    fn create(&mut self, user: NewUserRecord) -> Result<User, Error>;

    /// Get a user by their ID, or `None` if no such user exists.
    fn get(&self, id: UserId) -> Result<Option<User>, Error>;

    /// Get a user by their email, or `None` if no such user exists.
    fn get_by_email(&self, email: &str) -> Result<Option<User>, Error>;

    /// Whether a user is registered with `email`.
    fn exists_by_email(&self, email: &str) -> Result<bool, Error>;
}
