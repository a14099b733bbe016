//! The rules for registering and authenticating users.

use crate::{
    Error, PasswordHash,
    user::{AuthenticationFailure, NewUser, NewUserRecord, User, UserId, UserStore},
};

/// Mediates registration and authentication against a [UserStore].
#[derive(Debug, Clone)]
pub struct UserService<U>
where
    U: UserStore,
{
    store: U,
    password_cost: u32,
}

impl<U> UserService<U>
where
    U: UserStore,
{
    /// Create a user service that hashes passwords with the bcrypt `password_cost`.
    ///
    /// Use [PasswordHash::DEFAULT_COST] outside of tests.
    pub fn new(store: U, password_cost: u32) -> Self {
        Self {
            store,
            password_cost,
        }
    }

    /// Check `password` against the user registered with `email`.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Authentication] with:
    /// - [AuthenticationFailure::UserNotFound] if no user has the email,
    /// - [AuthenticationFailure::InvalidPassword] if the password is wrong.
    ///
    /// Store and hashing errors are passed through.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<User, Error> {
        let user = self
            .store
            .get_by_email(email)?
            .ok_or(Error::Authentication(AuthenticationFailure::UserNotFound))?;

        let is_password_valid = user
            .password_hash
            .verify(password)
            .map_err(|error| Error::HashingError(error.to_string()))?;

        if !is_password_valid {
            return Err(Error::Authentication(
                AuthenticationFailure::InvalidPassword,
            ));
        }

        Ok(user)
    }

    /// Check that no user is registered with `email` yet.
    ///
    /// # Errors
    ///
    /// Returns [Error::DuplicateEmail] if the email is taken.
    pub fn validate_email(&self, email: &str) -> Result<(), Error> {
        if self.store.exists_by_email(email)? {
            return Err(Error::DuplicateEmail);
        }

        Ok(())
    }

    /// Register `new_user` and return the stored user.
    ///
    /// The email is checked before anything is written. The store's unique
    /// email constraint still applies if another registration for the same
    /// email wins the race after the check.
    ///
    /// # Errors
    ///
    /// Returns [Error::DuplicateEmail] if the email is taken, or an
    /// [Error::HashingError] if the password could not be hashed.
    pub fn register(&mut self, new_user: NewUser) -> Result<User, Error> {
        self.validate_email(&new_user.email)?;

        let password_hash = PasswordHash::from_raw_password(&new_user.password, self.password_cost)?;

        let user = self.store.create(NewUserRecord {
            name: new_user.name,
            email: new_user.email,
            password_hash,
        })?;

        tracing::info!("Registered user {}", user.id);

        Ok(user)
    }

    /// Find the user with `id`.
    pub fn find_by_id(&self, id: UserId) -> Result<Option<User>, Error> {
        self.store.get(id)
    }
}
