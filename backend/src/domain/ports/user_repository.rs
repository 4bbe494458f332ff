//! Port abstraction for user account persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{NewUserAccount, ProfileUpdate, User, UserAccount, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// An account with the same email already exists.
        DuplicateEmail => "an account with this email already exists",
    }
}

/// Storage for user accounts and profile counters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account; fails with `DuplicateEmail` when taken.
    async fn create(&self, account: &NewUserAccount) -> Result<User, UserPersistenceError>;

    /// Fetch an account (including its password hash) by normalised email.
    async fn find_account_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserAccount>, UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Apply a partial profile update, returning the updated user.
    async fn update_profile(
        &self,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, UserPersistenceError>;
}
