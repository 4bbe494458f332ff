//! Driving port for account use-cases: registration, login and profiles.
//!
//! Inbound adapters call this port without knowing how credentials are
//! hashed or where accounts live, so handler tests can substitute a mock.

use async_trait::async_trait;

use crate::domain::{
    Error, LoginCredentials, ProfileUpdate, Registration, User, UserId, UserProfile,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Create an account; `conflict` when the email is taken.
    async fn register(&self, registration: &Registration) -> Result<User, Error>;

    /// Validate credentials; `unauthorized` for unknown email or bad password.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<User, Error>;

    /// Look up the account behind a session.
    async fn find_user(&self, id: &UserId) -> Result<Option<User>, Error>;

    /// Apply a profile update to the caller's account.
    async fn update_profile(&self, id: &UserId, update: ProfileUpdate) -> Result<User, Error>;

    /// Public profile with counters and the viewer's follow state.
    async fn profile(&self, id: &UserId, viewer: Option<UserId>) -> Result<UserProfile, Error>;
}
