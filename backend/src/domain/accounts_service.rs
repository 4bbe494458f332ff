//! Account domain service: registration, credential checks and profiles.
//!
//! Passwords are hashed with bcrypt on the blocking thread pool. Unknown
//! emails and wrong passwords are distinguished internally but share one
//! `unauthorized` response so callers cannot probe for accounts.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::domain::ports::{AccountService, ProjectRepository, SocialRepository, UserRepository};
use crate::domain::service_errors::{map_project_error, map_social_error, map_user_error};
use crate::domain::{
    Error, LoginCredentials, NewUserAccount, ProfileUpdate, Registration, User, UserId,
    UserProfile,
};

const INVALID_CREDENTIALS: &str = "invalid email or password";

/// Why a login attempt was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CredentialError {
    UnknownEmail,
    BadPassword,
}

/// Account service implementing [`AccountService`].
#[derive(Clone)]
pub struct AccountsService<U, P, S> {
    users: Arc<U>,
    projects: Arc<P>,
    social: Arc<S>,
    hash_cost: u32,
}

impl<U, P, S> AccountsService<U, P, S> {
    /// Create a service using bcrypt's default cost.
    pub fn new(users: Arc<U>, projects: Arc<P>, social: Arc<S>) -> Self {
        Self {
            users,
            projects,
            social,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Override the bcrypt cost (tests use the minimum).
    #[must_use]
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }
}

async fn hash_password(password: &str, cost: u32) -> Result<String, Error> {
    let password = Zeroizing::new(password.to_owned());
    tokio::task::spawn_blocking(move || bcrypt::hash(password.as_str(), cost))
        .await
        .map_err(|err| Error::internal(format!("password hashing task failed: {err}")))?
        .map_err(|err| Error::internal(format!("password hashing failed: {err}")))
}

async fn verify_password(password: &str, hash: String) -> Result<bool, Error> {
    let password = Zeroizing::new(password.to_owned());
    tokio::task::spawn_blocking(move || bcrypt::verify(password.as_str(), &hash))
        .await
        .map_err(|err| Error::internal(format!("password verification task failed: {err}")))?
        .map_err(|err| Error::internal(format!("stored password hash is invalid: {err}")))
}

impl<U, P, S> AccountsService<U, P, S>
where
    U: UserRepository,
    P: ProjectRepository,
    S: SocialRepository,
{
    async fn check_credentials(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<Result<User, CredentialError>, Error> {
        let Some(account) = self
            .users
            .find_account_by_email(credentials.email())
            .await
            .map_err(map_user_error)?
        else {
            return Ok(Err(CredentialError::UnknownEmail));
        };
        if verify_password(credentials.password(), account.password_hash).await? {
            Ok(Ok(account.user))
        } else {
            Ok(Err(CredentialError::BadPassword))
        }
    }
}

#[async_trait]
impl<U, P, S> AccountService for AccountsService<U, P, S>
where
    U: UserRepository,
    P: ProjectRepository,
    S: SocialRepository,
{
    async fn register(&self, registration: &Registration) -> Result<User, Error> {
        let password_hash = hash_password(registration.password(), self.hash_cost).await?;
        let account = NewUserAccount {
            id: UserId::random(),
            email: registration.email().clone(),
            name: registration.name().clone(),
            password_hash,
        };
        let user = self.users.create(&account).await.map_err(map_user_error)?;
        info!(user_id = %user.id, "account registered");
        Ok(user)
    }

    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<User, Error> {
        match self.check_credentials(credentials).await? {
            Ok(user) => Ok(user),
            Err(reason) => {
                debug!(?reason, "login rejected");
                Err(Error::unauthorized(INVALID_CREDENTIALS))
            }
        }
    }

    async fn find_user(&self, id: &UserId) -> Result<Option<User>, Error> {
        self.users.find_by_id(id).await.map_err(map_user_error)
    }

    async fn update_profile(&self, id: &UserId, update: ProfileUpdate) -> Result<User, Error> {
        if update.is_empty() {
            return self
                .find_user(id)
                .await?
                .ok_or_else(|| Error::not_found("user not found"));
        }
        self.users
            .update_profile(id, &update)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found("user not found"))
    }

    async fn profile(&self, id: &UserId, viewer: Option<UserId>) -> Result<UserProfile, Error> {
        let user = self
            .find_user(id)
            .await?
            .ok_or_else(|| Error::not_found("user not found"))?;
        let counts = self.social.follow_counts(id).await.map_err(map_social_error)?;
        let projects = self
            .projects
            .count_by_author(id)
            .await
            .map_err(map_project_error)?;
        let is_following = match viewer {
            Some(viewer) if &viewer != id => self
                .social
                .is_following(&viewer, id)
                .await
                .map_err(map_social_error)?,
            _ => false,
        };
        Ok(UserProfile {
            user,
            followers: counts.followers,
            following: counts.following,
            projects,
            is_following,
        })
    }
}

#[cfg(test)]
#[path = "accounts_service_tests.rs"]
mod tests;
