//! User identity and profile model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length for a display name.
pub const DISPLAY_NAME_MAX: usize = 50;
/// Maximum length for a profile bio.
pub const BIO_MAX: usize = 500;
/// Maximum length for an avatar URL.
pub const AVATAR_URL_MAX: usize = 2048;
/// Maximum length for an email address.
pub const EMAIL_MAX: usize = 254;

/// Validation errors returned by user value constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("user id must not be empty")]
    EmptyId,
    #[error("user id must be a valid UUID")]
    InvalidId,
    #[error("email must not be empty")]
    EmptyEmail,
    #[error("email must be a valid address")]
    InvalidEmail,
    #[error("email must be at most {max} characters")]
    EmailTooLong { max: usize },
    #[error("name must not be empty")]
    EmptyDisplayName,
    #[error("name must be at most {max} characters")]
    DisplayNameTooLong { max: usize },
    #[error("bio must be at most {max} characters")]
    BioTooLong { max: usize },
    #[error("avatar must be an http(s) URL of at most {max} characters")]
    InvalidAvatar { max: usize },
}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid, String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Wrap an already-parsed UUID (for example a database column).
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, uuid.to_string())
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }

        let parsed = Uuid::parse_str(&id).map_err(|_| UserValidationError::InvalidId)?;
        Ok(Self(parsed, id))
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        let UserId(_, raw) = value;
        raw
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Normalised (trimmed, lower-cased) email address.
///
/// # Examples
/// ```
/// use codetok::domain::Email;
///
/// let email = Email::new("  Ada@Example.COM ").unwrap();
/// assert_eq!(email.as_ref(), "ada@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and normalise an email address.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalised = raw.as_ref().trim().to_lowercase();
        if normalised.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if normalised.chars().count() > EMAIL_MAX {
            return Err(UserValidationError::EmailTooLong { max: EMAIL_MAX });
        }
        let Some((local, domain)) = normalised.split_once('@') else {
            return Err(UserValidationError::InvalidEmail);
        };
        let domain_ok = !domain.is_empty()
            && !domain.contains('@')
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.');
        if local.is_empty() || !domain_ok || normalised.chars().any(char::is_whitespace) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Human readable display name for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and construct a [`DisplayName`]; surrounding whitespace is trimmed.
    pub fn new(display_name: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = display_name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyDisplayName);
        }
        if trimmed.chars().count() > DISPLAY_NAME_MAX {
            return Err(UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Validate an optional bio, normalising blank input to `None`.
pub fn validate_bio(raw: Option<&str>) -> Result<Option<String>, UserValidationError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(bio) if bio.chars().count() > BIO_MAX => {
            Err(UserValidationError::BioTooLong { max: BIO_MAX })
        }
        Some(bio) => Ok(Some(bio.to_owned())),
    }
}

/// Validate an optional avatar URL, normalising blank input to `None`.
pub fn validate_avatar(raw: Option<&str>) -> Result<Option<String>, UserValidationError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(url) if super::is_http_url(url) && url.len() <= AVATAR_URL_MAX => {
            Ok(Some(url.to_owned()))
        }
        Some(_) => Err(UserValidationError::InvalidAvatar {
            max: AVATAR_URL_MAX,
        }),
    }
}

/// Application user as exposed to other users.
///
/// ## Invariants
/// - `email` is normalised; it is only serialised for the account owner by
///   the HTTP adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: DisplayName,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stored account record: the public user plus the credential hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub user: User,
    pub password_hash: String,
}

/// Data required to persist a newly registered account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserAccount {
    pub id: UserId,
    pub email: Email,
    pub name: DisplayName,
    pub password_hash: String,
}

/// Partial profile update; `None` leaves a field unchanged.
///
/// `avatar` and `bio` use a nested option so callers can clear them:
/// `Some(None)` clears, `Some(Some(v))` sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<DisplayName>,
    pub avatar: Option<Option<String>>,
    pub bio: Option<Option<String>>,
}

impl ProfileUpdate {
    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.avatar.is_none() && self.bio.is_none()
    }
}

/// Public profile with social counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user: User,
    pub followers: i64,
    pub following: i64,
    pub projects: i64,
    pub is_following: bool,
}
