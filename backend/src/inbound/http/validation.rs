//! Request validation helpers shared by the handlers.
//!
//! Validation failures become `invalid_request` errors whose `details`
//! carry the offending `field` (camelCase, as sent by clients) and a stable
//! `code`.

use serde::{Deserialize, Deserializer};
use serde_json::json;

use crate::domain::{
    CommentId, Error, GenerationValidationError, LoginValidationError, ProjectId, ProjectType,
    SocialValidationError, UserId, UserValidationError,
};

/// Field names as they appear in request payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub(crate) fn as_str(self) -> &'static str {
        self.0
    }
}

pub(crate) fn field_error(field: FieldName, code: &str, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code,
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    field_error(
        field,
        "missing_field",
        format!("missing required field: {}", field.as_str()),
    )
}

fn invalid_id_error(field: FieldName, value: &str) -> Error {
    Error::invalid_request(format!("{} must be a valid UUID", field.as_str())).with_details(
        json!({
            "field": field.as_str(),
            "value": value,
            "code": "invalid_uuid",
        }),
    )
}

pub(crate) fn parse_project_id(raw: &str) -> Result<ProjectId, Error> {
    ProjectId::new(raw).map_err(|_| invalid_id_error(FieldName::new("projectId"), raw))
}

pub(crate) fn parse_user_id(raw: &str) -> Result<UserId, Error> {
    UserId::new(raw).map_err(|_| invalid_id_error(FieldName::new("userId"), raw))
}

pub(crate) fn parse_comment_id(raw: &str) -> Result<CommentId, Error> {
    CommentId::new(raw).map_err(|_| invalid_id_error(FieldName::new("commentId"), raw))
}

/// Map user value errors onto the request field they came from.
pub(crate) fn user_validation_error(err: UserValidationError) -> Error {
    let (field, code) = match err {
        UserValidationError::EmptyId | UserValidationError::InvalidId => ("userId", "invalid_uuid"),
        UserValidationError::EmptyEmail => ("email", "empty_email"),
        UserValidationError::InvalidEmail | UserValidationError::EmailTooLong { .. } => {
            ("email", "invalid_email")
        }
        UserValidationError::EmptyDisplayName => ("name", "empty_name"),
        UserValidationError::DisplayNameTooLong { .. } => ("name", "name_too_long"),
        UserValidationError::BioTooLong { .. } => ("bio", "bio_too_long"),
        UserValidationError::InvalidAvatar { .. } => ("avatar", "invalid_avatar"),
    };
    field_error(FieldName::new(field), code, err.to_string())
}

pub(crate) fn login_validation_error(err: LoginValidationError) -> Error {
    match err {
        LoginValidationError::EmptyEmail => {
            field_error(FieldName::new("email"), "empty_email", err.to_string())
        }
        LoginValidationError::EmptyPassword => {
            field_error(FieldName::new("password"), "empty_password", err.to_string())
        }
        LoginValidationError::PasswordLength { .. } => field_error(
            FieldName::new("password"),
            "invalid_password_length",
            err.to_string(),
        ),
        LoginValidationError::User(inner) => user_validation_error(inner),
    }
}

pub(crate) fn social_validation_error(err: SocialValidationError) -> Error {
    let (field, code) = match err {
        SocialValidationError::EmptyComment => ("content", "empty_comment"),
        SocialValidationError::CommentTooLong { .. } => ("content", "comment_too_long"),
        SocialValidationError::UnknownPlatform { .. } => ("platform", "unknown_platform"),
        SocialValidationError::InvalidCommentId => ("parentId", "invalid_uuid"),
    };
    field_error(FieldName::new(field), code, err.to_string())
}

/// Parse an optional `type` filter or field.
pub(crate) fn parse_project_type(raw: Option<&str>) -> Result<Option<ProjectType>, Error> {
    match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<ProjectType>()
            .map(Some)
            .map_err(|err| field_error(FieldName::new("type"), "unknown_type", err.to_string())),
    }
}

pub(crate) fn generation_validation_error(err: GenerationValidationError) -> Error {
    let (field, code) = match err {
        GenerationValidationError::EmptyPrompt => ("prompt", "empty_prompt"),
        GenerationValidationError::PromptTooLong { .. } => ("prompt", "prompt_too_long"),
        GenerationValidationError::UnknownTemplate { .. } => ("templateId", "unknown_template"),
    };
    field_error(FieldName::new(field), code, err.to_string())
}

/// Deserialise a nullable PATCH field: absent → `None`, `null` →
/// `Some(None)`, value → `Some(Some(value))`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
