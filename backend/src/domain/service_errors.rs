//! Mapping from driven-port errors to domain errors.
//!
//! Connection failures surface as `service_unavailable`, query failures as
//! `internal_error`. Both are logged here so services only propagate.

use tracing::{error, warn};

use super::Error;
use super::ports::{
    BlobStoreError, ProjectPersistenceError, SocialPersistenceError, UserPersistenceError,
};

pub(crate) fn map_user_error(err: UserPersistenceError) -> Error {
    match err {
        UserPersistenceError::Connection { message } => {
            warn!(%message, "user repository unavailable");
            Error::service_unavailable("user repository unavailable")
        }
        UserPersistenceError::Query { message } => {
            error!(%message, "user repository query failed");
            Error::internal(format!("user repository error: {message}"))
        }
        UserPersistenceError::DuplicateEmail => {
            Error::conflict("an account with this email already exists")
        }
    }
}

pub(crate) fn map_project_error(err: ProjectPersistenceError) -> Error {
    match err {
        ProjectPersistenceError::Connection { message } => {
            warn!(%message, "project repository unavailable");
            Error::service_unavailable("project repository unavailable")
        }
        ProjectPersistenceError::Query { message } => {
            error!(%message, "project repository query failed");
            Error::internal(format!("project repository error: {message}"))
        }
    }
}

pub(crate) fn map_social_error(err: SocialPersistenceError) -> Error {
    match err {
        SocialPersistenceError::Connection { message } => {
            warn!(%message, "social repository unavailable");
            Error::service_unavailable("social repository unavailable")
        }
        SocialPersistenceError::Query { message } => {
            error!(%message, "social repository query failed");
            Error::internal(format!("social repository error: {message}"))
        }
    }
}

pub(crate) fn map_blob_error(err: BlobStoreError) -> Error {
    match err {
        BlobStoreError::Io { message } => {
            error!(%message, "blob store failed");
            Error::internal(format!("file store error: {message}"))
        }
        BlobStoreError::NotAFile { path } => {
            Error::invalid_request(format!("'{path}' is not a file"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case(UserPersistenceError::connection("refused"), ErrorCode::ServiceUnavailable)]
    #[case(UserPersistenceError::query("syntax"), ErrorCode::InternalError)]
    #[case(UserPersistenceError::duplicate_email(), ErrorCode::Conflict)]
    fn user_errors_map_to_codes(#[case] err: UserPersistenceError, #[case] expected: ErrorCode) {
        assert_eq!(map_user_error(err).code(), expected);
    }

    #[rstest]
    #[case(ProjectPersistenceError::connection("refused"), ErrorCode::ServiceUnavailable)]
    #[case(ProjectPersistenceError::query("boom"), ErrorCode::InternalError)]
    fn project_errors_map_to_codes(
        #[case] err: ProjectPersistenceError,
        #[case] expected: ErrorCode,
    ) {
        assert_eq!(map_project_error(err).code(), expected);
    }

    #[rstest]
    fn blob_directory_errors_are_client_errors() {
        let err = map_blob_error(BlobStoreError::not_a_file("users/x"));
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }
}
