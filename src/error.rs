//! Errors returned by the repositories and services.
//!
//! Business-rule failures are built where they are detected and travel up
//! unchanged. Storage failures are logged and replaced with a generic message
//! so driver details never reach API consumers.

use crate::validation::FieldError;
use sea_orm::DbErr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Payload failed a validation rule.
    Validation(FieldError),
    /// A feature flag with this name exists.
    AlreadyExists(String),
    /// The named record does not exist.
    NotFound(&'static str),
    /// The update matched no row.
    NoRowsUpdated(i32),
    AlreadyAssigned { person_id: i32, feature_flag_id: i32 },
    NotAssigned { person_id: i32, feature_flag_id: i32 },
    /// Unexpected storage failure; the original error was logged.
    Internal(String),
}

impl ServiceError {
    /// Logs `err` and hides it behind `message`.
    pub fn storage(message: &str, err: DbErr) -> Self {
        log::error!("{}: {}", message, err);
        ServiceError::Internal(message.to_string())
    }

    pub fn field_error(&self) -> Option<&FieldError> {
        match self {
            ServiceError::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::Validation(e) => write!(f, "{}", e),
            ServiceError::AlreadyExists(name) => {
                write!(f, "feature flag {} already exists", name)
            }
            ServiceError::NotFound(what) => write!(f, "{} not found", what),
            ServiceError::NoRowsUpdated(id) => {
                write!(f, "no rows were updated for feature flag {}", id)
            }
            ServiceError::AlreadyAssigned {
                person_id,
                feature_flag_id,
            } => write!(
                f,
                "Person {} is already assigned to the feature flag {}",
                person_id, feature_flag_id
            ),
            ServiceError::NotAssigned {
                person_id,
                feature_flag_id,
            } => write!(
                f,
                "Person {} is not assigned to the feature flag {}",
                person_id, feature_flag_id
            ),
            ServiceError::Internal(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<FieldError> for ServiceError {
    fn from(e: FieldError) -> Self {
        ServiceError::Validation(e)
    }
}
