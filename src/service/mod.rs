//! Business rules over the repositories. Services borrow the connection for
//! the length of one request and map rows into response DTOs.

pub mod assignment;
pub mod feature_flag;
pub mod person;

pub use assignment::AssignmentService;
pub use feature_flag::FeatureFlagService;
pub use person::PersonService;

/// Timestamp format used in every response DTO.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
