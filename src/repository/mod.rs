//! Data access: turns filter and pagination objects into sea-orm queries
//! and returns rows plus the total count before pagination.
//!
//! Repositories borrow the pool; build one per request.

pub mod assignment;
pub mod feature_flag;
pub mod person;

pub use assignment::AssignmentRepository;
pub use feature_flag::FeatureFlagRepository;
pub use person::PersonRepository;
