//! SeaORM entities for the three persisted tables.

pub mod assignments;
pub mod feature_flags;
pub mod people;
