//! Test database setup
#![allow(dead_code)]

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Fresh in-memory SQLite database with the schema applied.
///
/// The pool holds a single connection; every SQLite connection opens its own
/// in-memory database, so a second one would see empty tables.
pub async fn setup_test_database() -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_owned());
    opt.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(opt).await?;
    flagpost::db::create_schema(&db).await?;
    Ok(db)
}
