//! Database connection and schema bootstrap.

use crate::orm::{assignments, feature_flags, people};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr, EntityTrait,
    Schema, Statement,
};

const ASSIGNMENT_PAIR_INDEX: &str = "idx_assignments_person_feature_flag";

/// Driver messages that mean a unique index rejected the write.
/// Postgres, SQLite and MySQL respectively.
const UNIQUE_VIOLATION_MARKERS: [&str; 3] = [
    "duplicate key value violates unique constraint",
    "UNIQUE constraint failed",
    "Duplicate entry",
];

/// Opens a connection pool for any of the supported backends.
pub async fn connect(
    url: &str,
    max_connections: u32,
    sqlx_logging: bool,
) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(url.to_owned());
    opt.max_connections(max_connections)
        .sqlx_logging(sqlx_logging);

    let db = Database::connect(opt).await?;
    log::info!("Connected to {:?} database", db.get_database_backend());
    Ok(db)
}

/// Creates the people, feature_flags and assignments tables if they are
/// missing, plus the unique index over assignment pairs.
pub async fn create_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    // Order follows the foreign keys.
    create_table(db, &schema, people::Entity).await?;
    create_table(db, &schema, feature_flags::Entity).await?;
    create_table(db, &schema, assignments::Entity).await?;
    create_assignment_index(db).await?;

    log::info!("Database schema is up to date");
    Ok(())
}

async fn create_table<E: EntityTrait>(
    db: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}

async fn create_assignment_index(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    // MySQL has no IF NOT EXISTS for indexes.
    let guard = match backend {
        DbBackend::MySql => "",
        DbBackend::Postgres | DbBackend::Sqlite => "IF NOT EXISTS ",
    };
    let sql = format!(
        "CREATE UNIQUE INDEX {}{} ON assignments (person_id, feature_flag_id)",
        guard, ASSIGNMENT_PAIR_INDEX
    );

    match db.execute(Statement::from_string(backend, sql)).await {
        Ok(_) => Ok(()),
        Err(e) if backend == DbBackend::MySql && e.to_string().contains("Duplicate key name") => {
            log::debug!("{} already exists", ASSIGNMENT_PAIR_INDEX);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// True when the error comes from a unique index rejecting a write.
pub fn is_unique_violation(err: &DbErr) -> bool {
    let message = err.to_string();
    UNIQUE_VIOLATION_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}
