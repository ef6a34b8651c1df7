//! Test fixtures for creating test data
#![allow(dead_code)]

use chrono::{NaiveDate, Utc};
use flagpost::orm::{assignments, feature_flags, people};
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr, PaginatorTrait};

/// Create a person with an email derived from the name.
pub async fn create_test_person(
    db: &DatabaseConnection,
    name: &str,
) -> Result<people::Model, DbErr> {
    people::ActiveModel {
        name: Set(name.to_string()),
        email: Set(format!("{}@test.com", name.to_lowercase().replace(' ', "."))),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Insert a flag directly, bypassing the service rules.
pub async fn create_test_feature_flag(
    db: &DatabaseConnection,
    name: &str,
    person_id: i32,
    is_global: bool,
) -> Result<feature_flags::Model, DbErr> {
    let now = Utc::now().naive_utc();
    feature_flags::ActiveModel {
        name: Set(name.to_string()),
        description: Set(format!("{} description", name)),
        is_active: Set(true),
        is_global: Set(is_global),
        expiration_date: Set(NaiveDate::from_ymd_opt(2030, 1, 31)),
        created_at: Set(now),
        updated_at: Set(now),
        person_id: Set(person_id),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn create_test_assignment(
    db: &DatabaseConnection,
    person_id: i32,
    feature_flag_id: i32,
) -> Result<assignments::Model, DbErr> {
    assignments::ActiveModel {
        person_id: Set(person_id),
        feature_flag_id: Set(feature_flag_id),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn count_assignments(db: &DatabaseConnection) -> Result<u64, DbErr> {
    Ok(assignments::Entity::find().count(db).await? as u64)
}
