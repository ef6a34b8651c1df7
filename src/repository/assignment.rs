use crate::db::is_unique_violation;
use crate::error::ServiceError;
use crate::orm::assignments;
use sea_orm::{entity::*, query::*, DatabaseConnection};

pub struct AssignmentRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> AssignmentRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find(
        &self,
        person_id: i32,
        feature_flag_id: i32,
    ) -> Result<Option<assignments::Model>, ServiceError> {
        assignments::Entity::find()
            .filter(assignments::Column::PersonId.eq(person_id))
            .filter(assignments::Column::FeatureFlagId.eq(feature_flag_id))
            .one(self.db)
            .await
            .map_err(|e| ServiceError::storage("error when getting assignment", e))
    }

    /// Inserts the pair. A concurrent insert rejected by the unique index
    /// is reported as `AlreadyAssigned`.
    pub async fn add(&self, person_id: i32, feature_flag_id: i32) -> Result<(), ServiceError> {
        let model = assignments::ActiveModel {
            person_id: Set(person_id),
            feature_flag_id: Set(feature_flag_id),
            ..Default::default()
        };

        match assignments::Entity::insert(model).exec(self.db).await {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => {
                log::warn!(
                    "Assignment of person {} to flag {} was created concurrently: {}",
                    person_id,
                    feature_flag_id,
                    e
                );
                Err(ServiceError::AlreadyAssigned {
                    person_id,
                    feature_flag_id,
                })
            }
            Err(e) => Err(ServiceError::storage("error when assigning feature flag", e)),
        }
    }

    /// Deletes the pair and returns how many rows went away.
    pub async fn delete(&self, person_id: i32, feature_flag_id: i32) -> Result<u64, ServiceError> {
        let result = assignments::Entity::delete_many()
            .filter(assignments::Column::PersonId.eq(person_id))
            .filter(assignments::Column::FeatureFlagId.eq(feature_flag_id))
            .exec(self.db)
            .await
            .map_err(|e| ServiceError::storage("error when deleting assignment", e))?;

        Ok(result.rows_affected)
    }
}
