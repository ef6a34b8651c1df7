use crate::error::ServiceError;
use crate::repository::AssignmentRepository;
use crate::validation::validate_assignment;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use validator::Validate;

/// Body of both assignment endpoints. Zero means unset.
#[derive(Debug, Clone, Copy, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct AssignmentRequest {
    #[validate(range(min = 1))]
    pub person_id: i32,
    #[validate(range(min = 1))]
    pub feature_flag_id: i32,
}

pub struct AssignmentService<'a> {
    repository: AssignmentRepository<'a>,
}

impl<'a> AssignmentService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self {
            repository: AssignmentRepository::new(db),
        }
    }

    // TODO: record acting_person_id in an audit trail once one exists.
    pub async fn apply_assignment(
        &self,
        request: AssignmentRequest,
        _acting_person_id: i32,
    ) -> Result<(), ServiceError> {
        log::info!(
            "Assigning feature flag {} to person {}",
            request.feature_flag_id,
            request.person_id
        );

        validate_assignment(&request)?;

        if self
            .repository
            .find(request.person_id, request.feature_flag_id)
            .await?
            .is_some()
        {
            return Err(ServiceError::AlreadyAssigned {
                person_id: request.person_id,
                feature_flag_id: request.feature_flag_id,
            });
        }

        self.repository
            .add(request.person_id, request.feature_flag_id)
            .await
    }

    pub async fn delete_assignment(
        &self,
        request: AssignmentRequest,
        _acting_person_id: i32,
    ) -> Result<(), ServiceError> {
        log::info!(
            "Removing feature flag {} from person {}",
            request.feature_flag_id,
            request.person_id
        );

        validate_assignment(&request)?;

        let not_assigned = ServiceError::NotAssigned {
            person_id: request.person_id,
            feature_flag_id: request.feature_flag_id,
        };

        if self
            .repository
            .find(request.person_id, request.feature_flag_id)
            .await?
            .is_none()
        {
            return Err(not_assigned);
        }

        // Lost a race with another delete.
        match self
            .repository
            .delete(request.person_id, request.feature_flag_id)
            .await?
        {
            0 => Err(not_assigned),
            _ => Ok(()),
        }
    }

    /// Applies the assignment when missing, removes it otherwise. Returns
    /// whether the person is assigned afterwards.
    pub async fn toggle_assignment(
        &self,
        request: AssignmentRequest,
        acting_person_id: i32,
    ) -> Result<bool, ServiceError> {
        validate_assignment(&request)?;

        let assigned = self
            .repository
            .find(request.person_id, request.feature_flag_id)
            .await?
            .is_some();

        if assigned {
            self.delete_assignment(request, acting_person_id).await?;
        } else {
            self.apply_assignment(request, acting_person_id).await?;
        }
        Ok(!assigned)
    }
}
