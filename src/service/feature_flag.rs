use super::person::PersonResponse;
use super::TIMESTAMP_FORMAT;
use crate::error::ServiceError;
use crate::filter::{FeatureFlagFilters, Pagination};
use crate::orm::{feature_flags, people};
use crate::repository::feature_flag::{FeatureFlagChanges, NewFeatureFlag};
use crate::repository::FeatureFlagRepository;
use crate::validation::{
    parse_expiration_date, validate_feature_flag_create, validate_feature_flag_update,
    EXPIRATION_DATE_FORMAT,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

/// Create payload. Missing properties take their zero value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureFlagRequest {
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub is_global: bool,
    /// `YYYY-MM-DD` or empty.
    pub expiration_date: String,
}

/// Update payload. Every field is written, omitted ones as their zero value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateFeatureFlagRequest {
    pub description: String,
    pub is_active: bool,
    pub is_global: bool,
    pub expiration_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlagResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub is_global: bool,
    /// `YYYY-MM-DD`, empty when the flag never expires.
    pub expiration_date: String,
    pub created_at: String,
    pub updated_at: String,
    /// Creator.
    pub person: PersonResponse,
}

impl FeatureFlagResponse {
    fn from_row(flag: feature_flags::Model, person: Option<people::Model>) -> Self {
        Self {
            id: flag.id,
            name: flag.name,
            description: flag.description,
            is_active: flag.is_active,
            is_global: flag.is_global,
            expiration_date: flag
                .expiration_date
                .map(|d| d.format(EXPIRATION_DATE_FORMAT).to_string())
                .unwrap_or_default(),
            created_at: flag.created_at.format(TIMESTAMP_FORMAT).to_string(),
            updated_at: flag.updated_at.format(TIMESTAMP_FORMAT).to_string(),
            person: person.map(PersonResponse::from).unwrap_or_default(),
        }
    }

    fn changes(&self) -> FeatureFlagChanges {
        FeatureFlagChanges {
            description: self.description.clone(),
            is_active: self.is_active,
            is_global: self.is_global,
            expiration_date: parse_expiration_date(&self.expiration_date).unwrap_or(None),
        }
    }
}

pub struct FeatureFlagService<'a> {
    repository: FeatureFlagRepository<'a>,
}

impl<'a> FeatureFlagService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self {
            repository: FeatureFlagRepository::new(db),
        }
    }

    /// Creates a flag owned by `person_id` and returns its id.
    pub async fn create_feature_flag(
        &self,
        request: &FeatureFlagRequest,
        person_id: i32,
    ) -> Result<i32, ServiceError> {
        log::info!("Creating a new feature flag");

        validate_feature_flag_create(request)?;
        let expiration_date = parse_expiration_date(&request.expiration_date)?;

        let (existing, _) = self
            .repository
            .find(&FeatureFlagFilters::by_name(&request.name), Pagination::first())
            .await?;
        if !existing.is_empty() {
            return Err(ServiceError::AlreadyExists(request.name.clone()));
        }

        self.repository
            .add(NewFeatureFlag {
                name: request.name.clone(),
                description: request.description.clone(),
                is_active: request.is_active,
                is_global: request.is_global,
                expiration_date,
                person_id,
            })
            .await
    }

    /// One page of flags matching `filters`, and the total across pages.
    pub async fn get_feature_flag(
        &self,
        pagination: Pagination,
        filters: &FeatureFlagFilters,
    ) -> Result<(Vec<FeatureFlagResponse>, u64), ServiceError> {
        log::info!("Getting feature flags");

        let (rows, total) = self.repository.find(filters, pagination).await?;
        let items = rows
            .into_iter()
            .map(|(flag, person)| FeatureFlagResponse::from_row(flag, person))
            .collect();

        Ok((items, total))
    }

    pub async fn get_feature_flag_by_id(&self, id: i32) -> Result<FeatureFlagResponse, ServiceError> {
        let (rows, _) = self
            .repository
            .find(&FeatureFlagFilters::by_id(id), Pagination::first())
            .await?;

        rows.into_iter()
            .next()
            .map(|(flag, person)| FeatureFlagResponse::from_row(flag, person))
            .ok_or(ServiceError::NotFound("feature flag"))
    }

    /// Overwrites description, activity, globality and expiration of flag `id`.
    pub async fn update_feature_flag_by_id(
        &self,
        id: i32,
        request: &UpdateFeatureFlagRequest,
    ) -> Result<(), ServiceError> {
        log::info!("Updating feature flag {}", id);

        validate_feature_flag_update(request)?;
        let expiration_date = parse_expiration_date(&request.expiration_date)?;

        self.get_feature_flag_by_id(id).await?;

        let changes = FeatureFlagChanges {
            description: request.description.clone(),
            is_active: request.is_active,
            is_global: request.is_global,
            expiration_date,
        };
        self.write(id, changes).await
    }

    /// Flips `is_active` and returns the new value.
    pub async fn toggle_active(&self, id: i32) -> Result<bool, ServiceError> {
        log::info!("Toggling status of feature flag {}", id);

        let flag = self.get_feature_flag_by_id(id).await?;
        let mut changes = flag.changes();
        changes.is_active = !flag.is_active;
        self.write(id, changes).await?;

        Ok(!flag.is_active)
    }

    /// Flips `is_global` and returns the new value.
    pub async fn toggle_global(&self, id: i32) -> Result<bool, ServiceError> {
        log::info!("Toggling global assignment of feature flag {}", id);

        let flag = self.get_feature_flag_by_id(id).await?;
        let mut changes = flag.changes();
        changes.is_global = !flag.is_global;
        self.write(id, changes).await?;

        Ok(!flag.is_global)
    }

    async fn write(&self, id: i32, changes: FeatureFlagChanges) -> Result<(), ServiceError> {
        match self.repository.update_by_id(id, changes).await? {
            0 => Err(ServiceError::NoRowsUpdated(id)),
            _ => Ok(()),
        }
    }
}
