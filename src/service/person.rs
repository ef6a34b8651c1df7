use crate::error::ServiceError;
use crate::filter::{Pagination, PersonFilters};
use crate::orm::people;
use crate::repository::person::{AssignedFeatureFlag, PersonWithAssignment};
use crate::repository::PersonRepository;
use sea_orm::DatabaseConnection;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersonResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
}

impl From<people::Model> for PersonResponse {
    fn from(person: people::Model) -> Self {
        Self {
            id: person.id,
            name: person.name,
            email: person.email,
        }
    }
}

/// A person resolved against one flag. `is_assigned` is true for an
/// explicit assignment or a global flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonWithAssignmentResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub is_assigned: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedFeatureFlagResponse {
    pub id: i32,
    pub name: String,
    pub is_active: bool,
    pub is_global: bool,
    pub is_assigned: bool,
}

pub struct PersonService<'a> {
    repository: PersonRepository<'a>,
}

impl<'a> PersonService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self {
            repository: PersonRepository::new(db),
        }
    }

    pub async fn get_people(
        &self,
        pagination: Pagination,
        name: Option<&str>,
    ) -> Result<(Vec<PersonResponse>, u64), ServiceError> {
        log::info!("Getting people");

        let (people, total) = self.repository.find(pagination, name).await?;
        Ok((people.into_iter().map(PersonResponse::from).collect(), total))
    }

    pub async fn get_person(&self, id: i32) -> Result<PersonResponse, ServiceError> {
        self.repository
            .find_by_id(id)
            .await?
            .map(PersonResponse::from)
            .ok_or(ServiceError::NotFound("person"))
    }

    /// Every person (paged) with their assignment state for
    /// `filters.feature_flag_id`.
    pub async fn get_people_assignment_by_feature_flag(
        &self,
        pagination: Pagination,
        filters: &PersonFilters,
    ) -> Result<(Vec<PersonWithAssignmentResponse>, u64), ServiceError> {
        log::info!(
            "Getting people assignment for feature flag {}",
            filters.feature_flag_id
        );

        let flag = self
            .repository
            .find_feature_flag(filters.feature_flag_id)
            .await?
            .ok_or(ServiceError::NotFound("feature flag"))?;

        let (rows, total) = self
            .repository
            .find_with_assignment(pagination, filters, &flag)
            .await?;

        let items = rows
            .into_iter()
            .map(|PersonWithAssignment { person, has_assignment }| PersonWithAssignmentResponse {
                id: person.id,
                name: person.name,
                email: person.email,
                is_assigned: has_assignment || flag.is_global,
            })
            .collect();

        Ok((items, total))
    }

    /// Flags the person holds, explicitly or through a global flag.
    pub async fn get_assigned_feature_flags_by_person_id(
        &self,
        person_id: i32,
    ) -> Result<Vec<AssignedFeatureFlagResponse>, ServiceError> {
        log::info!("Getting feature flags assigned to person {}", person_id);

        let flags = self
            .repository
            .find_feature_flags_for_person(person_id)
            .await?;

        Ok(flags
            .into_iter()
            .map(|AssignedFeatureFlag { feature_flag, has_assignment }| {
                AssignedFeatureFlagResponse {
                    is_assigned: has_assignment || feature_flag.is_global,
                    id: feature_flag.id,
                    name: feature_flag.name,
                    is_active: feature_flag.is_active,
                    is_global: feature_flag.is_global,
                }
            })
            .filter(|flag| flag.is_assigned)
            .collect())
    }
}
