use crate::error::ServiceError;
use crate::filter::{Pagination, PersonFilters};
use crate::orm::{assignments, feature_flags, people};
use sea_orm::{entity::*, query::*, DatabaseConnection, PaginatorTrait};
use std::collections::HashSet;

/// A person and whether an explicit assignment row exists for the flag
/// being resolved. Global flags are folded in by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonWithAssignment {
    pub person: people::Model,
    pub has_assignment: bool,
}

/// A flag and whether the person holds an explicit assignment row for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedFeatureFlag {
    pub feature_flag: feature_flags::Model,
    pub has_assignment: bool,
}

pub struct PersonRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> PersonRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<people::Model>, ServiceError> {
        people::Entity::find_by_id(id)
            .one(self.db)
            .await
            .map_err(|e| ServiceError::storage("error when getting person", e))
    }

    /// One page of people ordered by id, optionally narrowed to names
    /// containing `name`.
    pub async fn find(
        &self,
        pagination: Pagination,
        name: Option<&str>,
    ) -> Result<(Vec<people::Model>, u64), ServiceError> {
        let mut query = people::Entity::find();
        if let Some(name) = name {
            query = query.filter(people::Column::Name.like(&format!("%{}%", name)));
        }
        self.page(query, pagination).await
    }

    pub async fn find_feature_flag(
        &self,
        id: i32,
    ) -> Result<Option<feature_flags::Model>, ServiceError> {
        feature_flags::Entity::find_by_id(id)
            .one(self.db)
            .await
            .map_err(|e| ServiceError::storage("error when getting feature flag", e))
    }

    /// People paired with their explicit assignment state for `flag`.
    ///
    /// `is_assigned = Some(true)` keeps only explicit rows and never matches
    /// a global flag. `Some(false)` does not narrow the result.
    pub async fn find_with_assignment(
        &self,
        pagination: Pagination,
        filters: &PersonFilters,
        flag: &feature_flags::Model,
    ) -> Result<(Vec<PersonWithAssignment>, u64), ServiceError> {
        let mut query = people::Entity::find();
        if let Some(name) = &filters.name {
            query = query.filter(people::Column::Name.like(&format!("%{}%", name)));
        }
        if filters.is_assigned == Some(true) {
            if flag.is_global {
                return Ok((Vec::new(), 0));
            }
            let assigned_people = assignments::Entity::find()
                .select_only()
                .column(assignments::Column::PersonId)
                .filter(assignments::Column::FeatureFlagId.eq(flag.id))
                .into_query();
            query = query.filter(people::Column::Id.in_subquery(assigned_people));
        }

        let (people, total) = self.page(query, pagination).await?;

        let ids: Vec<i32> = people.iter().map(|p| p.id).collect();
        let assigned: HashSet<i32> = if ids.is_empty() {
            HashSet::new()
        } else {
            assignments::Entity::find()
                .filter(assignments::Column::FeatureFlagId.eq(flag.id))
                .filter(assignments::Column::PersonId.is_in(ids))
                .all(self.db)
                .await
                .map_err(|e| ServiceError::storage("error when getting people", e))?
                .into_iter()
                .map(|a| a.person_id)
                .collect()
        };

        let rows = people
            .into_iter()
            .map(|person| PersonWithAssignment {
                has_assignment: assigned.contains(&person.id),
                person,
            })
            .collect();

        Ok((rows, total))
    }

    /// Every flag ordered by id, marked with the person's explicit
    /// assignment state.
    pub async fn find_feature_flags_for_person(
        &self,
        person_id: i32,
    ) -> Result<Vec<AssignedFeatureFlag>, ServiceError> {
        let flags = feature_flags::Entity::find()
            .order_by_asc(feature_flags::Column::Id)
            .all(self.db)
            .await
            .map_err(|e| ServiceError::storage("error when getting feature flag by people", e))?;

        let assigned: HashSet<i32> = assignments::Entity::find()
            .filter(assignments::Column::PersonId.eq(person_id))
            .all(self.db)
            .await
            .map_err(|e| ServiceError::storage("error when getting feature flag by people", e))?
            .into_iter()
            .map(|a| a.feature_flag_id)
            .collect();

        Ok(flags
            .into_iter()
            .map(|feature_flag| AssignedFeatureFlag {
                has_assignment: assigned.contains(&feature_flag.id),
                feature_flag,
            })
            .collect())
    }

    async fn page(
        &self,
        query: Select<people::Entity>,
        pagination: Pagination,
    ) -> Result<(Vec<people::Model>, u64), ServiceError> {
        let total = query
            .clone()
            .count(self.db)
            .await
            .map_err(|e| ServiceError::storage("error when counting people", e))?
            as u64;

        let people = query
            .order_by_asc(people::Column::Id)
            .offset(pagination.offset())
            .limit(pagination.limit)
            .all(self.db)
            .await
            .map_err(|e| ServiceError::storage("error when getting people", e))?;

        Ok((people, total))
    }
}
