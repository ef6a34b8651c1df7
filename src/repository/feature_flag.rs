use crate::db::is_unique_violation;
use crate::error::ServiceError;
use crate::filter::{FeatureFlagFilters, Pagination};
use crate::orm::{feature_flags, people};
use chrono::{NaiveDate, Utc};
use sea_orm::{entity::*, query::*, sea_query::Expr, DatabaseConnection, PaginatorTrait};

/// Columns written when a flag is created.
#[derive(Debug, Clone)]
pub struct NewFeatureFlag {
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub is_global: bool,
    pub expiration_date: Option<NaiveDate>,
    /// Creator.
    pub person_id: i32,
}

/// The columns an update overwrites. Name and creator never change.
#[derive(Debug, Clone)]
pub struct FeatureFlagChanges {
    pub description: String,
    pub is_active: bool,
    pub is_global: bool,
    pub expiration_date: Option<NaiveDate>,
}

/// A flag row joined with the person who created it.
pub type FeatureFlagWithCreator = (feature_flags::Model, Option<people::Model>);

pub struct FeatureFlagRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> FeatureFlagRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts a flag and returns its id. A name collision caught by the
    /// unique index is reported as `AlreadyExists`.
    pub async fn add(&self, flag: NewFeatureFlag) -> Result<i32, ServiceError> {
        let now = Utc::now().naive_utc();
        let model = feature_flags::ActiveModel {
            name: Set(flag.name.clone()),
            description: Set(flag.description),
            is_active: Set(flag.is_active),
            is_global: Set(flag.is_global),
            expiration_date: Set(flag.expiration_date),
            created_at: Set(now),
            updated_at: Set(now),
            person_id: Set(flag.person_id),
            ..Default::default()
        };

        match feature_flags::Entity::insert(model).exec(self.db).await {
            Ok(res) => Ok(res.last_insert_id),
            Err(e) if is_unique_violation(&e) => {
                log::warn!("Feature flag {} was created concurrently: {}", flag.name, e);
                Err(ServiceError::AlreadyExists(flag.name))
            }
            Err(e) => Err(ServiceError::storage("error when creating feature flag", e)),
        }
    }

    /// One page of flags (ordered by id) with their creators, and the
    /// number of flags matching `filters` across all pages.
    pub async fn find(
        &self,
        filters: &FeatureFlagFilters,
        pagination: Pagination,
    ) -> Result<(Vec<FeatureFlagWithCreator>, u64), ServiceError> {
        let query = Self::filtered(filters);

        let total = query
            .clone()
            .count(self.db)
            .await
            .map_err(|e| ServiceError::storage("error when counting feature flags", e))?
            as u64;

        let rows = query
            .find_also_related(people::Entity)
            .order_by_asc(feature_flags::Column::Id)
            .offset(pagination.offset())
            .limit(pagination.limit)
            .all(self.db)
            .await
            .map_err(|e| ServiceError::storage("error when getting feature flags", e))?;

        Ok((rows, total))
    }

    /// Overwrites the mutable columns of flag `id`. Returns the number of
    /// rows the store reports as affected.
    pub async fn update_by_id(
        &self,
        id: i32,
        changes: FeatureFlagChanges,
    ) -> Result<u64, ServiceError> {
        let result = feature_flags::Entity::update_many()
            .col_expr(
                feature_flags::Column::Description,
                Expr::value(changes.description),
            )
            .col_expr(feature_flags::Column::IsActive, Expr::value(changes.is_active))
            .col_expr(feature_flags::Column::IsGlobal, Expr::value(changes.is_global))
            .col_expr(
                feature_flags::Column::ExpirationDate,
                Expr::value(changes.expiration_date),
            )
            .col_expr(
                feature_flags::Column::UpdatedAt,
                Expr::value(Utc::now().naive_utc()),
            )
            .filter(feature_flags::Column::Id.eq(id))
            .exec(self.db)
            .await
            .map_err(|e| ServiceError::storage("error when updating feature flag", e))?;

        Ok(result.rows_affected)
    }

    fn filtered(filters: &FeatureFlagFilters) -> Select<feature_flags::Entity> {
        let mut query = feature_flags::Entity::find();
        if let Some(id) = filters.id {
            query = query.filter(feature_flags::Column::Id.eq(id));
        }
        if let Some(name) = &filters.name {
            query = query.filter(feature_flags::Column::Name.eq(name.as_str()));
        }
        if let Some(is_active) = filters.is_active {
            query = query.filter(feature_flags::Column::IsActive.eq(is_active));
        }
        if let Some(is_global) = filters.is_global {
            query = query.filter(feature_flags::Column::IsGlobal.eq(is_global));
        }
        if let Some(person_id) = filters.person_id {
            query = query.filter(feature_flags::Column::PersonId.eq(person_id));
        }
        query
    }
}
