use super::{acting_person, ApiError, ListResponse, MessageResponse};
use crate::app_config::AppConfig;
use crate::error::ServiceError;
use crate::filter::{non_empty, parse_tri_state, FeatureFlagFilters, Pagination};
use crate::middleware::ClientCtx;
use crate::service::feature_flag::{FeatureFlagRequest, UpdateFeatureFlagRequest};
use crate::service::FeatureFlagService;
use actix_web::{get, post, put, web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(create_feature_flag)
        .service(list_feature_flags)
        .service(update_feature_flag);
}

/// Raw listing query. Paging is lenient; ids must be integers.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlagQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub id: Option<i32>,
    pub name: Option<String>,
    pub person_id: Option<i32>,
    pub is_active: Option<String>,
    pub is_global: Option<String>,
}

impl FeatureFlagQuery {
    fn filters(&self) -> Result<FeatureFlagFilters, ApiError> {
        Ok(FeatureFlagFilters {
            id: self.id,
            name: non_empty(self.name.as_deref()),
            is_active: parse_tri_state("isActive", self.is_active.as_deref())?,
            is_global: parse_tri_state("isGlobal", self.is_global.as_deref())?,
            person_id: self.person_id,
        })
    }
}

/// Page size default when the app config is not registered.
pub(super) fn default_limit(config: Option<&web::Data<AppConfig>>) -> u64 {
    config
        .map(|c| c.pagination.default_limit)
        .unwrap_or_else(|| AppConfig::default().pagination.default_limit)
}

#[post("/v1/feature-flags")]
pub async fn create_feature_flag(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    body: web::Json<FeatureFlagRequest>,
) -> Result<HttpResponse, ApiError> {
    let person_id = acting_person(&client)?;

    FeatureFlagService::new(&db)
        .create_feature_flag(&body, person_id)
        .await?;

    Ok(HttpResponse::Created().json(MessageResponse::new(format!(
        "feature flag {} created",
        body.name
    ))))
}

#[get("/v1/feature-flags")]
pub async fn list_feature_flags(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: Option<web::Data<AppConfig>>,
    query: web::Query<FeatureFlagQuery>,
) -> Result<HttpResponse, ApiError> {
    acting_person(&client)?;

    let filters = query.filters()?;
    let pagination = Pagination::from_query(
        query.page.as_deref(),
        query.limit.as_deref(),
        default_limit(config.as_ref()),
    );

    let (items, total) = FeatureFlagService::new(&db)
        .get_feature_flag(pagination, &filters)
        .await?;

    Ok(HttpResponse::Ok().json(ListResponse { items, total }))
}

#[put("/v1/feature-flags/{id}")]
pub async fn update_feature_flag(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    body: web::Json<UpdateFeatureFlagRequest>,
) -> Result<HttpResponse, ApiError> {
    acting_person(&client)?;
    let id = path.into_inner();

    match FeatureFlagService::new(&db)
        .update_feature_flag_by_id(id, &body)
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(MessageResponse::new(format!(
            "feature flag {} updated",
            id
        )))),
        Err(e @ ServiceError::NoRowsUpdated(_)) => {
            Ok(HttpResponse::Ok().json(MessageResponse::new(e.to_string())))
        }
        Err(e) => Err(e.into()),
    }
}
