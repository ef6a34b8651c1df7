use super::feature_flags::default_limit;
use super::{acting_person, ApiError, ListResponse};
use crate::app_config::AppConfig;
use crate::filter::{non_empty, parse_tri_state, Pagination, PersonFilters};
use crate::middleware::ClientCtx;
use crate::service::PersonService;
use actix_web::{get, web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    // Literal segments before `{id}`.
    conf.service(list_people_assignment)
        .service(list_people)
        .service(list_assigned_feature_flags);
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeopleQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub name: Option<String>,
    pub is_assigned: Option<String>,
}

impl PeopleQuery {
    fn pagination(&self, config: Option<&web::Data<AppConfig>>) -> Pagination {
        Pagination::from_query(
            self.page.as_deref(),
            self.limit.as_deref(),
            default_limit(config),
        )
    }
}

#[get("/v1/people")]
pub async fn list_people(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: Option<web::Data<AppConfig>>,
    query: web::Query<PeopleQuery>,
) -> Result<HttpResponse, ApiError> {
    acting_person(&client)?;

    let name = non_empty(query.name.as_deref());
    let (items, total) = PersonService::new(&db)
        .get_people(query.pagination(config.as_ref()), name.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(ListResponse { items, total }))
}

#[get("/v1/people/feature-flags/{id}")]
pub async fn list_people_assignment(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: Option<web::Data<AppConfig>>,
    path: web::Path<i32>,
    query: web::Query<PeopleQuery>,
) -> Result<HttpResponse, ApiError> {
    acting_person(&client)?;

    let filters = PersonFilters {
        feature_flag_id: path.into_inner(),
        name: non_empty(query.name.as_deref()),
        is_assigned: parse_tri_state("isAssigned", query.is_assigned.as_deref())?,
    };

    let (items, total) = PersonService::new(&db)
        .get_people_assignment_by_feature_flag(query.pagination(config.as_ref()), &filters)
        .await?;

    Ok(HttpResponse::Ok().json(ListResponse { items, total }))
}

#[get("/v1/people/{id}/assigned-feature-flags")]
pub async fn list_assigned_feature_flags(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    acting_person(&client)?;

    let items = PersonService::new(&db)
        .get_assigned_feature_flags_by_person_id(path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(items))
}
