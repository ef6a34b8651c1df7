use super::error::service_error;
use super::web_limit;
use crate::app_config::AppConfig;
use crate::filter::{checkbox_filter, non_empty, Pagination, PersonFilters};
use crate::middleware::ClientCtx;
use crate::service::assignment::AssignmentRequest;
use crate::service::feature_flag::FeatureFlagResponse;
use crate::service::person::PersonWithAssignmentResponse;
use crate::service::{AssignmentService, FeatureFlagService, PersonService};
use crate::template::Paginator;
use actix_web::{error, get, put, web, Error, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(view_assignments)
        .service(view_assignments_table)
        .service(toggle_assignment)
        .service(toggle_global)
        .service(view_global_button)
        .service(view_only_assigned_filter);
}

/// Raised once the global toggle is swapped in; dependent components reload.
pub const IS_GLOBAL_EVENT: &str = "is_global_event";

#[derive(Template)]
#[template(path = "assignments/index.html")]
pub struct AssignmentsTemplate {
    pub client: ClientCtx,
    pub flag: FeatureFlagResponse,
    pub global_button: String,
    pub only_assigned: String,
    pub table: String,
}

#[derive(Template)]
#[template(path = "assignments/table.html")]
pub struct AssignmentTableTemplate {
    pub feature_flag_id: i32,
    pub is_global: bool,
    pub people: Vec<PersonWithAssignmentResponse>,
    pub total: u64,
    pub paginator: Paginator,
}

#[derive(Template)]
#[template(path = "components/assignment_button.html")]
pub struct AssignmentButtonTemplate {
    pub feature_flag_id: i32,
    pub person_id: i32,
    pub is_global: bool,
    pub is_assigned: bool,
}

#[derive(Template)]
#[template(path = "components/global_button.html")]
pub struct GlobalButtonTemplate {
    pub feature_flag_id: i32,
    pub is_global: bool,
}

#[derive(Template)]
#[template(path = "components/only_assigned.html")]
pub struct OnlyAssignedTemplate {
    pub feature_flag_id: i32,
    pub is_global: bool,
    pub checked: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentListQuery {
    pub name: Option<String>,
    pub is_assigned: Option<String>,
    pub page: Option<String>,
}

async fn find_flag(db: &DatabaseConnection, id: i32) -> Result<FeatureFlagResponse, Error> {
    FeatureFlagService::new(db)
        .get_feature_flag_by_id(id)
        .await
        .map_err(service_error)
}

async fn assignment_table(
    db: &DatabaseConnection,
    flag: &FeatureFlagResponse,
    query: &AssignmentListQuery,
    limit: u64,
) -> Result<AssignmentTableTemplate, Error> {
    let pagination = Pagination::from_query(query.page.as_deref(), None, limit);
    let filters = PersonFilters {
        feature_flag_id: flag.id,
        name: non_empty(query.name.as_deref()),
        is_assigned: checkbox_filter(query.is_assigned.as_deref()),
    };

    let (people, total) = PersonService::new(db)
        .get_people_assignment_by_feature_flag(pagination, &filters)
        .await
        .map_err(service_error)?;

    Ok(AssignmentTableTemplate {
        feature_flag_id: flag.id,
        is_global: flag.is_global,
        people,
        total,
        paginator: Paginator {
            base_url: format!("/feature-flags/{}/assignments/filters", flag.id),
            target: "#assignments-table",
            include: "#assignment-filters",
            this_page: pagination.page,
            page_count: pagination.page_count(total),
        },
    })
}

fn render<T: Template>(template: T) -> Result<String, Error> {
    template.render().map_err(error::ErrorInternalServerError)
}

#[get("/feature-flags/{id}/assignments")]
pub async fn view_assignments(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: Option<web::Data<AppConfig>>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    client.require_login()?;

    let flag = find_flag(&db, path.into_inner()).await?;
    let query = AssignmentListQuery::default();
    let table = render(assignment_table(&db, &flag, &query, web_limit(config.as_ref())).await?)?;
    let global_button = render(GlobalButtonTemplate {
        feature_flag_id: flag.id,
        is_global: flag.is_global,
    })?;
    let only_assigned = render(OnlyAssignedTemplate {
        feature_flag_id: flag.id,
        is_global: flag.is_global,
        checked: false,
    })?;

    Ok(AssignmentsTemplate {
        client,
        flag,
        global_button,
        only_assigned,
        table,
    }
    .to_response())
}

#[get("/feature-flags/{id}/assignments/filters")]
pub async fn view_assignments_table(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: Option<web::Data<AppConfig>>,
    path: web::Path<i32>,
    query: web::Query<AssignmentListQuery>,
) -> Result<impl Responder, Error> {
    client.require_login()?;

    let flag = find_flag(&db, path.into_inner()).await?;
    Ok(assignment_table(&db, &flag, &query, web_limit(config.as_ref()))
        .await?
        .to_response())
}

#[put("/feature-flags/{id}/assignments/{person_id}")]
pub async fn toggle_assignment(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(i32, i32)>,
) -> Result<impl Responder, Error> {
    let acting_person_id = client.require_login()?;
    let (feature_flag_id, person_id) = path.into_inner();

    let flag = find_flag(&db, feature_flag_id).await?;
    let is_assigned = AssignmentService::new(&db)
        .toggle_assignment(
            AssignmentRequest {
                person_id,
                feature_flag_id,
            },
            acting_person_id,
        )
        .await
        .map_err(service_error)?;

    Ok(AssignmentButtonTemplate {
        feature_flag_id,
        person_id,
        is_global: flag.is_global,
        is_assigned: is_assigned || flag.is_global,
    }
    .to_response())
}

#[put("/feature-flags/{id}/global")]
pub async fn toggle_global(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    client.require_login()?;
    let id = path.into_inner();

    let is_global = FeatureFlagService::new(&db)
        .toggle_global(id)
        .await
        .map_err(service_error)?;

    let html = render(GlobalButtonTemplate {
        feature_flag_id: id,
        is_global,
    })?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .insert_header(("HX-Trigger-After-Swap", IS_GLOBAL_EVENT))
        .body(html))
}

#[get("/feature-flags/{id}/component/set-global-button")]
pub async fn view_global_button(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    client.require_login()?;

    let flag = find_flag(&db, path.into_inner()).await?;
    Ok(GlobalButtonTemplate {
        feature_flag_id: flag.id,
        is_global: flag.is_global,
    }
    .to_response())
}

#[get("/feature-flags/{id}/component/show-only-assigned-people")]
pub async fn view_only_assigned_filter(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    query: web::Query<AssignmentListQuery>,
) -> Result<impl Responder, Error> {
    client.require_login()?;

    let flag = find_flag(&db, path.into_inner()).await?;
    Ok(OnlyAssignedTemplate {
        feature_flag_id: flag.id,
        is_global: flag.is_global,
        // The filter never matches on a global flag.
        checked: !flag.is_global && checkbox_filter(query.is_assigned.as_deref()).is_some(),
    }
    .to_response())
}
