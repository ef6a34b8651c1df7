use super::error::{service_error, HX_RESWAP, HX_RETARGET};
use super::web_limit;
use crate::app_config::AppConfig;
use crate::error::ServiceError;
use crate::filter::{checkbox_filter, non_empty, FeatureFlagFilters, Pagination};
use crate::middleware::ClientCtx;
use crate::service::feature_flag::{
    FeatureFlagRequest, FeatureFlagResponse, UpdateFeatureFlagRequest,
};
use crate::service::FeatureFlagService;
use crate::template::Paginator;
use actix_web::{error, get, post, put, web, Error, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(view_index)
        .service(view_feature_flags)
        .service(view_feature_flags_table)
        .service(view_feature_flag_form)
        .service(dismiss_error)
        .service(create_feature_flag)
        .service(update_feature_flag)
        .service(toggle_feature_flag_status);
}

/// Fired after a form save so the table reloads with its current filters.
const FLAGS_CHANGED_EVENT: &str = "flags_changed_event";

#[derive(Template)]
#[template(path = "feature_flags/index.html")]
pub struct FeatureFlagsTemplate {
    pub client: ClientCtx,
    pub filter_name: String,
    pub filter_active: bool,
    pub table: String,
}

#[derive(Template)]
#[template(path = "feature_flags/table.html")]
pub struct FeatureFlagTableTemplate {
    pub flags: Vec<FeatureFlagResponse>,
    pub total: u64,
    pub page: u64,
    pub paginator: Paginator,
}

#[derive(Template, Default)]
#[template(path = "feature_flags/form.html")]
pub struct FeatureFlagFormTemplate {
    pub id: Option<i32>,
    pub name: String,
    pub description: String,
    pub expiration_date: String,
    pub is_active: bool,
    pub is_global: bool,
    /// Property the error belongs to, empty when there is none.
    pub error_field: &'static str,
    pub error_message: String,
}

impl FeatureFlagFormTemplate {
    /// Editing an existing flag; its name is read-only.
    pub fn is_edit(&self) -> bool {
        self.id.is_some()
    }

    fn from_flag(flag: FeatureFlagResponse) -> Self {
        Self {
            id: Some(flag.id),
            name: flag.name,
            description: flag.description,
            expiration_date: flag.expiration_date,
            is_active: flag.is_active,
            is_global: flag.is_global,
            ..Default::default()
        }
    }

    fn from_form(id: Option<i32>, form: &FeatureFlagForm) -> Self {
        Self {
            id,
            name: form.name.clone(),
            description: form.description.clone(),
            expiration_date: form.expiration_date.clone(),
            is_active: form.is_active(),
            is_global: form.is_global(),
            ..Default::default()
        }
    }

    /// Points the form at the failing field. Errors that belong to no field
    /// are returned to the caller unchanged.
    fn with_error(mut self, e: ServiceError) -> Result<Self, ServiceError> {
        match &e {
            ServiceError::Validation(field_error) => {
                self.error_field = field_error.field.as_str();
                self.error_message = field_error.message();
            }
            ServiceError::AlreadyExists(_) => {
                self.error_field = "name";
                self.error_message = e.to_string();
            }
            _ => return Err(e),
        }
        Ok(self)
    }

    /// The form swapped back into its container with the field error.
    fn rejected(self) -> Result<HttpResponse, Error> {
        let html = self.render().map_err(error::ErrorInternalServerError)?;
        Ok(HttpResponse::Conflict()
            .content_type("text/html; charset=utf-8")
            .insert_header((HX_RETARGET, "#feature-flag-form"))
            .insert_header((HX_RESWAP, "innerHTML"))
            .body(html))
    }
}

/// Listing filters. The active filter is a checkbox.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlagListQuery {
    pub name: Option<String>,
    pub is_active: Option<String>,
    pub page: Option<String>,
}

impl FeatureFlagListQuery {
    fn filters(&self) -> FeatureFlagFilters {
        FeatureFlagFilters {
            name: non_empty(self.name.as_deref()),
            is_active: checkbox_filter(self.is_active.as_deref()),
            ..Default::default()
        }
    }
}

/// Create and edit form as posted by the browser.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureFlagForm {
    pub name: String,
    pub description: String,
    pub expiration_date: String,
    pub is_active: Option<String>,
    pub is_global: Option<String>,
}

impl FeatureFlagForm {
    fn is_active(&self) -> bool {
        checkbox_filter(self.is_active.as_deref()).unwrap_or(false)
    }

    fn is_global(&self) -> bool {
        checkbox_filter(self.is_global.as_deref()).unwrap_or(false)
    }

    fn create_request(&self) -> FeatureFlagRequest {
        FeatureFlagRequest {
            name: self.name.trim().to_owned(),
            description: self.description.trim().to_owned(),
            is_active: self.is_active(),
            is_global: self.is_global(),
            expiration_date: self.expiration_date.trim().to_owned(),
        }
    }

    fn update_request(&self) -> UpdateFeatureFlagRequest {
        UpdateFeatureFlagRequest {
            description: self.description.trim().to_owned(),
            is_active: self.is_active(),
            is_global: self.is_global(),
            expiration_date: self.expiration_date.trim().to_owned(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FormQuery {
    pub id: Option<i32>,
}

async fn feature_flag_table(
    db: &DatabaseConnection,
    query: &FeatureFlagListQuery,
    limit: u64,
) -> Result<FeatureFlagTableTemplate, Error> {
    let pagination = Pagination::from_query(query.page.as_deref(), None, limit);
    let (flags, total) = FeatureFlagService::new(db)
        .get_feature_flag(pagination, &query.filters())
        .await
        .map_err(service_error)?;

    Ok(FeatureFlagTableTemplate {
        flags,
        total,
        page: pagination.page,
        paginator: Paginator {
            base_url: "/feature-flags/filters".to_owned(),
            target: "#feature-flags-table",
            include: "#feature-flag-filters",
            this_page: pagination.page,
            page_count: pagination.page_count(total),
        },
    })
}

async fn render_feature_flags(
    client: ClientCtx,
    db: &DatabaseConnection,
    config: Option<web::Data<AppConfig>>,
    query: FeatureFlagListQuery,
) -> Result<impl Responder, Error> {
    client.require_login()?;

    let table = feature_flag_table(db, &query, web_limit(config.as_ref()))
        .await?
        .render()
        .map_err(error::ErrorInternalServerError)?;

    Ok(FeatureFlagsTemplate {
        client,
        filter_name: query.name.unwrap_or_default(),
        filter_active: checkbox_filter(query.is_active.as_deref()).is_some(),
        table,
    }
    .to_response())
}

#[get("/")]
pub async fn view_index(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: Option<web::Data<AppConfig>>,
) -> Result<impl Responder, Error> {
    render_feature_flags(client, &db, config, FeatureFlagListQuery::default()).await
}

#[get("/feature-flags")]
pub async fn view_feature_flags(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: Option<web::Data<AppConfig>>,
    query: web::Query<FeatureFlagListQuery>,
) -> Result<impl Responder, Error> {
    render_feature_flags(client, &db, config, query.into_inner()).await
}

#[get("/feature-flags/filters")]
pub async fn view_feature_flags_table(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: Option<web::Data<AppConfig>>,
    query: web::Query<FeatureFlagListQuery>,
) -> Result<impl Responder, Error> {
    client.require_login()?;

    Ok(feature_flag_table(&db, &query, web_limit(config.as_ref()))
        .await?
        .to_response())
}

#[get("/feature-flags/form/create-or-update")]
pub async fn view_feature_flag_form(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    query: web::Query<FormQuery>,
) -> Result<impl Responder, Error> {
    client.require_login()?;

    let form = match query.id {
        Some(id) => FeatureFlagFormTemplate::from_flag(
            FeatureFlagService::new(&db)
                .get_feature_flag_by_id(id)
                .await
                .map_err(service_error)?,
        ),
        None => FeatureFlagFormTemplate::default(),
    };

    Ok(form.to_response())
}

#[get("/feature-flags/component/error/dismiss")]
pub async fn dismiss_error() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body("")
}

/// Empties the form container and asks the table to reload.
fn saved() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .insert_header(("HX-Trigger", FLAGS_CHANGED_EVENT))
        .body("")
}

#[post("/feature-flags")]
pub async fn create_feature_flag(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    form: web::Form<FeatureFlagForm>,
) -> Result<HttpResponse, Error> {
    let person_id = client.require_login()?;

    match FeatureFlagService::new(&db)
        .create_feature_flag(&form.create_request(), person_id)
        .await
    {
        Ok(_) => Ok(saved()),
        Err(e) => FeatureFlagFormTemplate::from_form(None, &form)
            .with_error(e)
            .map_err(service_error)?
            .rejected(),
    }
}

#[put("/feature-flags/{id}")]
pub async fn update_feature_flag(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Form<FeatureFlagForm>,
) -> Result<HttpResponse, Error> {
    client.require_login()?;
    let id = path.into_inner();

    match FeatureFlagService::new(&db)
        .update_feature_flag_by_id(id, &form.update_request())
        .await
    {
        Ok(()) => Ok(saved()),
        Err(e) => FeatureFlagFormTemplate::from_form(Some(id), &form)
            .with_error(e)
            .map_err(service_error)?
            .rejected(),
    }
}

#[put("/feature-flags/status/{id}")]
pub async fn toggle_feature_flag_status(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: Option<web::Data<AppConfig>>,
    path: web::Path<i32>,
    form: web::Form<FeatureFlagListQuery>,
) -> Result<impl Responder, Error> {
    client.require_login()?;

    FeatureFlagService::new(&db)
        .toggle_active(path.into_inner())
        .await
        .map_err(service_error)?;

    Ok(feature_flag_table(&db, &form, web_limit(config.as_ref()))
        .await?
        .to_response())
}
