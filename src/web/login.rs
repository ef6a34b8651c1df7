use super::error::service_error;
use super::web_limit;
use crate::app_config::AppConfig;
use crate::error::ServiceError;
use crate::filter::{non_empty, Pagination};
use crate::middleware::{ClientCtx, SESSION_PERSON_KEY};
use crate::service::person::PersonResponse;
use crate::service::PersonService;
use actix_session::Session;
use actix_web::http::header::LOCATION;
use actix_web::{error, get, post, web, Error, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(view_login)
        .service(post_login)
        .service(post_logout);
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub client: ClientCtx,
    pub people: Vec<PersonResponse>,
    pub total: u64,
    pub name: String,
}

impl LoginTemplate {
    /// More people match than fit on the page.
    pub fn has_more(&self) -> bool {
        self.total > self.people.len() as u64
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm {
    pub person_id: i32,
}

fn see_other(location: &'static str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((LOCATION, location))
        .finish()
}

/// People are provisioned elsewhere; logging in means picking one.
#[get("/login")]
pub async fn view_login(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: Option<web::Data<AppConfig>>,
    query: web::Query<LoginQuery>,
) -> Result<impl Responder, Error> {
    let name = non_empty(query.name.as_deref());
    let (people, total) = PersonService::new(&db)
        .get_people(Pagination::new(1, web_limit(config.as_ref())), name.as_deref())
        .await
        .map_err(service_error)?;

    Ok(LoginTemplate {
        client,
        people,
        total,
        name: name.unwrap_or_default(),
    }
    .to_response())
}

#[post("/login")]
pub async fn post_login(
    db: web::Data<DatabaseConnection>,
    session: Session,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, Error> {
    let person = match PersonService::new(&db).get_person(form.person_id).await {
        Ok(person) => person,
        Err(ServiceError::NotFound(_)) => {
            log::debug!("login failure: unknown person {}", form.person_id);
            return Err(error::ErrorUnauthorized("Unknown person."));
        }
        Err(e) => return Err(service_error(e)),
    };

    session.renew();
    session
        .insert(SESSION_PERSON_KEY, person.id)
        .map_err(|_| error::ErrorInternalServerError("middleware error"))?;
    log::info!("Person {} logged in", person.id);

    Ok(see_other("/feature-flags"))
}

#[post("/logout")]
pub async fn post_logout(session: Session) -> impl Responder {
    session.purge();
    see_other("/login")
}
