//! JSON API under `/api/feature-flags`.
//!
//! Every endpoint requires an acting person, normally passed in the
//! `Personid` header.

pub mod assignments;
pub mod feature_flags;
pub mod people;

use crate::error::ServiceError;
use crate::filter::InvalidBool;
use crate::middleware::{ClientCtx, IdentityError};
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use serde::Serialize;

pub fn configure(conf: &mut web::ServiceConfig) {
    conf.service(
        web::scope("/api/feature-flags")
            .app_data(json_config())
            .app_data(query_config())
            .app_data(path_config())
            .configure(feature_flags::configure)
            .configure(assignments::configure)
            .configure(people::configure),
    );
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(format!("invalid body: {}", err)).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(format!("invalid query: {}", err)).into())
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(format!("invalid path: {}", err)).into())
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One page of rows and the number of rows across all pages.
#[derive(Debug, Serialize)]
pub struct ListResponse<T: Serialize> {
    pub items: Vec<T>,
    pub total: u64,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'a str>,
}

/// Error returned by every API handler, rendered as JSON.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized(IdentityError),
    BadRequest(String),
    Service(ServiceError),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Unauthorized(e) => write!(f, "{}", e),
            ApiError::BadRequest(message) => write!(f, "{}", message),
            ApiError::Service(e) => write!(f, "{}", e),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Service(e) => match e {
                ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
                ServiceError::AlreadyExists(_)
                | ServiceError::AlreadyAssigned { .. }
                | ServiceError::NotAssigned { .. }
                | ServiceError::NoRowsUpdated(_) => StatusCode::CONFLICT,
                ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        let field_error = match self {
            ApiError::Service(e) => e.field_error(),
            _ => None,
        };

        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
            code: field_error.map(|e| e.code()),
            field: field_error.map(|e| e.field.as_str()),
        })
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        ApiError::Service(e)
    }
}

impl From<IdentityError> for ApiError {
    fn from(e: IdentityError) -> Self {
        ApiError::Unauthorized(e)
    }
}

impl From<InvalidBool> for ApiError {
    fn from(e: InvalidBool) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

/// Acting person for an API call.
fn acting_person(client: &ClientCtx) -> Result<i32, ApiError> {
    Ok(client.person_id()?)
}
