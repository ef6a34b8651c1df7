//! HTML error pages for the web UI.
//!
//! Full page loads get an error page. htmx requests get the message
//! component, retargeted into the page's `#error-message` slot.

use crate::error::ServiceError;
use crate::middleware::ClientCtx;
use actix_web::body::{BoxBody, EitherBody};
use actix_web::dev::ServiceResponse;
use actix_web::http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use actix_web::http::StatusCode;
use actix_web::middleware::{ErrorHandlerResponse, ErrorHandlers};
use actix_web::{error, HttpMessage, Result};
use askama_actix::Template;

pub const HX_REQUEST: &str = "hx-request";
pub const HX_RETARGET: &str = "hx-retarget";
pub const HX_RESWAP: &str = "hx-reswap";

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    client: ClientCtx,
    status: u16,
    title: &'static str,
    message: String,
}

#[derive(Template)]
#[template(path = "components/message.html")]
pub struct MessageTemplate {
    pub message: String,
}

/// Handlers for every status the web scope turns into HTML.
pub fn error_handlers<B: 'static>() -> ErrorHandlers<B> {
    ErrorHandlers::new()
        .handler(StatusCode::BAD_REQUEST, render_error)
        .handler(StatusCode::UNAUTHORIZED, render_error)
        .handler(StatusCode::NOT_FOUND, render_error)
        .handler(StatusCode::CONFLICT, render_error)
        .handler(StatusCode::INTERNAL_SERVER_ERROR, render_error)
}

/// Maps a service failure onto the status the error pages render.
pub fn service_error(e: ServiceError) -> error::Error {
    match e {
        ServiceError::Validation(_) => error::ErrorBadRequest(e),
        ServiceError::NotFound(_) => error::ErrorNotFound(e),
        ServiceError::AlreadyExists(_)
        | ServiceError::AlreadyAssigned { .. }
        | ServiceError::NotAssigned { .. }
        | ServiceError::NoRowsUpdated(_) => error::ErrorConflict(e),
        ServiceError::Internal(_) => error::ErrorInternalServerError(e),
    }
}

fn title(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "Bad request",
        StatusCode::UNAUTHORIZED => "Not logged in",
        StatusCode::NOT_FOUND => "Not found",
        StatusCode::CONFLICT => "Conflict",
        _ => "Something went wrong",
    }
}

pub fn render_error<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    // Handlers answer 409 themselves when re-rendering a form; leave those be.
    let message = res.response().error().map(|e| e.to_string());
    let message = match message {
        Some(message) => message,
        None if res.status() == StatusCode::CONFLICT => {
            return Ok(ErrorHandlerResponse::Response(res.map_into_left_body()));
        }
        None => title(res.status()).to_owned(),
    };

    let status = res.status();
    let is_htmx = res.request().headers().contains_key(HX_REQUEST);
    let html = if is_htmx {
        MessageTemplate { message }.render()
    } else {
        let client = ClientCtx::get_or_default_from_extensions(&mut res.request().extensions_mut());
        ErrorTemplate {
            client,
            status: status.as_u16(),
            title: title(status),
            message,
        }
        .render()
    };
    let html = html.unwrap_or_else(|e| {
        log::error!("Error page render failed: {}", e);
        title(status).to_owned()
    });

    let (req, res) = res.into_parts();
    let mut res = res.set_body(html);
    let headers = res.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    if is_htmx {
        headers.insert(
            HeaderName::from_static(HX_RETARGET),
            HeaderValue::from_static("#error-message"),
        );
        headers.insert(
            HeaderName::from_static(HX_RESWAP),
            HeaderValue::from_static("innerHTML"),
        );
    }

    let res: ServiceResponse<EitherBody<B, BoxBody>> = ServiceResponse::new(req, res)
        .map_into_boxed_body()
        .map_into_right_body();
    Ok(ErrorHandlerResponse::Response(res))
}
