//! Server-rendered admin UI. Pages are askama templates; tables and
//! components are htmx fragments served from the same routes.

pub mod assignments;
pub mod error;
pub mod feature_flags;
pub mod login;

use crate::app_config::AppConfig;
use actix_web::web;

/// Configures the web app by adding services from each web file.
///
/// @see https://docs.rs/actix-web/4.5.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut web::ServiceConfig) {
    // Route resolution will stop at the first match.
    login::configure(conf);
    feature_flags::configure(conf);
    assignments::configure(conf);
}

/// Rows per table page when the app config is not registered.
pub(crate) fn web_limit(config: Option<&web::Data<AppConfig>>) -> u64 {
    config
        .map(|c| c.pagination.web_limit)
        .unwrap_or_else(|| AppConfig::default().pagination.web_limit)
}
