pub mod api;
pub mod app_config;
pub mod db;
pub mod error;
pub mod filter;
pub mod middleware;
pub mod orm;
pub mod repository;
pub mod service;
pub mod template;
pub mod validation;
pub mod web;

/// Registers the JSON API and the web UI. The API scope comes first so the
/// web scope's HTML error pages never apply to it.
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    api::configure(conf);
    conf.service(
        actix_web::web::scope("")
            .wrap(web::error::error_handlers())
            .configure(web::configure),
    );
}
