use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::{Key, SameSite};
use actix_web::http::header;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use env_logger::Env;
use flagpost::app_config::AppConfig;
use flagpost::db;
use flagpost::middleware::ClientCtx;
use rand::{distributions::Alphanumeric, Rng};
use std::io;

/// Shortest key actix accepts for signing cookies.
const MIN_SECRET_KEY_LEN: usize = 64;

#[actix_web::main]
async fn main() -> io::Result<()> {
    init_lib_mods();

    let config = AppConfig::load().map_err(to_io_error)?;
    let database_url = config.database_url().map_err(to_io_error)?;
    let pool = db::connect(
        database_url,
        config.database.max_connections,
        config.database.sqlx_logging,
    )
    .await
    .map_err(to_io_error)?;
    db::create_schema(&pool).await.map_err(to_io_error)?;

    let secret_key = session_key(&config.session.secret_key);
    let bind_address = config.bind_address();
    log::info!("Listening on {}:{}", bind_address.0, bind_address.1);

    HttpServer::new(move || {
        // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
        App::new()
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .wrap(
                DefaultHeaders::new()
                    .add((header::X_FRAME_OPTIONS, "DENY"))
                    .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff")),
            )
            .wrap(ClientCtx::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_same_site(SameSite::Lax)
                    .cookie_secure(false) // Allow HTTP for development
                    .build(),
            )
            .wrap(Logger::default())
            .configure(flagpost::configure)
    })
    .bind(bind_address)?
    .run()
    .await
}

/// Initialize third party crates we rely on but don't have control over.
fn init_lib_mods() {
    // A missing .env is fine; the environment may already be set.
    if let Err(e) = dotenv::dotenv() {
        eprintln!("No .env loaded: {}", e);
    }
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}

fn session_key(configured: &str) -> Key {
    if configured.len() >= MIN_SECRET_KEY_LEN {
        return Key::from(configured.as_bytes());
    }

    let random_string: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(128)
        .map(char::from)
        .collect();
    log::warn!(
        "session.secret_key is missing or shorter than {} bytes. Session cookies will be invalidated every time the application is restarted.",
        MIN_SECRET_KEY_LEN
    );
    Key::from(random_string.as_bytes())
}

fn to_io_error<E: std::fmt::Display>(e: E) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}
