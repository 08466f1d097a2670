#[cfg(feature = "server")]
use actix_cors::Cors;
#[cfg(feature = "server")]
use actix_files::Files;
#[cfg(feature = "server")]
use actix_governor::{Governor, GovernorConfigBuilder, SmartIpKeyExtractor};
#[cfg(feature = "server")]
use actix_web::http::{Method, header};
#[cfg(feature = "server")]
use actix_web::middleware::{Compress, Logger, from_fn};
#[cfg(feature = "server")]
use actix_web::{App, HttpServer, web};
#[cfg(feature = "server")]
use tera::Tera;

#[cfg(feature = "server")]
use crate::middleware::{
    rate_limit_response, rate_limited_methods, replenish_period, security_headers,
};
#[cfg(feature = "server")]
use crate::models::config::ServerConfig;
#[cfg(feature = "server")]
use crate::notifications::NotificationHub;
#[cfg(feature = "server")]
use crate::profile_requests::ProfileRequestStore;
#[cfg(feature = "server")]
use crate::repository::DieselRepository;
#[cfg(feature = "server")]
use crate::routes::health::{ServerStartedAt, health};
#[cfg(feature = "server")]
use crate::routes::ws::socket;
#[cfg(feature = "server")]
use crate::routes::{configure_api, json_config, not_found, query_config};
#[cfg(feature = "server")]
use crate::services::auth::{JwtKeys, ensure_superadmin};

#[cfg(feature = "data")]
pub mod db;
#[cfg(feature = "data")]
pub mod domain;
#[cfg(feature = "server")]
pub mod dto;
#[cfg(feature = "server")]
pub mod forms;
#[cfg(feature = "server")]
pub mod middleware;
#[cfg(feature = "data")]
pub mod models;
#[cfg(feature = "server")]
pub mod notifications;
#[cfg(feature = "server")]
pub mod profile_requests;
#[cfg(feature = "data")]
pub mod repository;
#[cfg(feature = "server")]
pub mod routes;
#[cfg(feature = "data")]
pub mod schema;
#[cfg(feature = "server")]
pub mod services;

#[cfg(feature = "server")]
fn cors(origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allowed_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allowed_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .supports_credentials()
        .max_age(3600);
    origins
        .iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
}

/// Builds and runs the Actix-Web HTTP server using the provided configuration.
#[cfg(feature = "server")]
pub async fn run(server_config: ServerConfig) -> std::io::Result<()> {
    // Establish Diesel connection pool for the SQLite database.
    let pool = db::establish_connection_pool(&server_config.database_url).map_err(|e| {
        std::io::Error::other(format!("Failed to establish database connection: {e}"))
    })?;
    db::run_migrations(&pool)
        .map_err(|e| std::io::Error::other(format!("Failed to run migrations: {e}")))?;

    let repo = DieselRepository::new(pool);
    ensure_superadmin(&repo, &server_config.superadmin)
        .map_err(|e| std::io::Error::other(format!("Failed to provision superadmin: {e}")))?;

    let keys = web::Data::new(JwtKeys::from_config(&server_config));
    let hub = web::Data::new(NotificationHub::new());
    let store = web::Data::new(ProfileRequestStore::new());
    let started_at = ServerStartedAt::now();

    let tera = Tera::new(&server_config.templates_dir)
        .map_err(|e| std::io::Error::other(format!("Template parsing error(s): {e}")))?;

    // One limiter shared by every worker, keyed on the forwarded or peer IP.
    let rate_limit = GovernorConfigBuilder::default()
        .key_extractor(SmartIpKeyExtractor)
        .period(replenish_period(&server_config.rate_limit))
        .burst_size(server_config.rate_limit.max_requests)
        .methods(rate_limited_methods())
        .finish()
        .ok_or_else(|| std::io::Error::other("Invalid rate limit configuration"))?;

    let bind_address = (server_config.address.clone(), server_config.port);
    log::info!("Listening on {}:{}", bind_address.0, bind_address.1);

    HttpServer::new(move || {
        let mut app = App::new()
            .wrap(cors(&server_config.cors_origins))
            .wrap(security_headers())
            .wrap(Compress::default())
            .wrap(Logger::default())
            .app_data(json_config())
            .app_data(query_config())
            .app_data(web::Data::new(tera.clone()))
            .app_data(web::Data::new(repo.clone()))
            .app_data(web::Data::new(server_config.clone()))
            .app_data(web::Data::new(started_at))
            .app_data(keys.clone())
            .app_data(hub.clone())
            .app_data(store.clone())
            .service(health)
            .service(socket)
            .service(
                web::scope("/api")
                    .wrap(Governor::new(&rate_limit))
                    .wrap(from_fn(rate_limit_response))
                    .configure(configure_api),
            );
        if let Some(static_dir) = &server_config.static_dir {
            app = app.service(Files::new("/", static_dir).index_file("index.html"));
        }
        app.default_service(web::to(not_found))
    })
    .bind(bind_address)?
    .run()
    .await
}
