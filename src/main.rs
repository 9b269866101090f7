mod chat_hub;
mod config;
mod db;
mod embed;
mod error;
mod middleware;
mod models;
mod routes;
mod services;
mod utils;
mod websocket_chat;

use actix_cors::Cors;
use actix_web::{
    http::header,
    middleware::{Compress, Logger, NormalizePath},
    web, App, HttpResponse, HttpServer,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::chat_hub::ChatHub;
use crate::config::Config;
use crate::db::Database;
use crate::embed::cache::EmbedCache;
use crate::routes::create_routes;
use crate::utils::rate_limit::IpRateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub embed_cache: Arc<EmbedCache>,
    pub chat_hub: ChatHub,
    pub chat_rate_limiter: Arc<IpRateLimiter>,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Starting Reachpoint backend");

    let config = Config::from_env()?;
    info!("Configuration loaded from environment");

    let db = Database::new(&config.database_url).await?;
    info!("Database connected");

    db.run_migrations().await?;
    info!("Database migrations completed");

    let redis = if config.enable_redis {
        let redis_config = deadpool_redis::Config::from_url(&config.redis_url);
        let pool = redis_config.create_pool(Some(deadpool_redis::Runtime::Tokio1))?;
        info!("Redis connected");
        Some(pool)
    } else {
        None
    };

    let embed_cache = Arc::new(EmbedCache::new(redis, config.embed_cache_ttl));
    let chat_rate_limiter = Arc::new(IpRateLimiter::per_minute(
        config.chat_rate_limit_per_minute,
    ));

    let config = Arc::new(config);
    let state = web::Data::new(AppState {
        db: db.clone(),
        config: config.clone(),
        embed_cache,
        chat_hub: ChatHub::new(),
        chat_rate_limiter,
    });

    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));
    let cors_allow_origin = config.cors_allow_origin.clone();

    info!("Server running at http://{}", addr);

    HttpServer::new(move || {
        // The embed script and chat endpoints are called from arbitrary
        // third-party origins, so the default is wide open; dashboards can
        // pin a comma-separated origin list instead.
        let cors = if cors_allow_origin == "*" {
            Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600)
        } else {
            let origins: Vec<&str> = cors_allow_origin.split(',').map(|s| s.trim()).collect();
            let mut cors = Cors::default();
            for origin in origins {
                cors = cors.allowed_origin(origin);
            }
            cors.allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "PATCH", "OPTIONS"])
                .allowed_headers(vec![
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    header::ACCEPT,
                ])
                .max_age(3600)
        };

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(Compress::default())
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            // Health checks
            .route("/health", web::get().to(health_check))
            .route("/health/db", web::get().to(health_check_db))
            // Public app config
            .route("/api/config", web::get().to(get_app_config))
            // Embeddable widget runtime
            .route(
                "/embed/{widget_id}.js",
                web::get().to(routes::embed::get_embed_script),
            )
            // Live chat WebSocket
            .route(
                "/api/ws/chat",
                web::get().to(websocket_chat::websocket_chat_handler),
            )
            // API routes
            .service(web::scope("/api/v1").configure(create_routes))
    })
    .keep_alive(actix_web::http::KeepAlive::Timeout(
        std::time::Duration::from_secs(75),
    ))
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": true }))
}

async fn health_check_db(
    state: web::Data<AppState>,
) -> Result<HttpResponse, crate::error::AppError> {
    sqlx::query("SELECT 1")
        .execute(state.db.pool())
        .await
        .map_err(crate::error::AppError::Database)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": true })))
}

async fn get_app_config(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "name": "Reachpoint",
        "version": env!("CARGO_PKG_VERSION"),
        "features": {
            "live_chat": true,
            "blog": true,
            "credits": true,
        },
        "public_base_url": state.config.public_base_url,
    }))
}
