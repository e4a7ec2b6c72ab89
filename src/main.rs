use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qbo_sync_rs::config::Config;
use qbo_sync_rs::db;
use qbo_sync_rs::qbo::QboClient;
use qbo_sync_rs::repos::{PgCompanyConfigStore, PgCredentialStore, PgRecordStore};
use qbo_sync_rs::routes;
use qbo_sync_rs::services::sync_service::SyncEngine;
use qbo_sync_rs::services::token_service::TokenManager;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,qbo_sync_rs=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Config::from_env()?;
    tracing::info!("config loaded");

    let pool = db::create_pool(&cfg.database_url).await?;
    db::run_migrations(&pool).await?;
    tracing::info!("db connected + migrations applied");

    let qbo = Arc::new(QboClient::from_env()?);
    tracing::info!(sandbox = qbo.config().sandbox, "QuickBooks client ready");

    let credentials = Arc::new(PgCredentialStore::new(pool.clone()));
    let records = Arc::new(PgRecordStore::new(pool.clone()));
    let configs = Arc::new(PgCompanyConfigStore::new(pool.clone()));

    let tokens = Arc::new(TokenManager::new(Arc::clone(&qbo), credentials));
    Arc::clone(&tokens).spawn_refresh_loop();

    let engine = Arc::new(SyncEngine::new(qbo, tokens, records, configs));

    let health_state = Arc::new(routes::health::HealthState { db: pool });

    let app = Router::new()
        .route("/health/live", get(routes::health::health_live))
        .route("/health/ready", get(routes::health::health_ready))
        .with_state(health_state)
        .merge(routes::sync::sync_router(engine))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", cfg.host, cfg.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
