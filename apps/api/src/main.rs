mod billing;
mod config;
mod db;
mod errors;
mod models;
mod routes;
mod state;
mod webhooks;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::billing::store::PgBillingStore;
use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::routes::build_router;
use crate::state::AppState;
use crate::webhooks::processor::WebhookSettings;
use crate::webhooks::signature::SignatureVerifier;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Recruit API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    if config.run_migrations {
        run_migrations(&db).await?;
    }

    if config.payfast_passphrase.is_none() {
        warn!("PAYFAST_PASSPHRASE not set; verifying webhook signatures without a passphrase");
    }
    let webhooks = WebhookSettings {
        verifier: SignatureVerifier::new(config.payfast_passphrase.clone()),
        merchant_id: config.payfast_merchant_id.clone(),
    };

    // Build app state
    let state = AppState {
        store: Arc::new(PgBillingStore::new(db)),
        webhooks,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
