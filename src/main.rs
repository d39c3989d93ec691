// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session Gateway API Server
//!
//! Local and OAuth2 sign-in backed by Firestore, plus a cached Google
//! service-account token for spreadsheet access.

use session_gateway::{
    config::{Config, StorageBackend},
    db::{FirestoreDb, MemoryDb, ServiceTokenCache, SessionStore, UserDirectory},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Stores = (
    Arc<dyn UserDirectory>,
    Arc<dyn SessionStore>,
    Arc<dyn ServiceTokenCache>,
);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Session Gateway");

    let (users, sessions, token_cache) = open_stores(&config).await?;

    if config.service_account.is_none() {
        tracing::warn!("No service account configured; /auth/access is disabled");
    }

    let state = Arc::new(AppState::new(config.clone(), users, sessions, token_cache)?);

    // Build router
    let app = session_gateway::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn open_stores(config: &Config) -> anyhow::Result<Stores> {
    match config.storage_backend {
        StorageBackend::Firestore => {
            Ok(shared(FirestoreDb::new(&config.gcp_project_id).await?))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; all data is lost on restart");
            Ok(shared(MemoryDb::new()))
        }
    }
}

/// One backend serving all three stores.
fn shared<D>(db: D) -> Stores
where
    D: UserDirectory + SessionStore + ServiceTokenCache + 'static,
{
    let db = Arc::new(db);
    let users: Arc<dyn UserDirectory> = db.clone();
    let sessions: Arc<dyn SessionStore> = db.clone();
    let token_cache: Arc<dyn ServiceTokenCache> = db;
    (users, sessions, token_cache)
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("session_gateway=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
