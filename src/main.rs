// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Kaiwa Tutor API Server
//!
//! Serves the guarded app shell and the JSON API in front of Supabase.

use kaiwa_tutor::{
    config::{Config, DataBackend},
    db::{Backend, MemoryDb, SupabaseDb},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        backend = ?config.data_backend,
        "Starting Kaiwa Tutor API"
    );

    let db: Arc<dyn Backend> = match config.data_backend {
        DataBackend::Supabase => Arc::new(SupabaseDb::new(
            &config.supabase_url,
            &config.supabase_service_key,
        )?),
        DataBackend::Memory => {
            tracing::warn!("Using in-memory backend; data is lost on restart");
            Arc::new(MemoryDb::new())
        }
    };

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db));

    // Build router
    let app = kaiwa_tutor::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("kaiwa_tutor=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
