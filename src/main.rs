//! Sprout schema service
//!
//! Keeps application databases in step with their model definitions:
//! creates databases, schemas and tables, detects drift between a live table
//! and its model, and generates (and optionally applies) the upgrade and
//! downgrade SQL that closes the gap.

mod config;
mod connection;
mod db;
mod engine;
mod error;
mod introspection;
mod migration;
mod models;
mod orm;
mod routes;
mod snapshot;
mod state;

use crate::config::Settings;
use crate::connection::ConnectionManager;
use crate::db::PgBackend;
use crate::engine::SchemaEngine;
use crate::orm::ModelRegistry;
use crate::routes::create_router;
use crate::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting Sprout schema service...");

    let settings = Settings::load()?;
    info!(
        "Configuration loaded (database server {}:{}, exclude_identity={}, strict_catalog={})",
        settings.database.host, settings.database.port, settings.diff.exclude_identity, settings.diff.strict_catalog
    );

    let registry = load_models(&settings)?;
    info!("{} model(s) registered", registry.len());

    let connections = Arc::new(ConnectionManager::new(settings.database.clone()));
    let backend = Arc::new(PgBackend::new(connections.clone()));

    // Pools connect lazily; an unreachable server only fails requests.
    if let Err(e) = backend.connections().test_connection().await {
        warn!("Database server not reachable at startup: {}", e);
    }

    let engine = SchemaEngine::new(backend.clone(), backend, Arc::new(registry), settings.diff.clone())
        .with_maintenance_database(connections.maintenance_database());
    let state = Arc::new(AppState::new(engine, connections));

    let app = create_router(state, &settings);
    let addr = SocketAddr::from((settings.server.host, settings.server.port));

    info!("Server listening on http://{}", addr);
    info!("   GET  /table/diff?appname&schema&table  - Diff a table against its model");
    info!("   GET  /schema/info?appname&schema       - Columns and foreign keys of a schema");
    info!("   POST /migration/upgrade|downgrade      - Diff and apply one direction");
    info!("   POST /migration/apply                  - Apply a statement body");
    info!("   POST /db/create|schemas|init           - Provision an application database");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Built-in models plus the optional model file
fn load_models(settings: &Settings) -> anyhow::Result<ModelRegistry> {
    let mut registry = ModelRegistry::with_builtin();
    if let Some(path) = &settings.models_path {
        let count = registry.load_file(path)?;
        info!("Loaded {} model(s) from {}", count, path);
    }
    Ok(registry)
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sprout_migrate=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        },
    }
}
