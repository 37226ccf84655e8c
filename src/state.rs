//! Application state management
//!
//! Contains shared state accessible across all handlers.

use crate::connection::ConnectionManager;
use crate::engine::SchemaEngine;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    /// Diff, apply and provisioning pipelines
    pub engine: SchemaEngine,

    /// Pools per application database
    pub connections: Arc<ConnectionManager>,
}

impl AppState {
    pub fn new(engine: SchemaEngine, connections: Arc<ConnectionManager>) -> Self {
        Self { engine, connections }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
