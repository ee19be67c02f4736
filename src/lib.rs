//! Expertise server - expert review of work programs
//!
//! Serves the expertise workflow: opening a review for a work program,
//! assigning experts, collecting comments per review block and tracking
//! review status, with visibility scoped by the requester's roles.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod models;
pub mod permissions;
pub mod scope;
pub mod store;

use sqlx::SqlitePool;
use std::sync::Arc;

/// Application state shared across handlers
pub struct AppState {
    pub store: store::Store,
}

impl AppState {
    pub fn new(pool: SqlitePool) -> Arc<Self> {
        Arc::new(Self {
            store: store::Store::new(pool),
        })
    }
}
