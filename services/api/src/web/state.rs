//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use cinelog_core::ports::ContentStore;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all
/// handlers. The store connection pool lives behind the `ContentStore` trait
/// object; nothing else is cached in-process, so every request re-reads
/// current state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    pub config: Arc<Config>,
}
