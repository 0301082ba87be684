//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use life_calendar_core::ports::{DatabaseService, NarrativeService};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
/// The narrative backend is an injected service reference here, never a
/// process-wide singleton, so handlers stay testable in isolation.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub narrative: Arc<dyn NarrativeService>,
    pub config: Arc<Config>,
}
