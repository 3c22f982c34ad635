//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::config::Config;
use crate::entities::AnyStore;
use crate::events::EventBus;
use crate::services::MarketAppService;

/// State shared across all HTTP handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<Config>,
    /// Relational store holding apps and marketplace listings.
    pub store: Arc<AnyStore>,
    /// Sink for "app created" and similar notifications.
    pub events: EventBus,
}

impl AppState {
    pub fn market(&self) -> MarketAppService<'_> {
        MarketAppService::new(&self.store, &self.events)
    }
}
