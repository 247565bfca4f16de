//! Shared application state and the pure domain logic it coordinates.

pub mod answer;
pub mod room;
mod sse;

use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use crate::{catalog::CatalogClient, config::AppConfig, dao::room_store::RoomStore};

pub use self::sse::SseHub;

/// Cheaply clonable handle to the central application state.
pub type SharedState = Arc<AppState>;

/// Central application state shared by routes, services, and background loops.
pub struct AppState {
    config: AppConfig,
    store: Arc<dyn RoomStore>,
    catalog: CatalogClient,
    sse: SseHub,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig, store: Arc<dyn RoomStore>, catalog: CatalogClient) -> SharedState {
        Arc::new(Self {
            config,
            store,
            catalog,
            sse: SseHub::new(16),
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Handle to the shared room store.
    pub fn store(&self) -> Arc<dyn RoomStore> {
        Arc::clone(&self.store)
    }

    /// Catalog fetch collaborator.
    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    /// Broadcast hub feeding the room SSE stream.
    pub fn room_sse(&self) -> &SseHub {
        &self.sse
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default()
}
