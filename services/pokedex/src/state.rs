//! Application state shared across request handlers.

use std::sync::Arc;

use crate::creatures::{CreatureService, CreatureStore, Locale};

/// Shared application state.
///
/// This is passed to all request handlers via Axum's state extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    creatures: CreatureService,
}

impl AppState {
    /// Create a new application state over `store`.
    pub fn new(store: Arc<dyn CreatureStore>, locale: Locale) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                creatures: CreatureService::new(store, locale),
            }),
        }
    }

    /// Get the creature operations.
    pub fn creatures(&self) -> &CreatureService {
        &self.inner.creatures
    }

    /// Get the store backing the creature operations.
    pub fn store(&self) -> &Arc<dyn CreatureStore> {
        self.inner.creatures.store()
    }
}
