//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::db::Store;

/// Application state shared across all handlers.
///
/// Generic over the persistence backend so the same router serves
/// [`PgStore`](crate::db::PgStore) in production and
/// [`MemoryStore`](crate::db::MemoryStore) in tests. Cloning is cheap.
pub struct AppState<S> {
    inner: Arc<AppStateInner<S>>,
}

struct AppStateInner<S> {
    config: StorefrontConfig,
    store: S,
}

// Manual impl: `S` itself need not be `Clone` for the `Arc` to be.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Store> AppState<S> {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig, store: S) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, store }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the data store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.inner.store
    }
}
