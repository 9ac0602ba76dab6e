//! Application state management

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::{BearerIdentity, IdentityProvider};
use crate::config::Config;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    db: SqlitePool,
    identity: Box<dyn IdentityProvider>,
}

impl AppState {
    /// Create a new application state with the default identity adapter
    pub fn new(config: Config, db: SqlitePool) -> Self {
        Self::with_identity(config, db, Box::new(BearerIdentity))
    }

    /// Create application state with a specific identity adapter
    pub fn with_identity(
        config: Config,
        db: SqlitePool,
        identity: Box<dyn IdentityProvider>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                identity,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the database pool
    pub fn db(&self) -> &SqlitePool {
        &self.inner.db
    }

    /// Get the identity provider
    pub fn identity(&self) -> &dyn IdentityProvider {
        self.inner.identity.as_ref()
    }
}
