//! Service state management.
//!
//! Holds the wiki core shared by every handler.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::WikiConfig;
use crate::store::postgres::PoolStats;
use crate::store::{InMemoryWikiStore, PostgresWikiStore, WikiStore};
use crate::wiki::Wiki;

/// Health reporting for the backend behind the service.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    /// Whether the backend answers queries.
    async fn is_healthy(&self) -> bool;

    /// Connection pool statistics, if the backend pools connections.
    fn pool_stats(&self) -> Option<PoolStats>;
}

#[async_trait]
impl StoreHealth for PostgresWikiStore {
    async fn is_healthy(&self) -> bool {
        PostgresWikiStore::is_healthy(self).await
    }

    fn pool_stats(&self) -> Option<PoolStats> {
        Some(PostgresWikiStore::pool_stats(self))
    }
}

#[async_trait]
impl StoreHealth for InMemoryWikiStore {
    async fn is_healthy(&self) -> bool {
        true
    }

    fn pool_stats(&self) -> Option<PoolStats> {
        None
    }
}

/// Shared service state.
pub struct ServiceState<S: WikiStore + 'static> {
    /// The wiki core.
    pub wiki: Wiki<S>,
    /// The backend, for health probes.
    pub store: Arc<S>,
}

impl<S: WikiStore + 'static> ServiceState<S> {
    /// Create service state over a backend.
    pub fn new(store: S, config: WikiConfig) -> Self {
        let store = Arc::new(store);
        Self {
            wiki: Wiki::new(Arc::clone(&store), config),
            store,
        }
    }

    /// Create service state with configuration read from the environment.
    pub fn from_env(store: S) -> Self {
        let config = WikiConfig::from_env();
        tracing::info!(
            max_ancestry_depth = config.max_ancestry_depth,
            session_ttl_secs = config.session_ttl_secs,
            "Wiki configuration loaded"
        );
        Self::new(store, config)
    }
}

impl<S: WikiStore + 'static> Clone for ServiceState<S> {
    fn clone(&self) -> Self {
        Self {
            wiki: self.wiki.clone(),
            store: Arc::clone(&self.store),
        }
    }
}
