//! Application state shared by every request handler.

use std::sync::Arc;
use std::time::Instant;

use crate::config::AppConfig;
use crate::pages::{PageDirectory, UnassignedPageDirectory};
use crate::registry::ClusterRegistry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,

    /// The cluster registry; the only owner of cluster state
    pub registry: Arc<ClusterRegistry>,

    /// Page-ownership lookups
    pub pages: Arc<dyn PageDirectory>,

    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            registry: Arc::new(ClusterRegistry::new()),
            pages: Arc::new(UnassignedPageDirectory),
            started_at: Instant::now(),
        }
    }

    /// Swap in a different page directory
    pub fn with_page_directory(mut self, pages: Arc<dyn PageDirectory>) -> Self {
        self.pages = pages;
        self
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
