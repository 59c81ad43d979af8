//! Runtime configuration.
//!
//! All settings can be configured via environment variables:
//! - `WIKI_MAX_ANCESTRY_DEPTH`: Bound on parent-chain and descendant walks (default: 10000)
//! - `WIKI_SESSION_TTL_SECS`: Session lifetime in seconds (default: 86400)

/// Default bound on tree walks.
pub const DEFAULT_MAX_ANCESTRY_DEPTH: usize = 10_000;

/// Default session lifetime, matching the `user` cookie lifetime.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 86_400;

/// Configuration for the wiki core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiConfig {
    /// Maximum number of parent hops (and tree levels) a walk may visit
    /// before the chain is treated as corrupted.
    pub max_ancestry_depth: usize,
    /// Sessions older than this are no longer resolved.
    pub session_ttl_secs: u64,
}

impl WikiConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        Self {
            max_ancestry_depth: std::env::var("WIKI_MAX_ANCESTRY_DEPTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|d: &usize| *d > 0)
                .unwrap_or(DEFAULT_MAX_ANCESTRY_DEPTH),
            session_ttl_secs: std::env::var("WIKI_SESSION_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SESSION_TTL_SECS),
        }
    }

    /// Override the walk bound.
    pub fn with_max_ancestry_depth(mut self, depth: usize) -> Self {
        self.max_ancestry_depth = depth;
        self
    }

    /// Override the session lifetime.
    pub fn with_session_ttl_secs(mut self, secs: u64) -> Self {
        self.session_ttl_secs = secs;
        self
    }
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            max_ancestry_depth: DEFAULT_MAX_ANCESTRY_DEPTH,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
        }
    }
}
