// ghdash: data core for a GitHub profile dashboard.
// Cached access to the public REST API plus contribution calendar and streak aggregation.

pub mod cache;
pub mod config;
pub mod contributions;
pub mod error;
pub mod github;
pub mod insights;
pub mod logging;

use std::sync::Arc;

pub use cache::{CacheSource, Cached, DEFAULT_TTL, ResponseCache, Transport};
pub use config::Config;
pub use error::{DashError, Result};
pub use github::{GitHubApi, GitHubClient};

/// Wire up the HTTP client, a cache configured from `config`, and the API facade.
pub fn connect(config: &Config) -> Result<GitHubApi<GitHubClient>> {
    let client = GitHubClient::new(config)?;

    let mut cache = ResponseCache::new(client).with_default_ttl(config.ttl());
    if let Some(capacity) = config.cache_capacity {
        cache = cache.with_capacity_limit(capacity);
    }

    Ok(GitHubApi::new(Arc::new(cache), config.api_base_url.clone()))
}
