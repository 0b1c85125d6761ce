// Response cache module.
// Process-local memoization of GitHub API responses with stale-on-error fallback.

pub mod store;
pub mod transport;

pub use store::{CacheEntry, CacheSource, Cached, DEFAULT_TTL, ResponseCache};
pub use transport::Transport;
