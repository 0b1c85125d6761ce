// GitHub API module.
// Provides the HTTP transport, typed endpoints, and response types for the public REST API.

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::GitHubClient;
pub use endpoints::GitHubApi;
pub use types::*;
