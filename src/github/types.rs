// GitHub API response types.
// Defines structs for deserializing the public GitHub REST API responses the dashboard reads.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Account type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OwnerType {
    #[default]
    User,
    Organization,
    Bot,
    #[serde(other)]
    Unknown,
}

/// Full user profile from `/users/{login}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub login: String,
    #[serde(rename = "type", default)]
    pub owner_type: OwnerType,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub html_url: Option<String>,
    pub company: Option<String>,
    pub blog: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub twitter_username: Option<String>,
    #[serde(default)]
    pub public_repos: u64,
    #[serde(default)]
    pub public_gists: u64,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub following: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Abbreviated account as it appears in lists, search hits, and nested objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: u64,
    pub login: String,
    #[serde(rename = "type", default)]
    pub owner_type: OwnerType,
    pub avatar_url: Option<String>,
    pub html_url: Option<String>,
}

/// Organization membership entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: u64,
    pub login: String,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
}

/// GitHub repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub owner: UserSummary,
    pub description: Option<String>,
    pub html_url: Option<String>,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub watchers_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    pub language: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub visibility: Option<String>,
    pub default_branch: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub pushed_at: Option<DateTime<Utc>>,
}

/// Entry type in a contents listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    File,
    Dir,
    Symlink,
    Submodule,
    #[serde(other)]
    Unknown,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub name: String,
    pub path: String,
    pub sha: String,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    #[serde(default)]
    pub size: u64,
    pub html_url: Option<String>,
    pub download_url: Option<String>,
}

/// A single file, with its body inlined (usually base64).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileContent {
    pub name: String,
    pub path: String,
    pub sha: String,
    #[serde(default)]
    pub size: u64,
    pub encoding: Option<String>,
    pub content: Option<String>,
    pub html_url: Option<String>,
    pub download_url: Option<String>,
}

/// Result of `/repos/{owner}/{repo}/contents/{path}`.
#[derive(Debug, Clone)]
pub enum Contents {
    Directory(Vec<ContentItem>),
    File(FileContent),
}

impl Contents {
    /// Directory listings are JSON arrays; anything else is a single file.
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        if value.is_array() {
            Ok(Contents::Directory(serde_json::from_value(value)?))
        } else {
            Ok(Contents::File(serde_json::from_value(value)?))
        }
    }
}

/// Issue or pull request state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub color: Option<String>,
}

/// Issue from `/repos/{owner}/{repo}/issues`. Pull requests also appear in
/// this listing and carry a `pull_request` object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub state: IssueState,
    pub user: Option<UserSummary>,
    pub html_url: Option<String>,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub labels: Vec<Label>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pull_request: Option<Value>,
}

impl Issue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// Pull request from `/repos/{owner}/{repo}/pulls`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub state: IssueState,
    pub user: Option<UserSummary>,
    pub html_url: Option<String>,
    #[serde(default)]
    pub draft: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    pub fn is_merged(&self) -> bool {
        self.merged_at.is_some()
    }
}

/// Search endpoint response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults<T> {
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    pub items: Vec<T>,
}

/// One week of `/stats/commit_activity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitActivityWeek {
    /// Commits per day, Sunday first.
    #[serde(default)]
    pub days: Vec<u64>,
    pub total: u64,
    /// Unix timestamp of the week's Sunday.
    pub week: i64,
}

impl CommitActivityWeek {
    pub fn week_start(&self) -> Option<NaiveDate> {
        DateTime::from_timestamp(self.week, 0).map(|dt| dt.date_naive())
    }
}

/// Repository reference inside an activity event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRepo {
    pub name: String,
}

/// Activity event as delivered by `/users/{login}/events`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub repo: Option<EventRepo>,
    #[serde(default)]
    pub payload: Value,
}

impl RawEvent {
    /// Decode a feed page, dropping entries that do not carry a `type` and
    /// `created_at` instead of failing the page.
    pub fn parse_page(raw: Vec<Value>) -> Vec<RawEvent> {
        raw.into_iter()
            .filter_map(|value| match serde_json::from_value::<RawEvent>(value) {
                Ok(event) => Some(event),
                Err(err) => {
                    debug!(error = %err, "skipping malformed event");
                    None
                }
            })
            .collect()
    }

    pub fn repo_name(&self) -> &str {
        self.repo.as_ref().map_or("", |r| r.name.as_str())
    }
}

/// Rate limit information from response headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimit {
    pub limit: Option<u64>,
    pub remaining: Option<u64>,
    pub reset: Option<u64>,
}

impl RateLimit {
    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }
}
