// GitHub API endpoint functions.
// Typed, cached accessors for the REST resources the dashboard displays.

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cache::{ResponseCache, Transport};
use crate::error::{DashError, Result};

use super::client::GitHubClient;
use super::types::{
    CommitActivityWeek, Contents, FileContent, Issue, Organization, PullRequest, RawEvent,
    Repository, SearchResults, User, UserSummary,
};

/// Number of events requested from the activity feed (the API maximum per page).
pub const EVENTS_PER_PAGE: u32 = 100;

/// Cached view of the GitHub REST API.
///
/// Every request URL (including its query string) is the cache key, so the
/// same resource requested with different parameters is cached separately.
pub struct GitHubApi<T = GitHubClient> {
    cache: Arc<ResponseCache<T>>,
    base_url: String,
}

impl<T> Clone for GitHubApi<T> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            base_url: self.base_url.clone(),
        }
    }
}

impl<T: Transport> GitHubApi<T> {
    pub fn new(cache: Arc<ResponseCache<T>>, base_url: impl Into<String>) -> Self {
        Self {
            cache,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn cache(&self) -> &ResponseCache<T> {
        &self.cache
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path given as raw segments, plus an optional
    /// query string.
    ///
    /// Each segment is percent-encoded, so a login or file name containing
    /// `/`, `?` or `#` cannot change which resource is requested.
    pub fn endpoint(&self, segments: &[&str], params: &[(&str, String)]) -> Result<String> {
        let invalid =
            |reason: String| DashError::Other(format!("invalid URL {}: {}", self.base_url, reason));

        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url.to_string())
    }

    async fn get_value(&self, url: &str) -> Result<Value> {
        Ok(self.cache.get(url).await?.data)
    }

    async fn get<D: DeserializeOwned>(&self, url: &str) -> Result<D> {
        Ok(self.cache.fetch_json(url, self.cache.default_ttl()).await?.data)
    }

    /// Like `get`, but a 404 becomes `None`.
    async fn get_optional<D: DeserializeOwned>(&self, url: &str) -> Result<Option<D>> {
        match self.get(url).await {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Get a user profile. `None` when the login does not exist.
    pub async fn user(&self, login: &str) -> Result<Option<User>> {
        self.get_optional(&self.endpoint(&["users", login], &[])?)
            .await
    }

    /// Get a user's public repositories, most recently updated first.
    pub async fn user_repos(&self, login: &str, per_page: u32) -> Result<Vec<Repository>> {
        let url = self.endpoint(
            &["users", login, "repos"],
            &[("per_page", per_page.to_string()), ("sort", "updated".into())],
        )?;
        self.get(&url).await
    }

    /// Get the raw public activity feed. Entries are left as JSON so a single
    /// malformed event cannot fail the whole page.
    pub async fn user_events(&self, login: &str) -> Result<Vec<Value>> {
        let url = self.endpoint(
            &["users", login, "events"],
            &[("per_page", EVENTS_PER_PAGE.to_string())],
        )?;
        self.get(&url).await
    }

    /// The newest `per_page` feed entries, decoded. Malformed entries are dropped.
    pub async fn recent_events(&self, login: &str, per_page: u32) -> Result<Vec<RawEvent>> {
        let url = self.endpoint(
            &["users", login, "events"],
            &[("per_page", per_page.to_string())],
        )?;
        Ok(RawEvent::parse_page(self.get(&url).await?))
    }

    pub async fn followers(&self, login: &str, per_page: u32) -> Result<Vec<UserSummary>> {
        let url = self.endpoint(
            &["users", login, "followers"],
            &[("per_page", per_page.to_string())],
        )?;
        self.get(&url).await
    }

    pub async fn following(&self, login: &str, per_page: u32) -> Result<Vec<UserSummary>> {
        let url = self.endpoint(
            &["users", login, "following"],
            &[("per_page", per_page.to_string())],
        )?;
        self.get(&url).await
    }

    pub async fn user_orgs(&self, login: &str) -> Result<Vec<Organization>> {
        self.get(&self.endpoint(&["users", login, "orgs"], &[])?)
            .await
    }

    /// Get a repository. `None` when it does not exist.
    pub async fn repo(&self, owner: &str, repo: &str) -> Result<Option<Repository>> {
        self.get_optional(&self.endpoint(&["repos", owner, repo], &[])?)
            .await
    }

    /// Bytes of code per language.
    pub async fn repo_languages(&self, owner: &str, repo: &str) -> Result<BTreeMap<String, u64>> {
        self.get(&self.endpoint(&["repos", owner, repo, "languages"], &[])?)
            .await
    }

    /// List a directory or fetch a file. An empty `path` is the repository root.
    pub async fn repo_contents(&self, owner: &str, repo: &str, path: &str) -> Result<Contents> {
        let mut segments = vec!["repos", owner, repo, "contents"];
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        if segments.len() == 4 {
            segments.push("");
        }
        let url = self.endpoint(&segments, &[])?;
        Ok(Contents::from_value(self.get_value(&url).await?)?)
    }

    /// The repository README. `None` when the repository has none.
    pub async fn readme(&self, owner: &str, repo: &str) -> Result<Option<FileContent>> {
        self.get_optional(&self.endpoint(&["repos", owner, repo, "readme"], &[])?)
            .await
    }

    /// Recent issues in any state, with pull requests filtered out.
    pub async fn repo_issues(&self, owner: &str, repo: &str, per_page: u32) -> Result<Vec<Issue>> {
        let url = self.endpoint(
            &["repos", owner, repo, "issues"],
            &[("state", "all".into()), ("per_page", per_page.to_string())],
        )?;
        let issues: Vec<Issue> = self.get(&url).await?;
        Ok(issues.into_iter().filter(|i| !i.is_pull_request()).collect())
    }

    /// Recent pull requests in any state.
    pub async fn repo_pulls(
        &self,
        owner: &str,
        repo: &str,
        per_page: u32,
    ) -> Result<Vec<PullRequest>> {
        let url = self.endpoint(
            &["repos", owner, repo, "pulls"],
            &[("state", "all".into()), ("per_page", per_page.to_string())],
        )?;
        self.get(&url).await
    }

    /// Weekly commit totals for the last year. GitHub answers `202 {}` while
    /// the statistics are still being computed; that reads as no data.
    pub async fn commit_activity(&self, owner: &str, repo: &str) -> Result<Vec<CommitActivityWeek>> {
        let url = self.endpoint(&["repos", owner, repo, "stats", "commit_activity"], &[])?;
        let value = self.get_value(&url).await?;
        if value.is_array() {
            Ok(serde_json::from_value(value)?)
        } else {
            Ok(Vec::new())
        }
    }

    pub async fn search_users(
        &self,
        query: &str,
        per_page: u32,
    ) -> Result<SearchResults<UserSummary>> {
        let url = self.endpoint(
            &["search", "users"],
            &[("q", query.to_string()), ("per_page", per_page.to_string())],
        )?;
        self.get(&url).await
    }

    pub async fn search_repositories(
        &self,
        query: &str,
        per_page: u32,
    ) -> Result<SearchResults<Repository>> {
        let url = self.endpoint(
            &["search", "repositories"],
            &[("q", query.to_string()), ("per_page", per_page.to_string())],
        )?;
        self.get(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::testing::{MockTransport, Reply};
    use serde_json::json;

    const BASE: &str = "https://api.test";

    fn api() -> GitHubApi<MockTransport> {
        GitHubApi::new(Arc::new(ResponseCache::new(MockTransport::new())), "https://api.test/")
    }

    fn respond(api: &GitHubApi<MockTransport>, url: &str, reply: Reply) {
        api.cache().transport().respond(url, reply);
    }

    #[test]
    fn test_endpoint_urls() {
        let api = api();
        assert_eq!(api.base_url(), BASE);
        assert_eq!(
            api.endpoint(&["users", "octocat"], &[]).unwrap(),
            "https://api.test/users/octocat"
        );
        assert_eq!(
            api.endpoint(&["search", "users"], &[("q", "tom cat".into())])
                .unwrap(),
            "https://api.test/search/users?q=tom+cat"
        );
    }

    #[test]
    fn test_endpoint_escapes_segments() {
        let api = api();
        assert_eq!(
            api.endpoint(&["users", "octo?cat#x"], &[]).unwrap(),
            "https://api.test/users/octo%3Fcat%23x"
        );
        assert_eq!(
            api.endpoint(&["repos", "o", "a/b"], &[]).unwrap(),
            "https://api.test/repos/o/a%2Fb"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let api = GitHubApi::new(
            Arc::new(ResponseCache::new(MockTransport::new())),
            "https://ghe.test/api/v3/",
        );
        assert_eq!(
            api.endpoint(&["users", "octocat"], &[]).unwrap(),
            "https://ghe.test/api/v3/users/octocat"
        );
    }

    #[tokio::test]
    async fn test_login_with_query_chars_stays_in_path() {
        let api = api();
        assert!(api.user("ghost?type=org").await.unwrap().is_none());
        assert_eq!(
            api.cache().transport().requested(),
            vec!["https://api.test/users/ghost%3Ftype=org".to_string()]
        );
    }

    #[tokio::test]
    async fn test_recent_events_skips_malformed() {
        let api = api();
        respond(
            &api,
            "https://api.test/users/octocat/events?per_page=10",
            Reply::Json(json!([
                {"id": "1", "type": "WatchEvent", "created_at": "2024-05-01T00:00:00Z",
                 "repo": {"name": "rust-lang/rust"}},
                {"type": "ForkEvent"}
            ])),
        );

        let events = api.recent_events("octocat", 10).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, "WatchEvent");
    }

    #[tokio::test]
    async fn test_user_not_found_is_none() {
        let api = api();
        assert!(api.user("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_user_is_cached() {
        let api = api();
        let url = "https://api.test/users/octocat";
        respond(&api, url, Reply::Json(json!({"id": 1, "login": "octocat", "followers": 9})));

        let user = api.user("octocat").await.unwrap().unwrap();
        assert_eq!(user.followers, 9);
        api.user("octocat").await.unwrap();
        assert_eq!(api.cache().transport().calls(url), 1);
    }

    #[tokio::test]
    async fn test_server_error_is_not_mapped_to_none() {
        let api = api();
        respond(&api, "https://api.test/users/octocat", Reply::Status(500));
        assert!(api.user("octocat").await.is_err());
    }

    #[tokio::test]
    async fn test_user_events_url() {
        let api = api();
        let url = "https://api.test/users/octocat/events?per_page=100";
        respond(&api, url, Reply::Json(json!([{"type": "WatchEvent"}])));

        let events = api.user_events("octocat").await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(api.cache().transport().requested(), vec![url.to_string()]);
    }

    #[tokio::test]
    async fn test_repo_issues_drop_pull_requests() {
        let api = api();
        respond(
            &api,
            "https://api.test/repos/o/r/issues?state=all&per_page=5",
            Reply::Json(json!([
                {"id": 1, "number": 1, "title": "bug", "state": "open",
                 "created_at": "2024-01-01T00:00:00Z"},
                {"id": 2, "number": 2, "title": "fix", "state": "closed",
                 "created_at": "2024-01-02T00:00:00Z", "pull_request": {"url": "x"}}
            ])),
        );

        let issues = api.repo_issues("o", "r", 5).await.unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].title, "bug");
    }

    #[tokio::test]
    async fn test_commit_activity_pending_is_empty() {
        let api = api();
        respond(
            &api,
            "https://api.test/repos/o/r/stats/commit_activity",
            Reply::Json(json!({})),
        );
        assert!(api.commit_activity("o", "r").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repo_contents_root_and_nested() {
        let api = api();
        respond(
            &api,
            "https://api.test/repos/o/r/contents/",
            Reply::Json(json!([{"name": "src", "path": "src", "sha": "1", "type": "dir"}])),
        );
        respond(
            &api,
            "https://api.test/repos/o/r/contents/src/lib.rs",
            Reply::Json(json!({"name": "lib.rs", "path": "src/lib.rs", "sha": "2",
                               "encoding": "base64", "content": ""})),
        );

        assert!(matches!(
            api.repo_contents("o", "r", "").await.unwrap(),
            Contents::Directory(_)
        ));
        assert!(matches!(
            api.repo_contents("o", "r", "/src/lib.rs").await.unwrap(),
            Contents::File(_)
        ));
    }

    #[tokio::test]
    async fn test_search_repositories() {
        let api = api();
        respond(
            &api,
            "https://api.test/search/repositories?q=ratatui&per_page=5",
            Reply::Json(json!({
                "total_count": 1,
                "incomplete_results": false,
                "items": [{
                    "id": 3, "name": "ratatui", "full_name": "ratatui/ratatui",
                    "owner": {"id": 4, "login": "ratatui", "type": "Organization"},
                    "stargazers_count": 10000, "updated_at": "2024-05-01T00:00:00Z"
                }]
            })),
        );

        let results = api.search_repositories("ratatui", 5).await.unwrap();
        assert_eq!(results.total_count, 1);
        assert_eq!(results.items[0].stargazers_count, 10000);
    }
}
