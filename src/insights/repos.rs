// Repository list views.
// Filtering, ordering, and totals over a user's repositories.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::DashError;
use crate::github::Repository;

/// Ordering for repository lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepoSort {
    #[default]
    Stars,
    Updated,
    Name,
}

impl FromStr for RepoSort {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stars" => Ok(RepoSort::Stars),
            "updated" => Ok(RepoSort::Updated),
            "name" => Ok(RepoSort::Name),
            other => Err(DashError::Other(format!(
                "unknown sort '{}', expected stars, updated, or name",
                other
            ))),
        }
    }
}

impl fmt::Display for RepoSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RepoSort::Stars => "stars",
            RepoSort::Updated => "updated",
            RepoSort::Name => "name",
        })
    }
}

impl RepoSort {
    fn compare(&self, a: &Repository, b: &Repository) -> Ordering {
        match self {
            RepoSort::Stars => b.stargazers_count.cmp(&a.stargazers_count),
            RepoSort::Updated => b.updated_at.cmp(&a.updated_at),
            RepoSort::Name => a
                .name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name)),
        }
    }
}

/// Repository list filter. The default matches everything.
#[derive(Debug, Clone)]
pub struct RepoFilter {
    /// Case-insensitive text matched against name, description, and topics.
    pub query: String,
    /// Exact primary language.
    pub language: Option<String>,
    pub include_forks: bool,
    pub include_archived: bool,
}

impl Default for RepoFilter {
    fn default() -> Self {
        Self {
            query: String::new(),
            language: None,
            include_forks: true,
            include_archived: true,
        }
    }
}

impl RepoFilter {
    pub fn matches(&self, repo: &Repository) -> bool {
        let needle = self.query.to_lowercase();
        let matches_query = needle.is_empty()
            || repo.name.to_lowercase().contains(&needle)
            || repo
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
            || repo
                .topics
                .iter()
                .any(|t| t.to_lowercase().contains(&needle));

        let matches_language = match &self.language {
            Some(language) => repo.language.as_deref() == Some(language.as_str()),
            None => true,
        };

        matches_query
            && matches_language
            && (self.include_forks || !repo.fork)
            && (self.include_archived || !repo.archived)
    }
}

/// Apply `filter` and order the survivors by `sort`.
pub fn filter_and_sort<'a>(
    repos: &'a [Repository],
    filter: &RepoFilter,
    sort: RepoSort,
) -> Vec<&'a Repository> {
    let mut selected: Vec<&Repository> = repos.iter().filter(|r| filter.matches(r)).collect();
    selected.sort_by(|a, b| sort.compare(a, b));
    selected
}

/// Distinct primary languages in first-seen order.
pub fn distinct_languages(repos: &[Repository]) -> Vec<String> {
    let mut languages: Vec<String> = Vec::new();
    for language in repos.iter().filter_map(|r| r.language.as_ref()) {
        if !languages.contains(language) {
            languages.push(language.clone());
        }
    }
    languages
}

pub fn top_by_stars(repos: &[Repository], limit: usize) -> Vec<&Repository> {
    let mut sorted: Vec<&Repository> = repos.iter().collect();
    sorted.sort_by(|a, b| b.stargazers_count.cmp(&a.stargazers_count));
    sorted.truncate(limit);
    sorted
}

pub fn top_by_forks(repos: &[Repository], limit: usize) -> Vec<&Repository> {
    let mut sorted: Vec<&Repository> = repos.iter().collect();
    sorted.sort_by(|a, b| b.forks_count.cmp(&a.forks_count));
    sorted.truncate(limit);
    sorted
}

/// Star and fork totals across repositories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepoTotals {
    pub stars: u64,
    pub forks: u64,
}

pub fn totals(repos: &[Repository]) -> RepoTotals {
    repos.iter().fold(RepoTotals::default(), |acc, r| RepoTotals {
        stars: acc.stars + r.stargazers_count,
        forks: acc.forks + r.forks_count,
    })
}
