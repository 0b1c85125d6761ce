// Derived display values.
// Pure computations over fetched GitHub data that views render directly.

pub mod activity;
pub mod content;
pub mod languages;
pub mod repos;

pub use activity::{
    EventBadge, EventDescription, IssueTally, PullTally, WeeklyCommits, describe_event,
    recent_commit_activity, relative_time, tally_issues, tally_pulls,
};
pub use content::{breadcrumbs, decode_file, sort_listing};
pub use languages::{LanguageShare, format_bytes, language_breakdown, repo_language_counts};
pub use repos::{
    RepoFilter, RepoSort, RepoTotals, distinct_languages, filter_and_sort, top_by_forks,
    top_by_stars, totals,
};
