// Issue, pull request, and commit activity tallies.
// Also renders feed events as one-line descriptions with relative timestamps.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::github::{CommitActivityWeek, Issue, IssueState, PullRequest, RawEvent};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IssueTally {
    pub open: usize,
    pub closed: usize,
}

pub fn tally_issues(issues: &[Issue]) -> IssueTally {
    let mut tally = IssueTally::default();
    for issue in issues.iter().filter(|i| !i.is_pull_request()) {
        match issue.state {
            IssueState::Open => tally.open += 1,
            IssueState::Closed => tally.closed += 1,
            IssueState::Unknown => {}
        }
    }
    tally
}

/// Pull request counts. `closed` excludes merged pull requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PullTally {
    pub open: usize,
    pub merged: usize,
    pub closed: usize,
}

pub fn tally_pulls(pulls: &[PullRequest]) -> PullTally {
    let mut tally = PullTally::default();
    for pull in pulls {
        if pull.is_merged() {
            tally.merged += 1;
        } else if pull.state == IssueState::Open {
            tally.open += 1;
        } else if pull.state == IssueState::Closed {
            tally.closed += 1;
        }
    }
    tally
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeeklyCommits {
    pub week_start: NaiveDate,
    pub commits: u64,
}

/// The most recent `weeks` entries of a commit activity series, oldest first.
pub fn recent_commit_activity(series: &[CommitActivityWeek], weeks: usize) -> Vec<WeeklyCommits> {
    let skip = series.len().saturating_sub(weeks);
    series[skip..]
        .iter()
        .filter_map(|week| {
            week.week_start().map(|week_start| WeeklyCommits {
                week_start,
                commits: week.total,
            })
        })
        .collect()
}

/// Category shown next to a feed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventBadge {
    Commit,
    PullRequest,
    Issue,
    Create,
    Delete,
    Comment,
    Star,
    Fork,
    Activity,
}

impl fmt::Display for EventBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EventBadge::Commit => "Commit",
            EventBadge::PullRequest => "PR",
            EventBadge::Issue => "Issue",
            EventBadge::Create => "Create",
            EventBadge::Delete => "Delete",
            EventBadge::Comment => "Comment",
            EventBadge::Star => "Star",
            EventBadge::Fork => "Fork",
            EventBadge::Activity => "Activity",
        };
        f.write_str(label)
    }
}

/// One feed entry ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventDescription {
    pub title: String,
    pub repo: String,
    pub badge: EventBadge,
}

fn text<'a>(payload: &'a Value, pointer: &str) -> &'a str {
    payload.pointer(pointer).and_then(Value::as_str).unwrap_or("")
}

fn number(payload: &Value, pointer: &str) -> u64 {
    payload.pointer(pointer).and_then(Value::as_u64).unwrap_or(0)
}

fn plural(count: u64, unit: &str) -> String {
    if count == 1 {
        format!("{} {}", count, unit)
    } else {
        format!("{} {}s", count, unit)
    }
}

/// Title and badge for a feed event. Unknown types fall back to the type
/// name without its `Event` suffix.
pub fn describe_event(event: &RawEvent) -> EventDescription {
    let payload = &event.payload;
    let (title, badge) = match event.kind.as_str() {
        "PushEvent" => {
            let commits = plural(number(payload, "/size"), "commit");
            let branch = text(payload, "/ref").trim_start_matches("refs/heads/");
            let title = if branch.is_empty() {
                format!("Pushed {}", commits)
            } else {
                format!("Pushed {} to {}", commits, branch)
            };
            (title, EventBadge::Commit)
        }
        "PullRequestEvent" => {
            let action = match text(payload, "/action") {
                "opened" => "Opened",
                "closed" if payload.pointer("/pull_request/merged") == Some(&Value::Bool(true)) => {
                    "Merged"
                }
                "closed" => "Closed",
                other => other,
            };
            let title = format!(
                "{} pull request #{}: {}",
                action,
                number(payload, "/number"),
                text(payload, "/pull_request/title")
            );
            (title, EventBadge::PullRequest)
        }
        "IssuesEvent" => {
            let action = match text(payload, "/action") {
                "opened" => "Opened",
                other => other,
            };
            let title = format!(
                "{} issue #{}: {}",
                action,
                number(payload, "/issue/number"),
                text(payload, "/issue/title")
            );
            (title, EventBadge::Issue)
        }
        "CreateEvent" => {
            let reference = text(payload, "/ref");
            let title = if reference.is_empty() {
                format!("Created {}", text(payload, "/ref_type"))
            } else {
                format!("Created {} {}", text(payload, "/ref_type"), reference)
            };
            (title, EventBadge::Create)
        }
        "DeleteEvent" => (
            format!(
                "Deleted {} {}",
                text(payload, "/ref_type"),
                text(payload, "/ref")
            ),
            EventBadge::Delete,
        ),
        "IssueCommentEvent" => (
            format!(
                "Commented on issue #{}: {}",
                number(payload, "/issue/number"),
                text(payload, "/issue/title")
            ),
            EventBadge::Comment,
        ),
        "WatchEvent" => ("Starred repository".to_string(), EventBadge::Star),
        "ForkEvent" => ("Forked repository".to_string(), EventBadge::Fork),
        other => (other.replace("Event", ""), EventBadge::Activity),
    };

    EventDescription {
        title,
        repo: event.repo_name().to_string(),
        badge,
    }
}

/// Coarse age of `at` relative to `now`: seconds, minutes, hours, days, then
/// 30-day months. Timestamps in the future read as zero seconds.
pub fn relative_time(now: DateTime<Utc>, at: DateTime<Utc>) -> String {
    let seconds = u64::try_from(now.signed_duration_since(at).num_seconds()).unwrap_or(0);
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    let age = if seconds < 60 {
        plural(seconds, "second")
    } else if minutes < 60 {
        plural(minutes, "minute")
    } else if hours < 24 {
        plural(hours, "hour")
    } else if days < 30 {
        plural(days, "day")
    } else {
        plural(days / 30, "month")
    };
    format!("{} ago", age)
}
