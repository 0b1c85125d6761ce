// Activity events and their contribution weights.
// Classifies raw feed entries into a closed set of kinds so weighting is exhaustive.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::github::RawEvent;

/// Kind-specific part of an activity event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Commits pushed; `size` is the commit count when the feed reports one.
    Push { size: Option<u64> },
    PullRequest { action: Option<String> },
    Issues { action: Option<String> },
    IssueComment,
    PullRequestReviewComment,
    CommitComment,
    /// Any other event type (stars, forks, releases, ...).
    Other(String),
}

impl EventKind {
    /// Classify a feed entry by its `type` tag and payload.
    pub fn classify(tag: &str, payload: &Value) -> Self {
        let action = || {
            payload
                .get("action")
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        match tag {
            "PushEvent" => EventKind::Push {
                size: payload.get("size").and_then(Value::as_u64),
            },
            "PullRequestEvent" => EventKind::PullRequest { action: action() },
            "IssuesEvent" => EventKind::Issues { action: action() },
            "IssueCommentEvent" => EventKind::IssueComment,
            "PullRequestReviewCommentEvent" => EventKind::PullRequestReviewComment,
            "CommitCommentEvent" => EventKind::CommitComment,
            other => EventKind::Other(other.to_string()),
        }
    }

    /// Contributions this event adds to its day.
    ///
    /// A push counts its commits, with a missing or zero size counting as one.
    /// Pull requests and issues count only when opened or closed.
    pub fn weight(&self) -> u32 {
        match self {
            EventKind::Push { size } => match size {
                Some(n) if *n > 0 => u32::try_from(*n).unwrap_or(u32::MAX),
                _ => 1,
            },
            EventKind::PullRequest { action } | EventKind::Issues { action } => {
                match action.as_deref() {
                    Some("opened") | Some("closed") => 1,
                    _ => 0,
                }
            }
            EventKind::IssueComment
            | EventKind::PullRequestReviewComment
            | EventKind::CommitComment => 1,
            EventKind::Other(_) => 0,
        }
    }
}

/// A user activity event reduced to what the aggregator needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEvent {
    pub kind: EventKind,
    pub created_at: DateTime<Utc>,
}

impl ActivityEvent {
    pub fn new(kind: EventKind, created_at: DateTime<Utc>) -> Self {
        Self { kind, created_at }
    }

    /// Calendar day (UTC) the event is attributed to.
    pub fn date(&self) -> NaiveDate {
        self.created_at.date_naive()
    }

    pub fn weight(&self) -> u32 {
        self.kind.weight()
    }
}

impl From<RawEvent> for ActivityEvent {
    fn from(raw: RawEvent) -> Self {
        Self {
            kind: EventKind::classify(&raw.kind, &raw.payload),
            created_at: raw.created_at,
        }
    }
}

/// Convert a raw feed page, skipping entries without a usable `type` or
/// `created_at` rather than failing the page.
pub fn parse_events(raw: Vec<Value>) -> Vec<ActivityEvent> {
    RawEvent::parse_page(raw)
        .into_iter()
        .map(ActivityEvent::from)
        .collect()
}
