// Contribution aggregation module.
// Turns the public activity feed into heat-map calendars and streak statistics.

pub mod calendar;
pub mod event;
pub mod streak;
pub mod summary;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use tracing::info;

use crate::cache::Transport;
use crate::error::{DashError, Result};
use crate::github::GitHubApi;

pub use calendar::{
    ContributionDay, ContributionWeek, DailyMap, build_daily_map, level_for, to_weeks, year_range,
};
pub use event::{ActivityEvent, EventKind, parse_events};
pub use streak::{Streaks, compute_streaks};
pub use summary::{ContributionSummary, combine_two_years, summarize};

/// Which year(s) of the calendar to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YearView {
    #[default]
    Current,
    Previous,
    Both,
}

impl FromStr for YearView {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "current" => Ok(YearView::Current),
            "previous" => Ok(YearView::Previous),
            "both" => Ok(YearView::Both),
            other => Err(DashError::Other(format!(
                "unknown year view '{}', expected current, previous, or both",
                other
            ))),
        }
    }
}

impl fmt::Display for YearView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            YearView::Current => "current",
            YearView::Previous => "previous",
            YearView::Both => "both",
        };
        f.write_str(name)
    }
}

/// Summaries for the current and previous calendar years.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionReport {
    pub username: String,
    pub current: ContributionSummary,
    pub previous: ContributionSummary,
}

impl ContributionReport {
    pub fn view(&self, view: YearView) -> ContributionSummary {
        match view {
            YearView::Current => self.current.clone(),
            YearView::Previous => self.previous.clone(),
            YearView::Both => combine_two_years(&self.current, &self.previous),
        }
    }
}

/// Events from the user's feed that fall in the year `years_ago` years before `now`.
pub async fn events_for_year<T: Transport>(
    api: &GitHubApi<T>,
    username: &str,
    years_ago: u32,
    now: DateTime<Utc>,
) -> Result<Vec<ActivityEvent>> {
    let Some((start, _)) = year_range(years_ago, now) else {
        return Ok(Vec::new());
    };
    let raw = api.user_events(username).await?;
    Ok(parse_events(raw)
        .into_iter()
        .filter(|event| event.created_at.year() == start.year())
        .collect())
}

/// Fetch both years of activity concurrently and aggregate them.
///
/// Aggregation starts only once both fetches have completed; if either fails
/// the error is returned and no partial calendar is produced.
pub async fn fetch_contributions<T: Transport>(
    api: &GitHubApi<T>,
    username: &str,
    now: DateTime<Utc>,
) -> Result<ContributionReport> {
    let (current_events, previous_events) = tokio::try_join!(
        events_for_year(api, username, 0, now),
        events_for_year(api, username, 1, now),
    )?;

    let current = summarize(&current_events, 0, now);
    let previous = summarize(&previous_events, 1, now);

    info!(
        username,
        current_total = current.total_contributions,
        previous_total = previous.total_contributions,
        current_streak = current.current_streak,
        "aggregated contributions"
    );

    Ok(ContributionReport {
        username: username.to_string(),
        current,
        previous,
    })
}
