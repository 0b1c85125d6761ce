// Contribution summaries.
// Runs the calendar and streak steps for one year and merges two years into one view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::calendar::{ContributionDay, ContributionWeek, DailyMap, build_daily_map, to_weeks};
use super::event::ActivityEvent;
use super::streak::compute_streaks;

/// Calendar plus totals and streaks for one or more years.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionSummary {
    pub weeks: Vec<ContributionWeek>,
    pub total_contributions: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
}

impl ContributionSummary {
    /// Summarize an already built daily map, with `today` anchoring the current streak.
    pub fn from_daily_map(daily: &DailyMap, today: chrono::NaiveDate) -> Self {
        let sorted: Vec<_> = daily.iter().map(|(&date, &count)| (date, count)).collect();
        let streaks = compute_streaks(&sorted, today);

        Self {
            weeks: to_weeks(daily),
            total_contributions: sorted.iter().map(|&(_, count)| u64::from(count)).sum(),
            current_streak: streaks.current,
            longest_streak: streaks.longest,
        }
    }

    /// Every day in chronological order.
    pub fn days(&self) -> impl Iterator<Item = &ContributionDay> {
        self.weeks.iter().flatten()
    }

    /// No contributions at all: the "no data" state rather than an error.
    pub fn is_empty(&self) -> bool {
        self.total_contributions == 0
    }
}

/// Build the summary for the year `years_ago` years before `now`.
pub fn summarize(events: &[ActivityEvent], years_ago: u32, now: DateTime<Utc>) -> ContributionSummary {
    let daily = build_daily_map(events, years_ago, now);
    ContributionSummary::from_daily_map(&daily, now.date_naive())
}

/// Merge two yearly summaries, prior year first. The current streak only
/// makes sense for the current year, so the prior year's is dropped.
pub fn combine_two_years(
    current: &ContributionSummary,
    prior: &ContributionSummary,
) -> ContributionSummary {
    let weeks = prior
        .weeks
        .iter()
        .chain(current.weeks.iter())
        .cloned()
        .collect();

    ContributionSummary {
        weeks,
        total_contributions: current.total_contributions + prior.total_contributions,
        current_streak: current.current_streak,
        longest_streak: current.longest_streak.max(prior.longest_streak),
    }
}
