// Contribution calendar construction.
// Buckets weighted events into a dense per-day map and splits it into Sunday-started weeks.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

use super::event::ActivityEvent;

/// Dense day → contribution count map, ordered by date.
pub type DailyMap = BTreeMap<NaiveDate, u32>;

/// One cell of the heat map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionDay {
    pub date: NaiveDate,
    pub count: u32,
    pub level: u8,
}

impl ContributionDay {
    pub fn new(date: NaiveDate, count: u32) -> Self {
        Self {
            date,
            count,
            level: level_for(count),
        }
    }
}

/// One to seven consecutive days starting on a Sunday (except possibly the first week).
pub type ContributionWeek = Vec<ContributionDay>;

/// Heat-map intensity for a day's count.
pub fn level_for(count: u32) -> u8 {
    match count {
        0 => 0,
        1..=3 => 1,
        4..=8 => 2,
        9..=15 => 3,
        _ => 4,
    }
}

/// First and last day covered for the year `years_ago` years before `now`.
/// The current year ends today; earlier years end on December 31.
pub fn year_range(years_ago: u32, now: DateTime<Utc>) -> Option<(NaiveDate, NaiveDate)> {
    let year = now.year() - i32::try_from(years_ago).ok()?;
    let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let end = if years_ago == 0 {
        now.date_naive()
    } else {
        NaiveDate::from_ymd_opt(year, 12, 31)?
    };
    Some((start, end))
}

/// Build the per-day contribution map for one year.
///
/// Every day in the range starts at zero; each event dated inside the range
/// adds its weight. Events outside the range are ignored.
pub fn build_daily_map(events: &[ActivityEvent], years_ago: u32, now: DateTime<Utc>) -> DailyMap {
    let Some((start, end)) = year_range(years_ago, now) else {
        return DailyMap::new();
    };

    let mut daily: DailyMap = start
        .iter_days()
        .take_while(|date| *date <= end)
        .map(|date| (date, 0))
        .collect();

    for event in events {
        if let Some(count) = daily.get_mut(&event.date()) {
            *count = count.saturating_add(event.weight());
        }
    }

    daily
}

/// Split a daily map into weeks, opening a new week at every Sunday.
pub fn to_weeks(daily: &DailyMap) -> Vec<ContributionWeek> {
    let mut weeks = Vec::new();
    let mut current: ContributionWeek = Vec::with_capacity(7);

    for (&date, &count) in daily {
        if date.weekday() == Weekday::Sun && !current.is_empty() {
            weeks.push(std::mem::replace(&mut current, Vec::with_capacity(7)));
        }
        current.push(ContributionDay::new(date, count));
    }

    if !current.is_empty() {
        weeks.push(current);
    }

    weeks
}
