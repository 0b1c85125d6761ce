// Contribution streak detection.
// Current and longest runs of consecutive days with at least one contribution.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streaks {
    pub current: u32,
    pub longest: u32,
}

/// Compute streaks over `(date, count)` pairs sorted by ascending date.
///
/// The current streak ends at `today`: it is 0 when `today` is missing from
/// the data or has no contributions, and otherwise counts back until the
/// first empty day or calendar gap. The longest streak is the longest such
/// run anywhere in the data.
pub fn compute_streaks(days: &[(NaiveDate, u32)], today: NaiveDate) -> Streaks {
    Streaks {
        current: current_streak(days, today),
        longest: longest_streak(days),
    }
}

fn current_streak(days: &[(NaiveDate, u32)], today: NaiveDate) -> u32 {
    let Some(end) = days.iter().rposition(|(date, _)| *date == today) else {
        return 0;
    };

    let mut streak = 0;
    let mut later: Option<NaiveDate> = None;

    for &(date, count) in days[..=end].iter().rev() {
        if count == 0 {
            break;
        }
        if let Some(later) = later {
            if (later - date).num_days() > 1 {
                break;
            }
        }
        streak += 1;
        later = Some(date);
    }

    streak
}

fn longest_streak(days: &[(NaiveDate, u32)]) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for &(date, count) in days {
        if count == 0 {
            run = 0;
            previous = None;
            continue;
        }

        run = match previous {
            Some(prev) if (date - prev).num_days() == 1 => run + 1,
            _ => 1,
        };
        previous = Some(date);
        longest = longest.max(run);
    }

    longest
}
