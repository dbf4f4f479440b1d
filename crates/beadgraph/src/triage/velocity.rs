//! Closure velocity for the project as a whole.

use crate::domain::Issue;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Weekly buckets reported by default.
pub const DEFAULT_WEEKS: usize = 8;

/// Closures in one Monday-aligned week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VelocityWeek {
    /// Monday that starts the week (UTC)
    pub week_start: NaiveDate,
    /// Issues closed during the week
    pub closed: usize,
}

/// Rolling closure counts and weekly history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Velocity {
    /// Issues closed within the last 7 days
    pub closed_last_7_days: usize,
    /// Issues closed within the last 30 days
    pub closed_last_30_days: usize,
    /// Mean days from creation to closure
    pub avg_days_to_close: f64,
    /// Weekly buckets, newest first
    pub weekly: Vec<VelocityWeek>,
    /// `true` when some closure times were approximated by `updated_at`
    pub estimated: bool,
}

/// Monday of the week containing `date`.
fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Computes project velocity from the closed issues in `issues`.
///
/// Issues without `closed_at` fall back to `updated_at` and mark the result
/// as estimated.
#[must_use]
pub fn compute_velocity(issues: &[Issue], now: DateTime<Utc>, weeks: usize) -> Velocity {
    let week_ago = now - Duration::days(7);
    let month_ago = now - Duration::days(30);

    let mut buckets: HashMap<NaiveDate, usize> = HashMap::new();
    let mut closed_7 = 0;
    let mut closed_30 = 0;
    let mut total_close_secs = 0_i64;
    let mut samples = 0_u32;
    let mut estimated = false;

    for issue in issues.iter().filter(|i| i.status.is_closed()) {
        let closed_at = issue.closed_at.unwrap_or_else(|| {
            estimated = true;
            issue.updated_at
        });

        if closed_at > week_ago {
            closed_7 += 1;
        }
        if closed_at > month_ago {
            closed_30 += 1;
        }
        *buckets.entry(monday_of(closed_at.date_naive())).or_default() += 1;

        total_close_secs += (closed_at - issue.created_at).num_seconds().max(0);
        samples += 1;
    }

    let mut weekly = Vec::with_capacity(weeks);
    let mut cursor = monday_of(now.date_naive());
    for _ in 0..weeks {
        weekly.push(VelocityWeek {
            week_start: cursor,
            closed: buckets.get(&cursor).copied().unwrap_or(0),
        });
        cursor -= Duration::days(7);
    }

    let avg_days_to_close = if samples == 0 {
        0.0
    } else {
        total_close_secs as f64 / 86_400.0 / f64::from(samples)
    };

    Velocity {
        closed_last_7_days: closed_7,
        closed_last_30_days: closed_30,
        avg_days_to_close,
        weekly,
        estimated,
    }
}
