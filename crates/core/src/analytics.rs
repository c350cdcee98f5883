use chrono::{DateTime, Days, FixedOffset, NaiveDate, Utc};

use crate::model::{CategorySelector, LogEntry};
use crate::time::{day_label, local_date};

/// Per-day answer counts for the trailing window, oldest day first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DailySeries {
    pub labels: Vec<String>,
    pub values: Vec<usize>,
}

/// Counts log entries per day over the `window_days` days ending today.
///
/// Entries match by their `MM/DD` label, so entries from the same day of an
/// earlier year are counted too. The selector is resolved once and applied
/// exactly as question filtering applies it.
#[must_use]
pub fn build_series(
    logs: &[LogEntry],
    selector: &CategorySelector,
    window_days: u32,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> DailySeries {
    let resolution = selector.resolve();
    let today = local_date(now, offset);

    let mut series = DailySeries::default();
    for back in (0..window_days).rev() {
        let Some(day) = today.checked_sub_days(Days::new(u64::from(back))) else {
            continue;
        };
        let label = day_label(day);
        let count = logs
            .iter()
            .filter(|entry| entry.date == label && resolution.admits(&entry.category))
            .count();
        series.labels.push(label);
        series.values.push(count);
    }
    series
}

/// Whole days from `now` until local midnight starting `target`, never negative.
///
/// Partial days are dropped, so the eve of the target already reads 0.
#[must_use]
pub fn countdown(target: NaiveDate, now: DateTime<Utc>, offset: FixedOffset) -> u32 {
    let Some(midnight) = target
        .and_hms_opt(0, 0, 0)
        .and_then(|t| t.and_local_timezone(offset).single())
    else {
        return 0;
    };
    let days = midnight
        .with_timezone(&Utc)
        .signed_duration_since(now)
        .num_days()
        .max(0);
    u32::try_from(days).unwrap_or(u32::MAX)
}
