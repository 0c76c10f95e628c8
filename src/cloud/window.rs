//! Time window resolution for file queries

use crate::cloud::CloudError;
use crate::models::ROLL_DAYS_UNSET;
use chrono::{Days, Local, NaiveDate};
use tracing::{debug, warn};

/// Largest rolling window, in days, a configuration entry may ask for
pub const MAX_ROLL_DAYS: i64 = 30;

/// Largest span, in days, of a fixed date range
pub const MAX_PERIOD_DAYS: i64 = 91;

const QUERY_DAY_FORMAT: &str = "%Y-%m-%d";

/// A `(from, to)` pair as sent in metadata queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTimeWindow {
    pub from: String,
    pub to: String,
}

/// Resolve the query window for an entry relative to today's local date
pub fn resolve_time_window(
    roll_days: Option<i64>,
    date_from: &str,
    date_to: &str,
) -> ResolvedTimeWindow {
    resolve_time_window_at(Local::now().date_naive(), roll_days, date_from, date_to)
}

/// Resolve the query window for an entry relative to `today`.
///
/// A rolling window, when set, wins over the fixed dates and spans
/// `[today - roll_days, today + 1]`.
pub fn resolve_time_window_at(
    today: NaiveDate,
    roll_days: Option<i64>,
    date_from: &str,
    date_to: &str,
) -> ResolvedTimeWindow {
    match roll_days.filter(|days| *days != ROLL_DAYS_UNSET && *days != 0) {
        Some(days) => match rolled_window(today, days) {
            Some(window) => {
                debug!(
                    "Generated date range from {} roll days: {} - {}",
                    days, window.from, window.to
                );
                window
            }
            None => {
                warn!(
                    "Roll days {} fall outside the supported calendar, using fixed dates",
                    days
                );
                fixed_window(date_from, date_to)
            }
        },
        None => {
            if date_from.is_empty() || date_to.is_empty() {
                warn!(
                    "No roll days and an open date range (from: '{}', to: '{}'), passing it through unchanged",
                    date_from, date_to
                );
            } else {
                debug!("Using fixed date range: {} - {}", date_from, date_to);
            }
            fixed_window(date_from, date_to)
        }
    }
}

/// `[today - days, today + 1]`, or `None` when either bound is not a valid date
fn rolled_window(today: NaiveDate, days: i64) -> Option<ResolvedTimeWindow> {
    let start = if days >= 0 {
        today.checked_sub_days(Days::new(days.unsigned_abs()))?
    } else {
        today.checked_add_days(Days::new(days.unsigned_abs()))?
    };
    let end = today.checked_add_days(Days::new(1))?;
    Some(ResolvedTimeWindow {
        from: start.format(QUERY_DAY_FORMAT).to_string(),
        to: end.format(QUERY_DAY_FORMAT).to_string(),
    })
}

fn fixed_window(date_from: &str, date_to: &str) -> ResolvedTimeWindow {
    ResolvedTimeWindow {
        from: date_from.to_string(),
        to: date_to.to_string(),
    }
}

/// Days between two `YYYY-MM-DD` dates
pub fn days_between(start_date: &str, end_date: &str) -> Result<i64, CloudError> {
    let start = parse_query_day(start_date)?;
    let end = parse_query_day(end_date)?;
    Ok((end - start).num_days())
}

fn parse_query_day(value: &str) -> Result<NaiveDate, CloudError> {
    NaiveDate::parse_from_str(value.trim(), QUERY_DAY_FORMAT).map_err(|e| {
        CloudError::config(format!(
            "Invalid date '{}', expected YYYY-MM-DD: {}",
            value, e
        ))
    })
}
