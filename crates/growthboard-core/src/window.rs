//! Today and lookback windows, resolved in the dashboard's fixed timezone.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;

/// Funnel lookback lengths offered to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookbackDays {
    Seven,
    Fourteen,
    Thirty,
}

impl LookbackDays {
    pub const OPTIONS: [LookbackDays; 3] = [Self::Seven, Self::Fourteen, Self::Thirty];

    /// Used when the caller asks for a length that is not offered.
    pub const FALLBACK: LookbackDays = LookbackDays::Seven;

    /// Used when the caller makes no selection at all.
    pub const INITIAL: LookbackDays = LookbackDays::Fourteen;

    pub fn days(self) -> u32 {
        match self {
            Self::Seven => 7,
            Self::Fourteen => 14,
            Self::Thirty => 30,
        }
    }

    /// Resolve a raw selection. Never fails: anything outside
    /// [`LookbackDays::OPTIONS`] becomes [`LookbackDays::FALLBACK`].
    pub fn from_selection(raw: Option<u32>) -> Self {
        match raw {
            None => Self::INITIAL,
            Some(7) => Self::Seven,
            Some(14) => Self::Fourteen,
            Some(30) => Self::Thirty,
            Some(other) => {
                tracing::debug!(requested = other, "Unsupported lookback, using fallback");
                Self::FALLBACK
            }
        }
    }

    pub fn option_days() -> Vec<u32> {
        Self::OPTIONS.iter().map(|o| o.days()).collect()
    }
}

/// An inclusive range `[start, end]` where `start` is a local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl TimeWindow {
    /// Calendar date of `start` in the window's timezone.
    pub fn start_date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// Calendar date of `end` in the window's timezone.
    pub fn end_date(&self) -> NaiveDate {
        self.end.date_naive()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DashboardWindows {
    pub today: TimeWindow,
    pub lookback: TimeWindow,
    pub lookback_days: LookbackDays,
}

/// First instant of `date` in `tz`.
///
/// Where DST makes local midnight ambiguous the earlier instant wins; where a
/// transition skips midnight entirely the day starts at the first local time
/// that exists.
pub fn start_of_day(tz: Tz, date: NaiveDate) -> DateTime<Tz> {
    let midnight = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(a, b) => a.min(b),
        LocalResult::None => (1..=4)
            .find_map(|step| {
                tz.from_local_datetime(&(midnight + Duration::minutes(30 * step)))
                    .earliest()
            })
            .unwrap_or_else(|| tz.from_utc_datetime(&midnight)),
    }
}

/// Compute both dashboard windows for the instant `now`.
///
/// The lookback window covers `N` calendar days including today, so its start
/// is the local midnight `N - 1` days before today's.
pub fn resolve_windows(now: DateTime<Utc>, tz: Tz, lookback_days: LookbackDays) -> DashboardWindows {
    let local_now = now.with_timezone(&tz);
    let today = local_now.date_naive();
    let lookback_start = today - Duration::days(i64::from(lookback_days.days()) - 1);

    DashboardWindows {
        today: TimeWindow {
            start: start_of_day(tz, today),
            end: local_now,
        },
        lookback: TimeWindow {
            start: start_of_day(tz, lookback_start),
            end: local_now,
        },
        lookback_days,
    }
}
