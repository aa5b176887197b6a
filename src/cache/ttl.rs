//! TTL Module
//!
//! Time-to-live values and their resolution into absolute expiry timestamps.

use chrono::{DateTime, Duration, Months, Utc};
use serde_json::Value;

use crate::error::{CacheError, Result};

// == Interval ==
/// Calendar-relative interval: whole months first, then an exact duration.
///
/// Adding one month to January 31st lands on the last day of February.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub months: i32,
    pub delta: Duration,
}

impl Interval {
    pub fn months(months: i32) -> Self {
        Self {
            months,
            delta: Duration::zero(),
        }
    }

    pub fn days(days: i64) -> Self {
        Self {
            months: 0,
            delta: Duration::days(days),
        }
    }

    /// Adds an exact duration on top of the month component.
    pub fn and(mut self, delta: Duration) -> Self {
        self.delta = self.delta + delta;
        self
    }

    fn add_to(&self, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let shifted = match self.months {
            0 => Some(start),
            m if m > 0 => start.checked_add_months(Months::new(m.unsigned_abs())),
            m => start.checked_sub_months(Months::new(m.unsigned_abs())),
        }?;
        shifted.checked_add_signed(self.delta)
    }
}

// == Ttl ==
/// How long an entry stays fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ttl {
    /// The entry never expires
    #[default]
    Never,
    /// Expires this many seconds from now (zero or negative means already stale)
    Seconds(i64),
    /// Expires after a calendar-relative interval
    Interval(Interval),
}

impl Ttl {
    /// Resolves the TTL into an absolute unix timestamp relative to `now`.
    ///
    /// Returns `None` for [`Ttl::Never`]; fails with `InvalidArgument` if the
    /// result falls outside the representable timestamp range.
    pub fn expires_at(&self, now: DateTime<Utc>) -> Result<Option<i64>> {
        match self {
            Ttl::Never => Ok(None),
            Ttl::Seconds(secs) => now
                .timestamp()
                .checked_add(*secs)
                .map(Some)
                .ok_or_else(|| out_of_range(format!("{} seconds", secs))),
            Ttl::Interval(interval) => interval
                .add_to(now)
                .map(|at| Some(at.timestamp()))
                .ok_or_else(|| out_of_range(format!("{:?}", interval))),
        }
    }
}

fn out_of_range(what: String) -> CacheError {
    CacheError::InvalidArgument(format!("TTL of {} is out of range", what))
}

// == Conversions ==
impl From<i64> for Ttl {
    fn from(secs: i64) -> Self {
        Ttl::Seconds(secs)
    }
}

impl From<Option<i64>> for Ttl {
    fn from(secs: Option<i64>) -> Self {
        secs.map_or(Ttl::Never, Ttl::Seconds)
    }
}

impl From<std::time::Duration> for Ttl {
    fn from(duration: std::time::Duration) -> Self {
        Ttl::Seconds(i64::try_from(duration.as_secs()).unwrap_or(i64::MAX))
    }
}

impl From<Duration> for Ttl {
    fn from(delta: Duration) -> Self {
        Ttl::Interval(Interval { months: 0, delta })
    }
}

impl From<Interval> for Ttl {
    fn from(interval: Interval) -> Self {
        Ttl::Interval(interval)
    }
}

impl TryFrom<&Value> for Ttl {
    type Error = CacheError;

    /// Accepts `null` (never expires) or an integer number of seconds.
    fn try_from(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Ttl::Never),
            Value::Number(n) => n.as_i64().map(Ttl::Seconds).ok_or_else(|| {
                CacheError::InvalidArgument(format!("TTL must be an integer, got {}", n))
            }),
            other => Err(CacheError::InvalidArgument(format!(
                "TTL must be null or an integer, got {}",
                other
            ))),
        }
    }
}
