use chrono::{DateTime, Duration, Months, Utc};
use serde_json::Value;
use tracing::warn;

/// How often a notification fires again after its first trigger.
///
/// Parsed from the `every` option: a named unit, or a positive number of
/// minutes given as a number or numeric string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
    /// Every N minutes.
    Minutes(u32),
}

impl Repeat {
    /// Interpret an `every` value. Returns `None` for "does not repeat".
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Number(n) => n.as_u64().and_then(Self::from_minutes),
            Value::String(s) => Self::from_name(s),
            other => {
                warn!(every = %other, "unsupported repeat value; treating as non-repeating");
                None
            }
        }
    }

    fn from_name(s: &str) -> Option<Self> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "" => None,
            "second" => Some(Repeat::Second),
            "minute" => Some(Repeat::Minute),
            "hour" => Some(Repeat::Hour),
            "day" => Some(Repeat::Day),
            "week" => Some(Repeat::Week),
            "month" => Some(Repeat::Month),
            "quarter" => Some(Repeat::Quarter),
            "year" => Some(Repeat::Year),
            other => match other.parse::<u64>() {
                Ok(n) => Self::from_minutes(n),
                Err(_) => {
                    warn!(every = %s, "unknown repeat unit; treating as non-repeating");
                    None
                }
            },
        }
    }

    fn from_minutes(n: u64) -> Option<Self> {
        match u32::try_from(n) {
            Ok(0) | Err(_) => {
                warn!(every = n, "repeat interval out of range; treating as non-repeating");
                None
            }
            Ok(m) => Some(Repeat::Minutes(m)),
        }
    }

    /// One step after `from`. `None` only on calendar overflow.
    pub fn step(self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Repeat::Second => from.checked_add_signed(Duration::seconds(1)),
            Repeat::Minute => from.checked_add_signed(Duration::minutes(1)),
            Repeat::Hour => from.checked_add_signed(Duration::hours(1)),
            Repeat::Day => from.checked_add_signed(Duration::days(1)),
            Repeat::Week => from.checked_add_signed(Duration::weeks(1)),
            Repeat::Month => from.checked_add_months(Months::new(1)),
            Repeat::Quarter => from.checked_add_months(Months::new(3)),
            Repeat::Year => from.checked_add_months(Months::new(12)),
            Repeat::Minutes(m) => from.checked_add_signed(Duration::minutes(i64::from(m))),
        }
    }

    /// Next trigger strictly after `now`, counted in whole steps from
    /// `original`.
    ///
    /// A fire delivered on time yields `original + interval`. When delivery
    /// was late (device asleep, process dead) the missed windows are skipped
    /// rather than replayed back-to-back.
    pub fn next_after(self, original: DateTime<Utc>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let mut next = self.step(original)?;
        if next > now {
            return Some(next);
        }

        // Jump close to `now` in one go for fixed-length units, then walk.
        if let Some(len) = self.fixed_len() {
            let behind = (now - next).num_seconds() / len.num_seconds();
            if behind > 0 {
                let skip = len.num_seconds().checked_mul(behind)?;
                next = next.checked_add_signed(Duration::try_seconds(skip)?)?;
            }
        }
        while next <= now {
            next = self.step(next)?;
        }
        Some(next)
    }

    fn fixed_len(self) -> Option<Duration> {
        match self {
            Repeat::Second => Some(Duration::seconds(1)),
            Repeat::Minute => Some(Duration::minutes(1)),
            Repeat::Hour => Some(Duration::hours(1)),
            Repeat::Day => Some(Duration::days(1)),
            Repeat::Week => Some(Duration::weeks(1)),
            Repeat::Minutes(m) => Some(Duration::minutes(i64::from(m))),
            Repeat::Month | Repeat::Quarter | Repeat::Year => None,
        }
    }
}
