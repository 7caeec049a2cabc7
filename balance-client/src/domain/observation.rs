use std::fmt;

use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, Date, Duration, OffsetDateTime, UtcOffset};

/// One of the two prepaid accounts polled on the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Account {
    Water,
    Electric,
}

impl Account {
    pub const ALL: [Account; 2] = [Account::Water, Account::Electric];

    pub fn as_str(&self) -> &'static str {
        match self {
            Account::Water => "water",
            Account::Electric => "electric",
        }
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calendar hour a timestamp falls into, evaluated in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HourBucket {
    pub date: Date,
    pub hour: u8,
}

impl HourBucket {
    pub fn of(ts: OffsetDateTime) -> Self {
        let utc = ts.to_offset(UtcOffset::UTC);
        Self {
            date: utc.date(),
            hour: utc.hour(),
        }
    }
}

/// A single snapshot of both balances.
///
/// Serialized as `{"time": "<RFC 3339>", "water": <number>, "electric": <number>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
    pub water: f64,
    pub electric: f64,
}

impl Observation {
    /// Builds an observation stamped at `time`, normalized to UTC and
    /// truncated to whole seconds.
    pub fn new(time: OffsetDateTime, water: f64, electric: f64) -> Self {
        let utc = time.to_offset(UtcOffset::UTC);
        let time = utc - Duration::nanoseconds(i64::from(utc.nanosecond()));
        Self {
            time,
            water,
            electric,
        }
    }

    pub fn hour_bucket(&self) -> HourBucket {
        HourBucket::of(self.time)
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let time = self.time.format(&Rfc3339).map_err(|_| fmt::Error)?;
        write!(
            f,
            "time={time} water={} electric={}",
            self.water, self.electric
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn new_truncates_to_seconds_and_normalizes_to_utc() {
        let obs = Observation::new(datetime!(2024-01-01 18:05:30.987654 +08:00), 1.0, 2.0);
        assert_eq!(obs.time, datetime!(2024-01-01 10:05:30 UTC));
        assert_eq!(obs.time.offset(), UtcOffset::UTC);
    }

    #[test]
    fn hour_bucket_uses_utc_calendar_hour() {
        let bucket = HourBucket::of(datetime!(2024-01-02 01:30:00 +02:00));
        assert_eq!(
            bucket,
            HourBucket {
                date: date!(2024-01-01),
                hour: 23
            }
        );
    }

    #[test]
    fn hour_bucket_distinguishes_same_hour_on_different_days() {
        let a = HourBucket::of(datetime!(2024-01-01 10:00:00 UTC));
        let b = HourBucket::of(datetime!(2024-01-02 10:00:00 UTC));
        assert_ne!(a, b);
    }

    #[test]
    fn serializes_time_as_rfc3339_utc() {
        let obs = Observation::new(datetime!(2024-01-01 10:05:00 UTC), 12.5, 3.0);
        let json = serde_json::to_string(&obs).unwrap();
        assert_eq!(
            json,
            r#"{"time":"2024-01-01T10:05:00Z","water":12.5,"electric":3.0}"#
        );
    }

    #[test]
    fn account_names_are_lowercase() {
        assert_eq!(Account::Water.to_string(), "water");
        assert_eq!(
            serde_json::to_string(&Account::Electric).unwrap(),
            "\"electric\""
        );
    }
}
