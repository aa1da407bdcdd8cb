use std::convert::TryFrom;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, NaiveDateTime, Utc};

/// Latest instant kept in a `TIMESTAMP` column, 9999-12-31 23:59:59 UTC.
/// Later years stop sorting correctly in SQLite's text encoding.
const MAX_STORED_SECS: i64 = 253_402_300_799;

/// An instant as it is stored in the `created_at` / `expired_at` columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Expiry(SystemTime);

impl Expiry {
    pub fn at(time: SystemTime) -> Self {
        Self(time)
    }

    pub fn now() -> Self {
        Self(SystemTime::now())
    }

    /// `created + ttl`, where a missing creation instant counts as the epoch.
    pub fn expires_at(created: Option<SystemTime>, ttl: Duration) -> Self {
        let created = created.unwrap_or(SystemTime::UNIX_EPOCH);
        let time = created.checked_add(ttl).unwrap_or(created);
        Self(time)
    }
}

/// Whole seconds in UTC, clamped to the range between the epoch and
/// `MAX_STORED_SECS`.
impl From<Expiry> for NaiveDateTime {
    fn from(expiry: Expiry) -> NaiveDateTime {
        let secs = expiry
            .0
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|since| i64::try_from(since.as_secs()).unwrap_or(i64::MAX))
            .unwrap_or(0)
            .min(MAX_STORED_SECS);

        DateTime::<Utc>::from_timestamp(secs, 0)
            .map(|time| time.naive_utc())
            .unwrap_or_default()
    }
}
