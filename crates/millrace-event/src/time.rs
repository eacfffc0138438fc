//! UTC timestamps with nanosecond precision.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

/// A UTC timestamp stored as nanoseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    unix_nanos: i64,
}

impl Timestamp {
    pub fn from_unix_nanos(unix_nanos: i64) -> Self {
        Timestamp { unix_nanos }
    }

    pub fn unix_nanos(self) -> i64 {
        self.unix_nanos
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        // In range for an i64 until the year 2262.
        let unix_nanos = Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX);
        Timestamp { unix_nanos }
    }

    pub fn to_datetime(self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.unix_nanos)
    }

    /// RFC-3339 rendering in UTC with up to nanosecond precision.
    pub fn to_rfc3339(self) -> String {
        self.to_datetime()
            .to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}
