//! Timestamps are stored as microseconds since the Unix epoch and rendered as RFC 3339.

use chrono::{DateTime, Utc};

/// Current time in epoch microseconds.
#[must_use]
pub fn now_micros() -> i64 {
    Utc::now().timestamp_micros()
}

/// Converts stored epoch microseconds back into a UTC timestamp.
/// Out-of-range values collapse to the epoch.
#[must_use]
pub fn from_micros(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_micros() {
        let now = now_micros();
        assert_eq!(from_micros(now).timestamp_micros(), now);
        assert_eq!(from_micros(i64::MAX), DateTime::<Utc>::default());
    }
}
