// -- std imports
use std::time::Duration;

// -- crate imports
use serde::{Deserialize, Deserializer};

/// Durations written as humantime strings, e.g. `"100ms"` or `"3s"`.
pub mod humantime_serde_duration {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

/// Timestamps written as RFC 3339 strings, with `"just now"` accepted as a sentinel.
pub mod last_sync {
    use super::*;
    use crate::device::LastSync;

    pub const JUST_NOW: &str = "just now";

    pub fn parse(s: &str) -> Result<LastSync, humantime::TimestampError> {
        if s.trim().eq_ignore_ascii_case(JUST_NOW) {
            return Ok(LastSync::JustNow);
        }
        humantime::parse_rfc3339_weak(s.trim()).map(LastSync::At)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<LastSync, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use std::time::UNIX_EPOCH;

    use super::*;
    use crate::device::LastSync;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "humantime_serde_duration::deserialize")]
        period: Duration,
        #[serde(deserialize_with = "last_sync::deserialize")]
        synced: LastSync,
    }

    #[test]
    fn parses_humantime_and_sentinel() {
        let s: Sample = serde_yaml::from_str("period: 1m 30s\nsynced: Just Now\n").unwrap();
        assert_eq!(s.period, Duration::from_secs(90));
        assert_eq!(s.synced, LastSync::JustNow);
    }

    #[test]
    fn parses_rfc3339_timestamp() {
        let synced = last_sync::parse("1970-01-01T00:01:00Z").unwrap();
        assert_eq!(synced, LastSync::At(UNIX_EPOCH + Duration::from_secs(60)));
    }

    #[test]
    fn rejects_garbage() {
        assert!(serde_yaml::from_str::<Sample>("period: soon\nsynced: just now\n").is_err());
        assert!(last_sync::parse("yesterday-ish").is_err());
    }
}
