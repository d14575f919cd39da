use chrono::{DateTime, Datelike, Utc};
use derive_more::{Display, FromStr};
use serde::{Deserialize, Serialize};

///
/// Timestamp
/// (in seconds)
///

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    FromStr,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[repr(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const EPOCH: Self = Self(u64::MIN);
    pub const MIN: Self = Self(u64::MIN);
    pub const MAX: Self = Self(u64::MAX);

    /// Construct from seconds.
    #[must_use]
    pub const fn from_seconds(secs: u64) -> Self {
        Self(secs)
    }

    #[allow(clippy::cast_sign_loss)]
    pub fn parse_rfc3339(s: &str) -> Result<Self, String> {
        let dt =
            DateTime::parse_from_rfc3339(s).map_err(|e| format!("timestamp parse error: {e}"))?;
        let ts = dt.timestamp();
        if ts < 0 {
            return Err("timestamp before epoch".to_string());
        }

        Ok(Self(ts as u64))
    }

    pub fn parse_flexible(s: &str) -> Result<Self, String> {
        // Try integer seconds
        if let Ok(n) = s.parse::<u64>() {
            return Ok(Self(n));
        }

        // Try RFC3339
        Self::parse_rfc3339(s)
    }

    /// Current wall-clock timestamp in seconds.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn now() -> Self {
        let secs = Utc::now().timestamp();
        Self(if secs < 0 { 0 } else { secs as u64 })
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    ///
    /// DATE PARTS
    ///
    /// Calendar components in UTC, used by the date-extraction match
    /// operators. Values follow SQL conventions: month and day are
    /// 1-based, week day runs 1 (Sunday) through 7 (Saturday).
    ///

    #[must_use]
    pub fn year(self) -> i64 {
        i64::from(self.to_datetime().year())
    }

    #[must_use]
    pub fn month(self) -> i64 {
        i64::from(self.to_datetime().month())
    }

    #[must_use]
    pub fn day(self) -> i64 {
        i64::from(self.to_datetime().day())
    }

    #[must_use]
    pub fn week_day(self) -> i64 {
        i64::from(self.to_datetime().weekday().num_days_from_sunday()) + 1
    }

    #[allow(clippy::cast_possible_wrap)]
    fn to_datetime(self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(self.0 as i64, 0).unwrap_or_default()
    }
}

impl From<u64> for Timestamp {
    fn from(u: u64) -> Self {
        Self(u)
    }
}

///
/// TESTS
///
