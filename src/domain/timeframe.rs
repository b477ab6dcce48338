//! Resampling interval parsing.
//!
//! Accepts pandas-style offset aliases: an optional positive count followed
//! by a unit. `S`/`s`/`sec` seconds, `T`/`min`/`m` minutes, `H`/`h` hours,
//! `D`/`d` days. Examples: `5T`, `30min`, `4h`, `1D`.

use chrono::{Duration, NaiveDateTime, NaiveTime};
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use crate::domain::error::MtfcrossError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeframe {
    seconds: i64,
    label: String,
}

impl Timeframe {
    pub fn minutes(count: NonZeroU32) -> Self {
        Self {
            seconds: i64::from(count.get()) * 60,
            label: format!("{}T", count),
        }
    }

    /// `5T`, used when no lower timeframe is configured.
    pub fn default_lower() -> Self {
        Self::minutes(NonZeroU32::new(5).unwrap_or(NonZeroU32::MIN))
    }

    /// `30T`, used when no higher timeframe is configured.
    pub fn default_higher() -> Self {
        Self::minutes(NonZeroU32::new(30).unwrap_or(NonZeroU32::MIN))
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    /// Start of the interval containing `timestamp`, with intervals anchored
    /// at midnight of `origin_day`'s date.
    pub fn bucket_start(&self, timestamp: NaiveDateTime, origin_day: NaiveDateTime) -> NaiveDateTime {
        let origin = origin_day.date().and_time(NaiveTime::MIN);
        let offset = (timestamp - origin).num_seconds();
        let buckets = offset.div_euclid(self.seconds);
        origin + Duration::seconds(buckets * self.seconds)
    }
}

impl FromStr for Timeframe {
    type Err = MtfcrossError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let invalid = |reason: &str| MtfcrossError::InvalidTimeframe {
            value: raw.to_string(),
            reason: reason.to_string(),
        };

        let split = raw
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| invalid("missing unit"))?;
        let (count_str, unit) = raw.split_at(split);

        let count: i64 = if count_str.is_empty() {
            1
        } else {
            count_str
                .parse()
                .map_err(|_| invalid("count is not a number"))?
        };
        if count == 0 {
            return Err(invalid("count must be positive"));
        }

        let unit_seconds = match unit {
            "S" | "s" | "sec" => 1,
            "T" | "min" | "m" => 60,
            "H" | "h" => 3_600,
            "D" | "d" => 86_400,
            _ => return Err(invalid("unknown unit (expected S, T/min, H or D)")),
        };

        let seconds = count
            .checked_mul(unit_seconds)
            .ok_or_else(|| invalid("interval too large"))?;

        Ok(Self {
            seconds,
            label: raw.to_string(),
        })
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn parses_pandas_aliases() {
        assert_eq!("5T".parse::<Timeframe>().unwrap().seconds(), 300);
        assert_eq!("30min".parse::<Timeframe>().unwrap().seconds(), 1_800);
        assert_eq!("4h".parse::<Timeframe>().unwrap().seconds(), 14_400);
        assert_eq!("4H".parse::<Timeframe>().unwrap().seconds(), 14_400);
        assert_eq!("1D".parse::<Timeframe>().unwrap().seconds(), 86_400);
        assert_eq!("15s".parse::<Timeframe>().unwrap().seconds(), 15);
        assert_eq!("H".parse::<Timeframe>().unwrap().seconds(), 3_600);
    }

    #[test]
    fn keeps_label() {
        let tf: Timeframe = " 30T ".parse().unwrap();
        assert_eq!(tf.to_string(), "30T");
    }

    #[test]
    fn rejects_bad_input() {
        assert!("".parse::<Timeframe>().is_err());
        assert!("30".parse::<Timeframe>().is_err());
        assert!("0T".parse::<Timeframe>().is_err());
        assert!("5W".parse::<Timeframe>().is_err());
        assert!("5M".parse::<Timeframe>().is_err());
    }

    #[test]
    fn oversized_count_is_rejected() {
        let err = "200000000000000D".parse::<Timeframe>().unwrap_err();
        assert!(matches!(
            err,
            MtfcrossError::InvalidTimeframe { ref reason, .. } if reason == "interval too large"
        ));
        assert!("99999999999999999999T".parse::<Timeframe>().is_err());
    }

    #[test]
    fn minute_constructors() {
        let tf = Timeframe::minutes(NonZeroU32::new(15).unwrap());
        assert_eq!(tf.seconds(), 900);
        assert_eq!(tf.to_string(), "15T");
        assert_eq!(Timeframe::default_lower(), "5T".parse().unwrap());
        assert_eq!(Timeframe::default_higher(), "30T".parse().unwrap());
    }

    #[test]
    fn bucket_start_floors_to_interval() {
        let tf: Timeframe = "30T".parse().unwrap();
        let origin = ts(1, 9, 17);
        assert_eq!(tf.bucket_start(ts(1, 9, 17), origin), ts(1, 9, 0));
        assert_eq!(tf.bucket_start(ts(1, 9, 30), origin), ts(1, 9, 30));
        assert_eq!(tf.bucket_start(ts(1, 9, 59), origin), ts(1, 9, 30));
    }

    #[test]
    fn bucket_start_spans_days() {
        let tf: Timeframe = "4h".parse().unwrap();
        let origin = ts(1, 2, 0);
        assert_eq!(tf.bucket_start(ts(2, 5, 45), origin), ts(2, 4, 0));
        assert_eq!(tf.bucket_start(ts(1, 23, 59), origin), ts(1, 20, 0));
    }
}
