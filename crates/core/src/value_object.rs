//! Value objects: equality by value, not identity.

use core::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// Calendar month key (`mes_ref`), rendered as `YYYY-MM`.
///
/// Ordering is chronological, which for this format is also lexicographic.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl ValueObject for MonthKey {}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self, AnalyticsError> {
        if !(1..=12).contains(&month) {
            return Err(AnalyticsError::schema(format!(
                "month must be in 1..=12, got {month}"
            )));
        }
        Ok(Self { year, month })
    }

    /// Month key of a calendar date.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl core::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || AnalyticsError::schema(format!("invalid month key '{s}', expected YYYY-MM"));
        let (y, m) = s.trim().split_once('-').ok_or_else(bad)?;
        if y.len() != 4 || m.len() != 2 {
            return Err(bad());
        }
        let year = y.parse::<i32>().map_err(|_| bad())?;
        let month = m.parse::<u32>().map_err(|_| bad())?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for MonthKey {
    type Error = AnalyticsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(value: MonthKey) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_key_is_derived_from_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 17).unwrap();
        assert_eq!(MonthKey::of(date).to_string(), "2024-03");
    }

    #[test]
    fn month_key_parses_and_orders_chronologically() {
        let dec: MonthKey = "2023-12".parse().unwrap();
        let jan: MonthKey = "2024-01".parse().unwrap();
        assert!(dec < jan);
        assert_eq!(jan.year(), 2024);
        assert_eq!(jan.month(), 1);
    }

    #[test]
    fn month_key_rejects_malformed_input() {
        for bad in ["2024-13", "2024/01", "24-01", "2024-1", ""] {
            assert!(bad.parse::<MonthKey>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn month_key_serializes_as_string() {
        let key: MonthKey = "2023-07".parse().unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"2023-07\"");
        let back: MonthKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
