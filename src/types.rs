use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArbVersion {
    major: u16,
    minor: u16,
}

impl ArbVersion {
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    pub fn major(&self) -> u16 {
        self.major
    }

    pub fn minor(&self) -> u16 {
        self.minor
    }

    pub fn parse(value: impl AsRef<str>) -> Option<Self> {
        let raw = value.as_ref().trim();
        if raw.is_empty() {
            return None;
        }
        let mut parts = raw.splitn(2, '.');
        let major = parts.next()?.parse::<u16>().ok()?;
        let minor = match parts.next() {
            Some(v) => v.parse::<u16>().ok()?,
            None => 0,
        };
        Some(Self { major, minor })
    }
}

impl fmt::Display for ArbVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

pub const CURRENT_DOC_VERSION: ArbVersion = ArbVersion::new(15, 0);

pub const VERSION_CAL_ENTERED: ArbVersion = ArbVersion::new(2, 0);
pub const VERSION_CONFIG_OTHERPTS: ArbVersion = ArbVersion::new(3, 0);
pub const VERSION_EXISTING_SPEED: ArbVersion = ArbVersion::new(10, 1);
pub const VERSION_EXISTING_MQ: ArbVersion = ArbVersion::new(11, 0);
pub const VERSION_ACTION_CONFIG: ArbVersion = ArbVersion::new(12, 12);

/// A calendar date that may be unset. Unset dates order before every set date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArbDate(Option<NaiveDate>);

impl ArbDate {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self(NaiveDate::from_ymd_opt(year, month, day))
    }

    pub fn from_naive(date: NaiveDate) -> Self {
        Self(Some(date))
    }

    pub fn invalid() -> Self {
        Self(None)
    }

    pub fn today() -> Self {
        Self(Some(Local::now().date_naive()))
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }

    pub fn naive(&self) -> Option<NaiveDate> {
        self.0
    }

    pub fn year(&self) -> Option<i32> {
        self.0.map(|d| d.year())
    }

    pub fn parse(value: impl AsRef<str>) -> Option<Self> {
        NaiveDate::parse_from_str(value.as_ref().trim(), "%Y-%m-%d")
            .ok()
            .map(Self::from_naive)
    }

    pub fn to_iso_string(&self) -> String {
        self.0
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }

    pub fn to_compact_string(&self) -> String {
        self.0
            .map(|d| d.format("%Y%m%d").to_string())
            .unwrap_or_default()
    }

    pub fn is_between(&self, first: &ArbDate, second: &ArbDate) -> bool {
        let (lo, hi) = if first <= second {
            (first, second)
        } else {
            (second, first)
        };
        lo <= self && self <= hi
    }
}

impl fmt::Display for ArbDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_parses_and_orders() {
        let v = ArbVersion::parse("12.12").unwrap();
        assert_eq!(v, ArbVersion::new(12, 12));
        assert_eq!(ArbVersion::parse("3"), Some(ArbVersion::new(3, 0)));
        assert!(ArbVersion::parse("x.1").is_none());
        assert!(ArbVersion::parse("").is_none());
        assert!(ArbVersion::new(2, 0) > ArbVersion::new(1, 9));
        assert!(ArbVersion::new(12, 12) > ArbVersion::new(12, 2));
        assert_eq!(v.to_string(), "12.12");
    }

    #[test]
    fn unset_dates_sort_first() {
        let unset = ArbDate::invalid();
        let set = ArbDate::new(2004, 3, 1);
        assert!(unset < set);
        assert!(!unset.is_valid());
        assert_eq!(unset.to_iso_string(), "");
    }

    #[test]
    fn date_formats() {
        let d = ArbDate::parse("2006-09-03").unwrap();
        assert_eq!(d.to_iso_string(), "2006-09-03");
        assert_eq!(d.to_compact_string(), "20060903");
        assert!(ArbDate::parse("09/03/2006").is_none());
        assert!(!ArbDate::new(2006, 2, 30).is_valid());
    }

    #[test]
    fn between_accepts_reversed_bounds() {
        let d = ArbDate::new(2006, 5, 10);
        let a = ArbDate::new(2006, 5, 1);
        let b = ArbDate::new(2006, 5, 10);
        assert!(d.is_between(&a, &b));
        assert!(d.is_between(&b, &a));
        assert!(!ArbDate::new(2006, 5, 11).is_between(&a, &b));
    }
}
