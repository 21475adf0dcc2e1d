// used for the calendar arithmetic behind the expansions
use chrono::{Datelike, Months, NaiveDate};
// the three accepted shapes are recognized by one precompiled pattern
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// used to print out readable forms of a date
use std::fmt;
use std::str::FromStr;

/// The literal used in archival transcriptions when a date is not known.
pub const UNKNOWN: &str = "-1";

lazy_static! {
    static ref PARTIAL_DATE: Regex = Regex::new(r"^([0-9]{4})(?:-([0-9]{2})(?:-([0-9]{2}))?)?$").unwrap();
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("`{0}` is not a date of the form yyyy, yyyy-mm or yyyy-mm-dd (or -1 when unknown)")]
pub struct InvalidDate(pub String);

// ------------- TimeType -------------
#[derive(Eq, PartialEq, PartialOrd, Ord, Debug, Hash, Clone, Copy)]
pub enum TimeType {
    Unknown,
    Year(i32),
    YearMonth(i32, u32),
    Date(NaiveDate),
}

impl TimeType {
    pub fn parse(s: &str) -> Option<TimeType> {
        if s == UNKNOWN {
            return Some(TimeType::Unknown);
        }
        let captures = PARTIAL_DATE.captures(s)?;
        let year = captures.get(1)?.as_str().parse::<i32>().ok()?;
        // there is no year zero in the calendar the sources use
        if year == 0 {
            return None;
        }
        let month = match captures.get(2) {
            Some(m) => m.as_str().parse::<u32>().ok()?,
            None => return Some(TimeType::Year(year)),
        };
        match captures.get(3) {
            Some(d) => {
                let day = d.as_str().parse::<u32>().ok()?;
                NaiveDate::from_ymd_opt(year, month, day).map(TimeType::Date)
            }
            None => {
                NaiveDate::from_ymd_opt(year, month, 1)?;
                Some(TimeType::YearMonth(year, month))
            }
        }
    }
    pub fn is_unknown(&self) -> bool {
        matches!(self, TimeType::Unknown)
    }
    /// The closed range of days this moment could refer to.
    pub fn range(&self) -> Option<DateRange> {
        match *self {
            TimeType::Unknown => None,
            TimeType::Year(y) => DateRange::new(
                NaiveDate::from_ymd_opt(y, 1, 1)?,
                NaiveDate::from_ymd_opt(y, 12, 31)?,
            ),
            TimeType::YearMonth(y, m) => DateRange::new(
                NaiveDate::from_ymd_opt(y, m, 1)?,
                NaiveDate::from_ymd_opt(y, m, last_day_of_month(y, m)?)?,
            ),
            TimeType::Date(d) => DateRange::new(d, d),
        }
    }
}
impl fmt::Display for TimeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TimeType::Unknown => write!(f, "{}", UNKNOWN),
            TimeType::Year(y) => write!(f, "{:04}", y),
            TimeType::YearMonth(y, m) => write!(f, "{:04}-{:02}", y, m),
            TimeType::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

// ------------- DateRange -------------
#[derive(Eq, PartialEq, Debug, Hash, Clone, Copy)]
pub struct DateRange {
    min: NaiveDate,
    max: NaiveDate,
}

impl DateRange {
    pub fn new(min: NaiveDate, max: NaiveDate) -> Option<Self> {
        if min > max {
            return None;
        }
        Some(Self { min, max })
    }
    pub fn min(&self) -> NaiveDate {
        self.min
    }
    pub fn max(&self) -> NaiveDate {
        self.max
    }
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.min <= date && date <= self.max
    }
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.min <= other.max && other.min <= self.max
    }
}
impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}, {}]", self.min.format("%Y-%m-%d"), self.max.format("%Y-%m-%d"))
    }
}

// ------------- Time -------------
// Keeps the string exactly as it was transcribed next to its parsed moment,
// so exports can show both the raw value and the expanded range.
#[derive(Eq, PartialEq, Debug, Hash, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Time {
    raw: String,
    moment: TimeType,
}

impl Time {
    pub fn unknown() -> Time {
        Time {
            raw: UNKNOWN.to_string(),
            moment: TimeType::Unknown,
        }
    }
    pub fn parse(s: &str) -> Result<Time, InvalidDate> {
        match TimeType::parse(s) {
            Some(moment) => Ok(Time {
                raw: s.to_string(),
                moment,
            }),
            None => Err(InvalidDate(s.to_string())),
        }
    }
    pub fn raw(&self) -> &str {
        &self.raw
    }
    pub fn moment(&self) -> TimeType {
        self.moment
    }
    pub fn is_unknown(&self) -> bool {
        self.moment.is_unknown()
    }
    pub fn range(&self) -> Option<DateRange> {
        self.moment.range()
    }
    pub fn min(&self) -> Option<NaiveDate> {
        self.range().map(|r| r.min())
    }
    pub fn max(&self) -> Option<NaiveDate> {
        self.range().map(|r| r.max())
    }
}
impl Default for Time {
    fn default() -> Self {
        Time::unknown()
    }
}
impl FromStr for Time {
    type Err = InvalidDate;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Time::parse(s)
    }
}
impl TryFrom<String> for Time {
    type Error = InvalidDate;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Time::parse(&s)
    }
}
impl From<Time> for String {
    fn from(t: Time) -> String {
        t.raw
    }
}
impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

// ------------- Free functions -------------
pub fn validate(s: &str) -> bool {
    TimeType::parse(s).is_some()
}

/// Expands a partial date into the first and last day it may denote.
/// Anything `validate` rejects, as well as the unknown sentinel, yields
/// `(None, None)`.
pub fn expand(s: &str) -> (Option<NaiveDate>, Option<NaiveDate>) {
    match TimeType::parse(s).and_then(|t| t.range()) {
        Some(range) => (Some(range.min()), Some(range.max())),
        None => (None, None),
    }
}

pub fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
    Some(last.day())
}
