//! Date windows for fetch jobs
//!
//! Every helper takes `today` explicitly; callers pass `Local::now().date_naive()`.

use std::fmt;
use std::str::FromStr;

use adverity_core::provider::ProviderError;
use adverity_core::schema::{AttributeType, validate_int_range};
use chrono::{Datelike, Duration, NaiveDate};
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Upper bound of `days_to_fetch` (about a century)
pub const MAX_DAYS_TO_FETCH: i64 = 36_525;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchWindowError {
    #[error("Days to fetch cannot be negative.")]
    NegativeDays,
    #[error("Days to fetch ({0}) reaches outside the supported calendar")]
    OutOfRange(i64),
    #[error("Given dates are empty.")]
    EmptyDates,
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Custom mode not implemented yet.")]
    CustomNotImplemented,
    #[error("Unknown fetch mode '{0}'")]
    UnknownMode(String),
}

impl From<FetchWindowError> for ProviderError {
    fn from(err: FetchWindowError) -> Self {
        ProviderError::new(err.to_string()).with_cause(err)
    }
}

/// Inclusive date range sent to `fetch_fixed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FetchWindow {
    pub fn start_string(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_string(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

impl fmt::Display for FetchWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start_string(), self.end_string())
    }
}

/// How the window of a fetch is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Days,
    PreviousMonths,
    CurrentMonth,
    PreviousWeeks,
    CurrentWeek,
    Custom,
}

impl FetchMode {
    pub const ALL: [&'static str; 6] = [
        "days",
        "previous_months",
        "current_month",
        "previous_weeks",
        "current_week",
        "custom",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FetchMode::Days => "days",
            FetchMode::PreviousMonths => "previous_months",
            FetchMode::CurrentMonth => "current_month",
            FetchMode::PreviousWeeks => "previous_weeks",
            FetchMode::CurrentWeek => "current_week",
            FetchMode::Custom => "custom",
        }
    }

    /// Window for this mode; `days_to_fetch` is ignored by the `current_*` modes
    pub fn window(
        &self,
        today: NaiveDate,
        days_to_fetch: i64,
    ) -> Result<FetchWindow, FetchWindowError> {
        match self {
            FetchMode::Days => days(today, days_to_fetch),
            FetchMode::PreviousMonths => previous_months(today, days_to_fetch),
            FetchMode::CurrentMonth => Ok(current_month(today)),
            FetchMode::PreviousWeeks => previous_weeks(today, days_to_fetch),
            FetchMode::CurrentWeek => Ok(current_week(today)),
            FetchMode::Custom => Err(FetchWindowError::CustomNotImplemented),
        }
    }
}

impl FromStr for FetchMode {
    type Err = FetchWindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "days" => Ok(FetchMode::Days),
            "previous_months" => Ok(FetchMode::PreviousMonths),
            "current_month" => Ok(FetchMode::CurrentMonth),
            "previous_weeks" => Ok(FetchMode::PreviousWeeks),
            "current_week" => Ok(FetchMode::CurrentWeek),
            "custom" => Ok(FetchMode::Custom),
            other => Err(FetchWindowError::UnknownMode(other.to_string())),
        }
    }
}

/// Attribute type of `days_to_fetch`: an integer in `0..=MAX_DAYS_TO_FETCH`
pub fn days_type() -> AttributeType {
    AttributeType::Custom {
        name: "DaysToFetch".to_string(),
        base: Box::new(AttributeType::Int),
        validate: |v| validate_int_range(v, 0, MAX_DAYS_TO_FETCH),
    }
}

/// `date` moved `n` days into the past
fn days_before(date: NaiveDate, n: i64) -> Result<NaiveDate, FetchWindowError> {
    if n < 0 {
        return Err(FetchWindowError::NegativeDays);
    }
    Duration::try_days(n)
        .and_then(|d| date.checked_sub_signed(d))
        .ok_or(FetchWindowError::OutOfRange(n))
}

/// `[today - n, today]`
pub fn days(today: NaiveDate, n: i64) -> Result<FetchWindow, FetchWindowError> {
    Ok(FetchWindow {
        start: days_before(today, n)?,
        end: today,
    })
}

pub fn current_month(today: NaiveDate) -> FetchWindow {
    FetchWindow {
        start: first_of_month(today),
        end: today,
    }
}

/// Whole months from the month `n` days ago up to the end of last month
pub fn previous_months(today: NaiveDate, n: i64) -> Result<FetchWindow, FetchWindowError> {
    let end = days_before(first_of_month(today), 1)?;
    let mut start = first_of_month(days_before(today, n)?);
    if start > end {
        start = first_of_month(end);
    }
    Ok(FetchWindow { start, end })
}

pub fn current_week(today: NaiveDate) -> FetchWindow {
    FetchWindow {
        start: monday(today),
        end: today,
    }
}

/// Whole weeks from the week `n` days ago up to last Sunday
pub fn previous_weeks(today: NaiveDate, n: i64) -> Result<FetchWindow, FetchWindowError> {
    let end = days_before(sunday(today), 7)?;
    let mut start = monday(days_before(today, n)?);
    if start > end {
        start = monday(days_before(today, 7)?);
    }
    Ok(FetchWindow { start, end })
}

/// Explicit `YYYY-MM-DD` bounds
pub fn custom(start: &str, end: &str) -> Result<FetchWindow, FetchWindowError> {
    if start.trim().is_empty() || end.trim().is_empty() {
        return Err(FetchWindowError::EmptyDates);
    }
    let parse = |s: &str| {
        NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map_err(|_| FetchWindowError::InvalidDate(s.to_string()))
    };
    Ok(FetchWindow {
        start: parse(start)?,
        end: parse(end)?,
    })
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

/// Monday of the week containing `date` (weeks start on Monday)
pub fn monday(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Sunday ending the week containing `date`; a Sunday maps to itself
pub fn sunday(date: NaiveDate) -> NaiveDate {
    let offset = (7 - date.weekday().num_days_from_sunday()) % 7;
    date + Duration::days(i64::from(offset))
}
