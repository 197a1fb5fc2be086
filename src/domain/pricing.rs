//! Booking windows and hourly pricing
//!
//! Cost is `hourly_rate * billable_hours`, where anything shorter than an
//! hour is billed as a full hour and longer stays are billed to the second.
//! The result is rounded half away from zero to 2 decimal places.

use chrono::{Duration, NaiveDateTime, Timelike};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::{DomainError, DomainResult};

/// Wire format of booking timestamps (`YYYY-MM-DDTHH:MM`)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Same format with seconds, accepted from clients that send them
const TIMESTAMP_FORMAT_SECONDS: &str = "%Y-%m-%dT%H:%M:%S";

const SECONDS_PER_HOUR: i64 = 3600;

/// Minimum-charge floor
const MIN_BILLABLE_SECONDS: i64 = SECONDS_PER_HOUR;

/// Largest amount a money column (`DECIMAL(10,2)`) can hold: 99 999 999.99
pub fn max_amount() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// A validated booking period, `end > start`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl BookingWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> DomainResult<Self> {
        if end <= start {
            return Err(DomainError::InvalidRequest(format!(
                "end_time ({}) must be after start_time ({})",
                format_timestamp(end),
                format_timestamp(start)
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse both ends from the wire format and validate the order
    pub fn parse(start: &str, end: &str) -> DomainResult<Self> {
        Self::new(parse_timestamp("start_time", start)?, parse_timestamp("end_time", end)?)
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Seconds charged for, after applying the one-hour floor
    pub fn billable_seconds(&self) -> i64 {
        self.duration().num_seconds().max(MIN_BILLABLE_SECONDS)
    }

    /// Billable duration in hours (exact decimal)
    pub fn billable_hours(&self) -> Decimal {
        Decimal::from(self.billable_seconds()) / Decimal::from(SECONDS_PER_HOUR)
    }
}

/// Wire form of a timestamp; seconds are shown only when present
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    if ts.second() == 0 {
        ts.format(TIMESTAMP_FORMAT).to_string()
    } else {
        ts.format(TIMESTAMP_FORMAT_SECONDS).to_string()
    }
}

fn parse_timestamp(field: &str, value: &str) -> DomainResult<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT_SECONDS))
        .map_err(|_| {
            DomainError::InvalidRequest(format!(
                "{} '{}' is not in YYYY-MM-DDTHH:MM format",
                field, value
            ))
        })
}

/// Total cost of parking for `window` at `hourly_rate`.
///
/// Multiplication happens before division so whole-hour stays are exact.
/// A cost that does not fit a money column is refused.
pub fn total_cost(hourly_rate: Decimal, window: &BookingWindow) -> DomainResult<Decimal> {
    hourly_rate
        .checked_mul(Decimal::from(window.billable_seconds()))
        .and_then(|amount| amount.checked_div(Decimal::from(SECONDS_PER_HOUR)))
        .map(|amount| amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .filter(|amount| *amount <= max_amount())
        .ok_or_else(|| {
            DomainError::InvalidRequest(format!(
                "Cost of this booking would exceed {}",
                max_amount()
            ))
        })
}
