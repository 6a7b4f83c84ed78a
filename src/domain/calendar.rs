//! Calendar-date helpers shared by the ledger, price lookups and the sampler.
//!
//! Every date in the crate is a [`NaiveDate`]; text only appears at the edges
//! (CLI arguments, CSV files) and is parsed with [`parse_date`].

use chrono::{Datelike, Months, NaiveDate};

use crate::domain::error::StockfolioError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` string into a calendar date.
pub fn parse_date(input: &str) -> Result<NaiveDate, StockfolioError> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).map_err(|e| {
        StockfolioError::InvalidDate {
            date: input.to_string(),
            reason: format!("expected YYYY-MM-DD ({e})"),
        }
    })
}

pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    let first = NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date);
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

pub fn end_of_year(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 12, 31)
}

/// Whole calendar months from `start` to `end`; a partial trailing month does
/// not count.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> i64 {
    let total = (end.year() as i64 * 12 + end.month0() as i64)
        - (start.year() as i64 * 12 + start.month0() as i64);
    if total > 0 && end.day() < start.day() {
        total - 1
    } else if total < 0 && end.day() > start.day() {
        total + 1
    } else {
        total
    }
}

pub fn years_between(start: NaiveDate, end: NaiveDate) -> i64 {
    months_between(start, end) / 12
}
