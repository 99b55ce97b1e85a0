// src/normalize/date.rs

use chrono::{Datelike, NaiveDate, Weekday};

/// Format patterns tried in order for header date tokens.
const DATE_FORMATS: [&str; 4] = ["%Y.%m.%d", "%Y-%m-%d", "%Y%m%d", "%Y/%m/%d"];

/// Far-past sentinel used to order unparseable date strings last when
/// sorting ascending.
pub const SENTINEL_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1900, 1, 1) {
    Some(d) => d,
    None => unreachable!(),
};

/// Outcome of parsing a date token. Total: bad input yields
/// `Unparseable` with the original string, never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedDate {
    Parsed(NaiveDate),
    Unparseable(String),
}

impl ParsedDate {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            ParsedDate::Parsed(d) => Some(*d),
            ParsedDate::Unparseable(_) => None,
        }
    }

    /// Date used for chronological ordering; unparseable tokens collapse
    /// to the far-past sentinel.
    pub fn sort_key(&self) -> NaiveDate {
        self.date().unwrap_or(SENTINEL_DATE)
    }
}

/// Parse a date token against the fixed format list, first hit wins.
pub fn parse_date_token(token: &str) -> ParsedDate {
    let token = token.trim();
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(token, fmt) {
            return ParsedDate::Parsed(d);
        }
    }
    ParsedDate::Unparseable(token.to_string())
}

/// Trading-day predicate: Monday through Friday.
pub fn is_trading_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
