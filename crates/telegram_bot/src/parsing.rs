//! Parsing and validation of free-text operator input.

use chrono::{Datelike, NaiveDate};

use engine::{ClockTime, Money};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub(crate) enum ParseError {
    #[error("неправильний формат дати")]
    InvalidDate,
    #[error("неправильний формат часу")]
    InvalidTime,
    #[error("некоректна сума")]
    InvalidAmount,
    #[error("некоректна кількість")]
    InvalidCount,
    #[error("некоректний вік")]
    InvalidAge,
}

fn parse_date_part(part: &str) -> Result<u32, ParseError> {
    if part.is_empty() || part.len() > 2 || !part.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseError::InvalidDate);
    }
    part.parse().map_err(|_| ParseError::InvalidDate)
}

/// Parses `DD.MM.YYYY` or `DD.MM` (the year defaults to the current one).
///
/// Impossible dates (`32.01`, `29.02.2023`) are rejected, not clamped.
pub(crate) fn parse_event_date(input: &str, today: NaiveDate) -> Result<NaiveDate, ParseError> {
    let trimmed = input.trim();
    let parts: Vec<&str> = trimmed.split('.').collect();

    let (day_str, month_str, year) = match parts.as_slice() {
        [d, m] => (*d, *m, today.year()),
        [d, m, y] => {
            if y.len() != 4 || !y.chars().all(|c| c.is_ascii_digit()) {
                return Err(ParseError::InvalidDate);
            }
            (*d, *m, y.parse().map_err(|_| ParseError::InvalidDate)?)
        }
        _ => return Err(ParseError::InvalidDate),
    };

    let day = parse_date_part(day_str)?;
    let month = parse_date_part(month_str)?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or(ParseError::InvalidDate)
}

/// Parses `HH:MM` or the compact `HHMM` form.
pub(crate) fn parse_clock(input: &str) -> Result<ClockTime, ParseError> {
    input.trim().parse().map_err(|_| ParseError::InvalidTime)
}

/// Strictly positive money amount.
pub(crate) fn parse_amount(input: &str) -> Result<Money, ParseError> {
    let amount: Money = input.trim().parse().map_err(|_| ParseError::InvalidAmount)?;
    if !amount.is_positive() {
        return Err(ParseError::InvalidAmount);
    }
    Ok(amount)
}

/// Non-negative money amount (a unit price may legitimately be unset/zero).
pub(crate) fn parse_price(input: &str) -> Result<Money, ParseError> {
    let price: Money = input.trim().parse().map_err(|_| ParseError::InvalidAmount)?;
    if price.is_negative() {
        return Err(ParseError::InvalidAmount);
    }
    Ok(price)
}

/// Strictly positive integer lesson count.
pub(crate) fn parse_lessons_count(input: &str) -> Result<u32, ParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseError::InvalidCount);
    }
    let count: u32 = trimmed.parse().map_err(|_| ParseError::InvalidCount)?;
    if count == 0 {
        return Err(ParseError::InvalidCount);
    }
    Ok(count)
}

/// Child age, 0..=18.
pub(crate) fn parse_age(input: &str) -> Result<u8, ParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseError::InvalidAge);
    }
    let age: u8 = trimmed.parse().map_err(|_| ParseError::InvalidAge)?;
    if age > 18 {
        return Err(ParseError::InvalidAge);
    }
    Ok(age)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, 10).unwrap()
    }

    #[test]
    fn date_accepts_full_and_short_forms() {
        assert_eq!(
            parse_event_date("14.11.2024", today()).unwrap(),
            NaiveDate::from_ymd_opt(2024, 11, 14).unwrap()
        );
        // Short form defaults to the current year.
        assert_eq!(
            parse_event_date("22.11", today()).unwrap(),
            NaiveDate::from_ymd_opt(2024, 11, 22).unwrap()
        );
        assert_eq!(
            parse_event_date(" 1.2 ", today()).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
        );
    }

    #[test]
    fn date_rejects_malformed_and_impossible() {
        for input in ["", "14", "14.11.24", "14/11/2024", "32.01", "29.02.2023", "abc", "1.2.3.4"] {
            assert_eq!(parse_event_date(input, today()), Err(ParseError::InvalidDate), "{input}");
        }
    }

    #[test]
    fn clock_accepts_both_forms() {
        assert_eq!(parse_clock("10:00").unwrap().to_string(), "10:00");
        assert_eq!(parse_clock("1000").unwrap().to_string(), "10:00");
    }

    #[test]
    fn clock_rejects_garbage() {
        assert_eq!(parse_clock("25:00"), Err(ParseError::InvalidTime));
        assert_eq!(parse_clock("10"), Err(ParseError::InvalidTime));
    }

    #[test]
    fn amount_must_be_positive() {
        assert_eq!(parse_amount("300").unwrap(), Money::from_major(300));
        assert_eq!(parse_amount("150.50").unwrap(), Money::new(15050));
        assert_eq!(parse_amount("0"), Err(ParseError::InvalidAmount));
        assert_eq!(parse_amount("-5"), Err(ParseError::InvalidAmount));
        assert_eq!(parse_amount("п'ять"), Err(ParseError::InvalidAmount));
    }

    #[test]
    fn price_allows_zero_but_not_negative() {
        assert_eq!(parse_price("0").unwrap(), Money::ZERO);
        assert_eq!(parse_price("-1"), Err(ParseError::InvalidAmount));
    }

    #[test]
    fn count_must_be_positive_integer() {
        assert_eq!(parse_lessons_count("5").unwrap(), 5);
        assert_eq!(parse_lessons_count("0"), Err(ParseError::InvalidCount));
        assert_eq!(parse_lessons_count("5.5"), Err(ParseError::InvalidCount));
        assert_eq!(parse_lessons_count("-1"), Err(ParseError::InvalidCount));
    }

    #[test]
    fn age_is_bounded() {
        assert_eq!(parse_age("5").unwrap(), 5);
        assert_eq!(parse_age("18").unwrap(), 18);
        assert_eq!(parse_age("19"), Err(ParseError::InvalidAge));
        assert_eq!(parse_age("-1"), Err(ParseError::InvalidAge));
    }
}
