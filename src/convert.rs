//! Canonical text renderings and numeric conversions shared by every value cell.
//!
//! These functions define the exact output of [`crate::Value::text`] and the
//! rules the other getters use, so that two documents holding the same values
//! always serialize byte-for-byte identically.
//!
//! ## Timestamps and OA-dates
//!
//! Numeric kinds convert to and from timestamps through the OA-date encoding:
//! the number of days since 1899-12-30 plus the fractional time of day.
//!
//! ```rust
//! use doctree::convert::{from_oa_date, to_oa_date, format_timestamp};
//!
//! let ts = from_oa_date(45000.5).unwrap();
//! assert_eq!(format_timestamp(ts), "2023-03-15T12:00:00");
//! assert_eq!(to_oa_date(ts), 45000.5);
//! ```

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt::Write;

/// Sortable timestamp pattern, `YYYY-MM-DDThh:mm:ss`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const MILLIS_PER_DAY: i64 = 86_400_000;
// Exclusive OA-date bounds: 0100-01-01 and 10000-01-01.
const OA_DATE_MIN: f64 = -657_435.0;
const OA_DATE_MAX: f64 = 2_958_466.0;

fn oa_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// The timestamp malformed text and out-of-range numbers convert to: `0001-01-01T00:00:00`.
#[must_use]
pub fn zero_timestamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Converts a timestamp to its OA-date value.
///
/// A timestamp on 0001-01-01 is treated as a bare time of day, which makes
/// [`zero_timestamp`] map to `0.0`. Dates before the epoch keep the time of day
/// as a positive fraction: 1899-12-29 06:00 is `-1.25`.
#[must_use]
pub fn to_oa_date(ts: NaiveDateTime) -> f64 {
    let zero = zero_timestamp();
    let mut millis = if ts.date() == zero.date() {
        (ts - zero).num_milliseconds()
    } else {
        (ts - oa_epoch()).num_milliseconds()
    };
    if millis < 0 {
        let frac = millis % MILLIS_PER_DAY;
        if frac != 0 {
            millis -= (MILLIS_PER_DAY + frac) * 2;
        }
    }
    millis as f64 / MILLIS_PER_DAY as f64
}

/// Converts an OA-date value to a timestamp, rounding to the nearest millisecond.
///
/// Returns `None` outside the representable range (years 100 to 9999) and for NaN.
#[must_use]
pub fn from_oa_date(value: f64) -> Option<NaiveDateTime> {
    if !(value > OA_DATE_MIN && value < OA_DATE_MAX) {
        return None;
    }
    let half = if value >= 0.0 { 0.5 } else { -0.5 };
    let mut millis = (value * MILLIS_PER_DAY as f64 + half) as i64;
    if millis < 0 {
        millis -= (millis % MILLIS_PER_DAY) * 2;
    }
    oa_epoch().checked_add_signed(Duration::milliseconds(millis))
}

/// Renders a timestamp with [`TIMESTAMP_FORMAT`].
#[must_use]
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses text against [`TIMESTAMP_FORMAT`] after trimming surrounding whitespace.
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), TIMESTAMP_FORMAT).ok()
}

/// Renders a float with the shortest digits that round-trip, laid out like the
/// general numeric format: positional for decimal exponents in `-5..15`,
/// otherwise scientific with a signed, at least two-digit exponent.
///
/// # Examples
///
/// ```rust
/// use doctree::convert::format_float;
///
/// assert_eq!(format_float(3.141), "3.141");
/// assert_eq!(format_float(1e15), "1E+15");
/// assert_eq!(format_float(0.0001), "0.0001");
/// assert_eq!(format_float(0.00001), "1E-05");
/// ```
#[must_use]
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let sci = format!("{:e}", value);
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();

    let mut out = String::with_capacity(digits.len() + 8);
    if value < 0.0 {
        out.push('-');
    }

    if !(-5..15).contains(&exponent) {
        out.push_str(&digits[..1]);
        if digits.len() > 1 {
            out.push('.');
            out.push_str(&digits[1..]);
        }
        out.push('E');
        out.push(if exponent < 0 { '-' } else { '+' });
        let _ = write!(out, "{:02}", exponent.unsigned_abs());
    } else if exponent < 0 {
        out.push_str("0.");
        for _ in 0..(-exponent - 1) {
            out.push('0');
        }
        out.push_str(&digits);
    } else {
        let int_len = exponent as usize + 1;
        if digits.len() <= int_len {
            out.push_str(&digits);
            for _ in digits.len()..int_len {
                out.push('0');
            }
        } else {
            out.push_str(&digits[..int_len]);
            out.push('.');
            out.push_str(&digits[int_len..]);
        }
    }
    out
}

/// Renders a decimal with exactly four fractional digits, rounding half away from zero.
///
/// A decimal carries at most 96 bits of mantissa, so values too large to take
/// four more digits keep only the fractional digits that fit: [`Decimal::MAX`]
/// renders with none.
///
/// # Examples
///
/// ```rust
/// use doctree::convert::format_decimal;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(format_decimal(Decimal::from_str("3.14").unwrap()), "3.1400");
/// assert_eq!(format_decimal(Decimal::from_str("2.00005").unwrap()), "2.0001");
/// ```
#[must_use]
pub fn format_decimal(value: Decimal) -> String {
    let mut rounded = value.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded.rescale(4);
    rounded.to_string()
}

/// Rounds half away from zero, then truncates to 64 bits.
#[must_use]
pub fn float_to_i64(value: f64) -> i64 {
    value.round() as i64
}

/// Rounds half away from zero, then truncates to 64 bits.
#[must_use]
pub fn decimal_to_i64(value: Decimal) -> i64 {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i128()
        .unwrap_or_default() as i64
}

#[must_use]
pub fn decimal_to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

#[must_use]
pub fn f64_to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Parses a trimmed integer, falling back to zero.
pub(crate) fn parse_int<T: std::str::FromStr + Default>(text: &str) -> T {
    text.trim().parse().unwrap_or_default()
}

/// Text is true when it reads `true` (any case) or is a positive run of ASCII digits.
pub(crate) fn parse_bool(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        return true;
    }
    !trimmed.is_empty()
        && trimmed.bytes().all(|b| b.is_ascii_digit())
        && trimmed.bytes().any(|b| b != b'0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_oa_date_epoch_and_fraction() {
        assert_eq!(to_oa_date(ts(1899, 12, 30, 0, 0, 0)), 0.0);
        assert_eq!(to_oa_date(ts(1899, 12, 31, 12, 0, 0)), 1.5);
        assert_eq!(to_oa_date(ts(1899, 12, 29, 6, 0, 0)), -1.25);
        assert_eq!(from_oa_date(-1.25), Some(ts(1899, 12, 29, 6, 0, 0)));
        assert_eq!(from_oa_date(1.0), Some(ts(1899, 12, 31, 0, 0, 0)));
    }

    #[test]
    fn test_oa_date_zero_timestamp() {
        assert_eq!(to_oa_date(zero_timestamp()), 0.0);
        assert_eq!(to_oa_date(ts(1, 1, 1, 6, 0, 0)), 0.25);
        assert_eq!(from_oa_date(f64::NAN), None);
        assert_eq!(from_oa_date(3_000_000.0), None);
    }

    #[test]
    fn test_format_float_positional() {
        assert_eq!(format_float(1.5), "1.5");
        assert_eq!(format_float(-42.0), "-42");
        assert_eq!(format_float(123456789012345.0), "123456789012345");
        assert_eq!(format_float(0.1 + 0.2), "0.30000000000000004");
    }

    #[test]
    fn test_format_float_scientific() {
        assert_eq!(format_float(1.5e20), "1.5E+20");
        assert_eq!(format_float(-2.5e-7), "-2.5E-07");
        assert_eq!(format_float(1e100), "1E+100");
        assert_eq!(format_float(f64::INFINITY), "Infinity");
    }

    #[test]
    fn test_format_decimal_near_capacity() {
        assert_eq!(
            format_decimal(Decimal::from_str("12345678901234567890123.5").unwrap()),
            "12345678901234567890123.5000"
        );
        assert_eq!(format_decimal(Decimal::MAX), "79228162514264337593543950335");
        assert_eq!(format_decimal(Decimal::MIN), "-79228162514264337593543950335");
    }

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(Decimal::from(7)), "7.0000");
        assert_eq!(format_decimal(Decimal::from_str("-0.00004").unwrap()), "0.0000");
        assert_eq!(format_decimal(Decimal::from_str("-1.23455").unwrap()), "-1.2346");
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        assert_eq!(float_to_i64(2.5), 3);
        assert_eq!(float_to_i64(-2.5), -3);
        assert_eq!(decimal_to_i64(Decimal::from_str("2.5").unwrap()), 3);
        assert_eq!(decimal_to_i64(Decimal::from_str("-0.5").unwrap()), -1);
    }

    #[test]
    fn test_parse_bool_text() {
        assert!(parse_bool(" TRUE "));
        assert!(parse_bool("15"));
        assert!(!parse_bool("000"));
        assert!(!parse_bool("-5"));
        assert!(!parse_bool("yes"));
        assert!(!parse_bool(""));
    }
}
