//! pt-BR display formatting: currency, plain numbers, percentages, dates.
//!
//! Every function here returns a displayable value for any input. Numbers
//! use `.` for thousands and `,` for decimals; currency is prefixed `R$ `.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::normalize::coerce_number;

const CURRENCY_PREFIX: &str = "R$ ";
/// Beyond this an `f64` carries no further decimal digits worth printing.
const MAX_DECIMALS: usize = 20;
const DATE_DISPLAY: &str = "%d/%m/%Y %H:%M";
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Values a formatter can try to read as an amount.
pub trait ToAmount {
    /// `None` when the value is not a finite number.
    fn to_amount(&self) -> Option<f64>;
}

impl ToAmount for f64 {
    fn to_amount(&self) -> Option<f64> {
        self.is_finite().then_some(*self)
    }
}

impl ToAmount for f32 {
    fn to_amount(&self) -> Option<f64> {
        f64::from(*self).to_amount()
    }
}

macro_rules! int_to_amount {
    ($($t:ty),*) => {
        $(impl ToAmount for $t {
            fn to_amount(&self) -> Option<f64> {
                Some(*self as f64)
            }
        })*
    };
}

int_to_amount!(i32, i64, u32, u64, usize);

impl ToAmount for str {
    fn to_amount(&self) -> Option<f64> {
        self.trim().parse::<f64>().ok()?.to_amount()
    }
}

impl ToAmount for String {
    fn to_amount(&self) -> Option<f64> {
        self.as_str().to_amount()
    }
}

impl ToAmount for Value {
    fn to_amount(&self) -> Option<f64> {
        coerce_number(self)
    }
}

impl<T: ToAmount + ?Sized> ToAmount for &T {
    fn to_amount(&self) -> Option<f64> {
        (**self).to_amount()
    }
}

impl<T: ToAmount> ToAmount for Option<T> {
    fn to_amount(&self) -> Option<f64> {
        self.as_ref().and_then(ToAmount::to_amount)
    }
}

/// `1234.5` → `R$ 1.234,50`; `-10` → `-R$ 10,00`; non-numeric → `R$ 0,00`.
pub fn format_currency(amount: impl ToAmount) -> String {
    let (negative, digits) = grouped(amount.to_amount().unwrap_or(0.0), 2);
    let sign = if negative { "-" } else { "" };
    format!("{sign}{CURRENCY_PREFIX}{digits}")
}

/// `1234.567, 2` → `1.234,57`.
pub fn format_number(value: impl ToAmount, decimals: usize) -> String {
    let (negative, digits) = grouped(value.to_amount().unwrap_or(0.0), decimals);
    if negative {
        format!("-{digits}")
    } else {
        digits
    }
}

/// Value on a 0..100 scale: `12.5, 1` → `12,5%`.
pub fn format_percent(value: impl ToAmount, decimals: usize) -> String {
    format!("{}%", format_number(value, decimals))
}

/// Read a display amount back: `R$ 1.234,50` → `1234.5`. Garbage → `0.0`.
pub fn parse_currency(text: &str) -> f64 {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, 'R' | '$' | '.') && !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite()).unwrap_or(0.0)
}

/// Render an ISO-8601 timestamp as `DD/MM/YYYY HH:mm`.
///
/// Offsets are kept as written: `...T14:30:00-03:00` renders `14:30`.
/// Unparseable input is returned unchanged.
pub fn format_date(iso: &str) -> String {
    let trimmed = iso.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return dt.format(DATE_DISPLAY).to_string();
    }
    for pattern in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, pattern) {
            return dt.format(DATE_DISPLAY).to_string();
        }
    }
    if let Some(dt) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return dt.format(DATE_DISPLAY).to_string();
    }

    iso.to_string()
}

/// `numerator / denominator`, or `default` when the denominator is zero.
pub fn safe_divide(numerator: f64, denominator: f64, default: f64) -> f64 {
    if denominator == 0.0 {
        default
    } else {
        numerator / denominator
    }
}

/// Sign and pt-BR digits of `value` rounded half away from zero.
/// A value that rounds to zero is never negative.
fn grouped(value: f64, decimals: usize) -> (bool, String) {
    let decimals = decimals.min(MAX_DECIMALS);
    let scale = 10f64.powi(decimals as i32);
    let scaled = (value.abs() * scale).round();

    // Huge amounts overflow when scaled; they have no fractional part anyway.
    let (negative, fixed) = if scaled.is_finite() {
        (value < 0.0 && scaled > 0.0, format!("{:.*}", decimals, scaled / scale))
    } else {
        (value < 0.0, format!("{:.*}", decimals, value.abs()))
    };
    let (integer, fraction) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::with_capacity(fixed.len() + integer.len() / 3);
    for (i, c) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    if let Some(fraction) = fraction {
        out.push(',');
        out.push_str(fraction);
    }
    (negative, out)
}
