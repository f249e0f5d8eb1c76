//! Field validation rules shared by the forms and the CLI.
//!
//! Every rule is a pure function over raw input returning a [`FieldCheck`].
//! Failures are data, never errors: the forms turn them into per-field
//! error flags and the submit buttons stay disabled until every check passes.

use std::sync::LazyLock;

use chrono::Datelike;
use regex::Regex;

use crate::utils::parse_date;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$")
        .expect("email pattern is a valid regex")
});

pub const MIN_NAME_LEN: usize = 2;
pub const MIN_PASSWORD_LEN: usize = 8;

/// Outcome of a single field rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCheck {
    pub valid: bool,
    pub message: Option<String>,
}

impl FieldCheck {
    pub fn ok() -> Self {
        Self { valid: true, message: None }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }

    /// The message when the check failed, `None` otherwise
    pub fn error(&self) -> Option<&str> {
        if self.valid { None } else { self.message.as_deref() }
    }
}

pub fn validate_name(value: &str, field: &str) -> FieldCheck {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return FieldCheck::fail(format!("{} is required", field));
    }
    if trimmed.chars().count() < MIN_NAME_LEN {
        return FieldCheck::fail(format!("{} must be at least {} characters", field, MIN_NAME_LEN));
    }
    FieldCheck::ok()
}

pub fn validate_email(value: &str) -> FieldCheck {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return FieldCheck::fail("Email is required");
    }
    if !EMAIL_PATTERN.is_match(trimmed) {
        return FieldCheck::fail("Enter a valid email address");
    }
    FieldCheck::ok()
}

pub fn validate_password(value: &str) -> FieldCheck {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return FieldCheck::fail(format!("Password must be at least {} characters", MIN_PASSWORD_LEN));
    }
    let has_upper = value.chars().any(|c| c.is_uppercase());
    let has_lower = value.chars().any(|c| c.is_lowercase());
    let has_digit = value.chars().any(|c| c.is_ascii_digit());
    let has_symbol = value.chars().any(|c| !c.is_alphanumeric());
    if !(has_upper && has_lower && has_digit && has_symbol) {
        return FieldCheck::fail(
            "Password needs an uppercase letter, a lowercase letter, a digit and a symbol",
        );
    }
    FieldCheck::ok()
}

pub fn validate_accepted(checked: bool) -> FieldCheck {
    if checked {
        FieldCheck::ok()
    } else {
        FieldCheck::fail("You must accept the privacy policy")
    }
}

pub fn validate_required(value: &str, field: &str) -> FieldCheck {
    if value.trim().is_empty() {
        FieldCheck::fail(format!("{} is required", field))
    } else {
        FieldCheck::ok()
    }
}

/// Non-negative integer (mileage, odometer thresholds)
pub fn validate_whole_number(value: &str, field: &str) -> FieldCheck {
    match value.trim().parse::<i64>() {
        Ok(n) if n >= 0 => FieldCheck::ok(),
        Ok(_) => FieldCheck::fail(format!("{} cannot be negative", field)),
        Err(_) => FieldCheck::fail(format!("{} must be a whole number", field)),
    }
}

/// Non-negative decimal (costs, litres)
pub fn validate_amount(value: &str, field: &str) -> FieldCheck {
    match value.trim().parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 0.0 => FieldCheck::ok(),
        Ok(_) => FieldCheck::fail(format!("{} cannot be negative", field)),
        Err(_) => FieldCheck::fail(format!("{} must be a number", field)),
    }
}

pub fn validate_date(value: &str) -> FieldCheck {
    match parse_date(value.trim()) {
        Ok(_) => FieldCheck::ok(),
        Err(_) => FieldCheck::fail("Date must be YYYY-MM-DD"),
    }
}

/// Empty is accepted; otherwise 1900 through next year
pub fn validate_year(value: &str) -> FieldCheck {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return FieldCheck::ok();
    }
    let max_year = chrono::Utc::now().year() + 1;
    match trimmed.parse::<i32>() {
        Ok(y) if (1900..=max_year).contains(&y) => FieldCheck::ok(),
        Ok(_) => FieldCheck::fail(format!("Year must be between 1900 and {}", max_year)),
        Err(_) => FieldCheck::fail("Year must be a number"),
    }
}

pub fn validate_latitude(value: &str) -> FieldCheck {
    match value.trim().parse::<f64>() {
        Ok(v) if (-90.0..=90.0).contains(&v) => FieldCheck::ok(),
        _ => FieldCheck::fail("Latitude must be between -90 and 90"),
    }
}

pub fn validate_longitude(value: &str) -> FieldCheck {
    match value.trim().parse::<f64>() {
        Ok(v) if (-180.0..=180.0).contains(&v) => FieldCheck::ok(),
        _ => FieldCheck::fail("Longitude must be between -180 and 180"),
    }
}

/// Comma separated list of day counts, e.g. "7,1,0". Empty is accepted.
/// Upper bound for any day count (lead times, repeat intervals): a century
pub const MAX_DAYS: u32 = 36_500;

/// A whole number of days in `0..=MAX_DAYS`
pub fn parse_day_count(value: &str, field: &str) -> Result<u32, String> {
    let trimmed = value.trim();
    match trimmed.parse::<u32>() {
        Ok(n) if n <= MAX_DAYS => Ok(n),
        Ok(_) => Err(format!("{} cannot exceed {} days", field, MAX_DAYS)),
        Err(_) if trimmed.chars().all(|c| c.is_ascii_digit()) && !trimmed.is_empty() => {
            Err(format!("{} cannot exceed {} days", field, MAX_DAYS))
        }
        Err(_) => Err(format!("'{}' is not a number of days", trimmed)),
    }
}

pub fn validate_day_count(value: &str, field: &str) -> FieldCheck {
    match parse_day_count(value, field) {
        Ok(_) => FieldCheck::ok(),
        Err(e) => FieldCheck::fail(e),
    }
}

pub fn parse_lead_days(value: &str) -> Result<Vec<u32>, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    trimmed
        .split(',')
        .map(|part| parse_day_count(part, "Lead time"))
        .collect()
}

pub fn validate_lead_days(value: &str) -> FieldCheck {
    match parse_lead_days(value) {
        Ok(_) => FieldCheck::ok(),
        Err(e) => FieldCheck::fail(e),
    }
}

/// Logical AND over a set of checks
pub fn all_valid<'a>(checks: impl IntoIterator<Item = &'a FieldCheck>) -> bool {
    checks.into_iter().all(|c| c.valid)
}
