use chrono::NaiveDate;
use regex::Regex;

use crate::AppError;

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex");
}

/// Returns whether `s` looks like an email address.
pub fn is_valid_email(s: &str) -> bool {
    EMAIL_REGEX.is_match(s)
}

/// Returns the file name of a stored upload path.
pub fn basename(path: &str) -> String {
    path.rsplit(['/', '\\']).next().unwrap_or(path).to_string()
}

/// Returns the first `n` characters of `s`.
pub fn excerpt(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

/// Capitalizes the first letter of each word and lowercases the rest.
pub fn title_case(s: &str) -> String {
    let mut ret = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                ret.extend(c.to_uppercase());
            } else {
                ret.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            ret.push(c);
            at_word_start = true;
        }
    }
    ret
}

/// Trims a form value and discards it if it is blank.
pub fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Interprets an HTML checkbox value. Unchecked boxes are not submitted.
pub fn checkbox(value: &Option<String>) -> bool {
    value
        .as_deref()
        .is_some_and(|v| matches!(v.trim(), "on" | "true" | "1" | "yes"))
}

/// Interprets a tri-state select whose values are `""`, `"true"` and `"false"`.
pub fn tri_state(value: &Option<String>) -> Option<bool> {
    match value.as_deref().map(str::trim) {
        Some("true") => Some(true),
        Some("false") => Some(false),
        _ => None,
    }
}

/// Parses an optional `YYYY-MM-DD` form field.
pub fn parse_date_field(name: &str, value: Option<String>) -> Result<Option<NaiveDate>, AppError> {
    non_blank(value)
        .map(|s| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .map_err(|_| AppError::InvalidForm(format!("{name} must be a date (YYYY-MM-DD)")))
        })
        .transpose()
}

/// Parses an optional integer form field.
pub fn parse_int_field(name: &str, value: Option<String>) -> Result<Option<i64>, AppError> {
    non_blank(value)
        .map(|s| {
            s.parse()
                .map_err(|_| AppError::InvalidForm(format!("{name} must be a whole number")))
        })
        .transpose()
}

/// Returns a required form field, or an error naming it.
pub fn required_field(name: &str, value: Option<String>) -> Result<String, AppError> {
    non_blank(value).ok_or_else(|| AppError::InvalidForm(format!("{name} is required")))
}

/// Removes all markup, for plain-text contexts such as email subjects.
pub fn strip_html(s: &str) -> String {
    ammonia::Builder::empty()
        .clean(s)
        .to_string()
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .trim()
        .to_string()
}

/// Sanitizes rich text submitted through a form.
pub fn clean_html(s: &str) -> String {
    ammonia::clean(s).trim().to_string()
}
