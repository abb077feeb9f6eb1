//! Field validators shared by the request DTOs.
//!
//! Every validator takes the field path used in error messages so a rejected
//! request names exactly which input was wrong, e.g. `customer.email`.

use rust_decimal::Decimal;

use crate::{
    error::{AppError, AppResult},
    models::SizeStock,
};

pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_QUANTITY: i64 = 999;
pub const MAX_TEXT_LEN: usize = 1000;
const LETTER_SIZES: [&str; 6] = ["XS", "S", "M", "L", "XL", "XXL"];

fn invalid(msg: impl Into<String>) -> AppError {
    AppError::BadRequest(msg.into())
}

/// Trimmed, non-empty string.
pub fn require_text(field: &str, value: Option<&str>) -> AppResult<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(invalid(format!("{field} is required"))),
    }
}

pub fn validate_email(field: &str, value: Option<&str>) -> AppResult<String> {
    let email = require_text(field, value)?;
    if email.len() > MAX_EMAIL_LEN {
        return Err(invalid(format!(
            "{field} is too long (max {MAX_EMAIL_LEN} characters)"
        )));
    }
    if !is_email(&email) {
        return Err(invalid(format!("{field} is not a valid email address")));
    }
    Ok(email.to_ascii_lowercase())
}

fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.rsplit_once('@') else {
        return false;
    };
    is_local_part(local) && is_domain(domain)
}

fn is_local_part(local: &str) -> bool {
    const SPECIAL: &str = ".!#$%&'*+/=?^_`{|}~-";
    !local.is_empty()
        && local.len() <= 64
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || SPECIAL.contains(c))
}

fn is_domain(domain: &str) -> bool {
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || domain.len() > 253 {
        return false;
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    let tld = labels[labels.len() - 1];
    labels_ok && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
}

pub fn validate_name(field: &str, value: Option<&str>) -> AppResult<String> {
    let name = require_text(field, value)?;
    let len = name.chars().count();
    if len < 2 {
        return Err(invalid(format!("{field} must have at least 2 characters")));
    }
    if len > 100 {
        return Err(invalid(format!("{field} is too long (max 100 characters)")));
    }
    let lowered = name.to_lowercase();
    if name.contains('<')
        || name.contains('>')
        || lowered.contains("script")
        || lowered.contains("onclick")
    {
        return Err(invalid(format!("{field} contains invalid characters")));
    }
    Ok(name)
}

/// Optional phone number: digits, spaces, `+`, `-` and parentheses.
pub fn validate_phone(field: &str, value: Option<&str>) -> AppResult<Option<String>> {
    let Some(phone) = value.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(None);
    };
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'));
    if !allowed || !phone.chars().any(|c| c.is_ascii_digit()) {
        return Err(invalid(format!("{field} is not a valid phone number")));
    }
    if phone.len() > 20 {
        return Err(invalid(format!("{field} is too long (max 20 characters)")));
    }
    Ok(Some(phone.to_string()))
}

pub fn validate_slug(field: &str, value: Option<&str>) -> AppResult<String> {
    let slug = require_text(field, value)?.to_lowercase();
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(invalid(format!(
            "{field} may only contain lowercase letters, digits and hyphens"
        )));
    }
    if slug.len() > 200 {
        return Err(invalid(format!("{field} is too long (max 200 characters)")));
    }
    Ok(slug)
}

/// Catalog price: non-negative, at most 999999.99, at most two decimals.
pub fn validate_price(field: &str, value: Option<Decimal>) -> AppResult<Decimal> {
    let price = value.ok_or_else(|| invalid(format!("{field} is required")))?;
    if price.is_sign_negative() && !price.is_zero() {
        return Err(invalid(format!("{field} cannot be negative")));
    }
    if price > Decimal::new(99_999_999, 2) {
        return Err(invalid(format!("{field} is too high")));
    }
    if price.normalize().scale() > 2 {
        return Err(invalid(format!("{field} must have at most 2 decimals")));
    }
    Ok(price)
}

/// Order total: positive, at most 2 decimals, within `NUMERIC(10,2)`.
pub fn validate_total(field: &str, value: Option<Decimal>) -> AppResult<Decimal> {
    let total = value.ok_or_else(|| invalid(format!("{field} is required")))?;
    if total <= Decimal::ZERO {
        return Err(invalid(format!("{field} must be greater than 0")));
    }
    if total > Decimal::new(9_999_999_999, 2) {
        return Err(invalid(format!("{field} is too high")));
    }
    if total.normalize().scale() > 2 {
        return Err(invalid(format!("{field} must have at most 2 decimals")));
    }
    Ok(total)
}

/// Optional free text bounded by its column width. Blank input becomes `None`.
pub fn validate_optional_text(
    field: &str,
    value: Option<&str>,
    max_len: usize,
) -> AppResult<Option<String>> {
    let Some(text) = value.map(sanitize_text).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if text.chars().count() > max_len {
        return Err(invalid(format!(
            "{field} is too long (max {max_len} characters)"
        )));
    }
    Ok(Some(text))
}

pub fn validate_description(field: &str, value: Option<&str>) -> AppResult<String> {
    let description = require_text(field, value)?;
    let len = description.chars().count();
    if len < 10 {
        return Err(invalid(format!("{field} must have at least 10 characters")));
    }
    if len > 2000 {
        return Err(invalid(format!("{field} is too long (max 2000 characters)")));
    }
    Ok(description)
}

pub fn validate_quantity(field: &str, value: Option<i64>) -> AppResult<i32> {
    let quantity = value.ok_or_else(|| invalid(format!("{field} is required")))?;
    if quantity < 1 {
        return Err(invalid(format!("{field} must be greater than 0")));
    }
    if quantity > MAX_QUANTITY {
        return Err(invalid(format!("{field} cannot exceed {MAX_QUANTITY}")));
    }
    Ok(quantity as i32)
}

pub fn validate_password(field: &str, value: Option<&str>) -> AppResult<String> {
    let password = value
        .filter(|p| !p.is_empty())
        .ok_or_else(|| invalid(format!("{field} is required")))?;
    let len = password.chars().count();
    if len < 6 {
        return Err(invalid(format!("{field} must have at least 6 characters")));
    }
    if len > 128 {
        return Err(invalid(format!("{field} is too long (max 128 characters)")));
    }
    Ok(password.to_string())
}

pub fn is_known_size(label: &str) -> bool {
    LETTER_SIZES.contains(&label)
        || label
            .parse::<u8>()
            .map(|n| (32..=46).contains(&n))
            .unwrap_or(false)
}

pub fn validate_sizes(field: &str, value: Option<Vec<SizeStock>>) -> AppResult<Vec<SizeStock>> {
    let sizes = value
        .filter(|s| !s.is_empty())
        .ok_or_else(|| invalid(format!("{field} must contain at least one size")))?;
    let mut seen: Vec<&str> = Vec::with_capacity(sizes.len());
    for size in &sizes {
        if !is_known_size(&size.value) {
            return Err(invalid(format!("{field}: unknown size '{}'", size.value)));
        }
        if size.stock < 0 {
            return Err(invalid(format!("{field}: stock must be non-negative")));
        }
        if seen.contains(&size.value.as_str()) {
            return Err(invalid(format!("{field}: duplicate size '{}'", size.value)));
        }
        seen.push(&size.value);
    }
    Ok(sizes)
}

/// Strip control characters, trim and cap free-text input.
///
/// Text is stored as typed; HTML output escapes it with [`escape_html`].
pub fn sanitize_text(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_control() || *c == '\n')
        .collect::<String>()
        .trim()
        .chars()
        .take(MAX_TEXT_LEN)
        .collect()
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
