use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Indian mobile numbers: optional `+91`/`91`/`0` prefix, ten digits starting 6-9.
static MOBILE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\+?91|0)?([6-9]\d{9})$").expect("valid mobile regex"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("'{0}' is not a valid 10-digit mobile number")]
    InvalidMobile(String),
    #[error("the order is empty")]
    EmptyOrder,
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    #[error("unknown product '{0}'")]
    UnknownProduct(String),
}

/// Normalises a mobile number to its ten significant digits.
///
/// Spaces and dashes are ignored.
pub fn validate_mobile(input: &str) -> Result<String, ValidationError> {
    let compact: String = input
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '-')
        .collect();
    MOBILE_PATTERN
        .captures(&compact)
        .and_then(|captures| captures.get(1))
        .map(|digits| digits.as_str().to_string())
        .ok_or_else(|| ValidationError::InvalidMobile(input.trim().to_string()))
}
