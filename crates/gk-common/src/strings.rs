//! Blank-input helpers
//!
//! "Blank" means empty or whitespace only. Credentials and token values are
//! checked with these before any port is consulted.

/// True when `value` is empty or contains only whitespace.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Returns the value untouched when it is present and not blank.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !is_blank(v))
}
