//! Lenient readers for loosely-typed JSON configuration.
//!
//! Admin-saved configuration is hand-edited JSON that has passed through a
//! browser form, so numbers arrive as strings, booleans as `1`/`"0"`, and
//! fields go missing. These helpers never fail: they return `None` when a
//! value is unusable and let the caller pick the default.

use serde_json::Value;

/// Clamp to `>= 0`, mapping NaN and infinities to 0.
pub fn clamp_min0(n: f64) -> f64 {
    if !n.is_finite() || n < 0.0 {
        0.0
    } else {
        n
    }
}

/// Read a number from a JSON number or a numeric string.
///
/// Non-finite results (`"inf"`, `"NaN"`) read as 0.
pub fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };
    Some(if n.is_finite() { n } else { 0.0 })
}

/// Read a number and clamp it to `>= 0`.
pub fn non_negative(value: &Value) -> Option<f64> {
    number(value).map(clamp_min0)
}

/// Read a boolean from `true`/`false`, `1`/`0`, or `"1"`/`"0"`/`"true"`/`"false"`.
pub fn boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_f64() {
            Some(x) if x == 1.0 => Some(true),
            Some(x) if x == 0.0 => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Read a non-empty string.
pub fn text(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

/// Look up the first key present in an object, trying aliases in order.
pub fn field<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| raw.get(*k).filter(|v| !v.is_null()))
}
