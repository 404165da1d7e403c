//! Lenient conversion of raw JSON values into typed record fields.

use serde_json::Value;

/// Render a JSON value as an identifier string.
///
/// Strings are taken verbatim, `null` becomes empty, and any other value
/// keeps its JSON text form.
pub fn id_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Coerce an optional JSON value into a non-negative, finite counter.
///
/// An absent field counts as zero. A present field that cannot be read as a
/// number is an error naming the field.
pub fn counter(field: &str, value: Option<&Value>) -> Result<f64, String> {
    let Some(value) = value else {
        return Ok(0.0);
    };

    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match number {
        Some(n) if n.is_finite() && n >= 0.0 => Ok(n),
        Some(n) => Err(format!("field '{field}' must be a non-negative finite number, got {n}")),
        None => Err(format!("field '{field}' is not numeric: {value}")),
    }
}

/// Coerce an optional JSON value into a finite real number, zero if absent.
pub fn real(field: &str, value: Option<&Value>) -> Result<f64, String> {
    match value {
        None => Ok(0.0),
        Some(Value::Number(n)) => n
            .as_f64()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("field '{field}' is not a finite number")),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("field '{field}' is not numeric: {s:?}")),
        Some(other) => Err(format!("field '{field}' is not numeric: {other}")),
    }
}
