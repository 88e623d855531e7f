//! Value coercion for loosely typed export columns.
//!
//! Station exports disagree on whether ids and coordinates are strings or
//! numbers, and CSV turns everything into strings. These helpers accept
//! either form.

/// Reads a JSON value as an identifier. Strings are trimmed and must be
/// non-empty; integers are formatted in decimal.
#[must_use]
pub fn value_as_id(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(|i| i.to_string())
            .or_else(|| n.as_u64().map(|u| u.to_string())),
        _ => None,
    }
}

/// Reads a JSON value as a coordinate, parsing strings as `f64`.
#[must_use]
pub fn value_as_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        serde_json::Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Validates a longitude/latitude pair. Returns `None` if either is
/// missing, zero, or outside WGS84 degree range.
#[must_use]
pub fn valid_lng_lat(longitude: Option<f64>, latitude: Option<f64>) -> Option<(f64, f64)> {
    let longitude = longitude?;
    let latitude = latitude?;
    if longitude == 0.0 || latitude == 0.0 {
        return None;
    }
    if !(-180.0..=180.0).contains(&longitude) || !(-90.0..=90.0).contains(&latitude) {
        return None;
    }
    Some((longitude, latitude))
}
