//! String helpers shared by the EXIF and PNG analyzers.

/// Collapse embedded CR/LF to spaces and trim.
pub fn sanitize_value(value: &str) -> String {
    value.replace(['\r', '\n'], " ").trim().to_string()
}

/// Render a `key=value` entry with a sanitized value.
pub fn key_value(key: &str, value: &str) -> String {
    let value = sanitize_value(value);
    if key.is_empty() {
        value
    } else {
        format!("{key}={value}")
    }
}

/// Append `value` unless it is empty or already present. Keeps insertion order.
pub fn push_unique(values: &mut Vec<String>, value: String) {
    if value.is_empty() || values.contains(&value) {
        return;
    }
    values.push(value);
}

/// Union `incoming` into `values`, deduplicated.
pub fn extend_unique(values: &mut Vec<String>, incoming: &[String]) {
    for value in incoming {
        push_unique(values, value.clone());
    }
}

/// Split a `key=value` entry at the first `=`; `None` when there is no key.
pub fn split_key_value(entry: &str) -> Option<(&str, &str)> {
    let (key, value) = entry.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim()))
}
