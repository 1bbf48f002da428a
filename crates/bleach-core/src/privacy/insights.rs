//! Derived, human-readable statements about what a file's metadata reveals.

use std::collections::HashMap;

use super::values::split_key_value;
use crate::types::{InsightKind, ScanDetail, ScanInsight};

const LOCATION_ADVISORY: &str = "Exact coordinates can reveal home, workplace, or travel patterns.";
const TIMELINE_ADVISORY: &str = "Capture timestamps can expose routines and time zones.";
const IDENTIFIER_MESSAGE: &str = "Unique device identifiers (serial numbers) are present.";

/// Keyword lists checked in order; the first match wins.
const DEVICE_TYPES: &[(&str, &[&str])] = &[
    ("smartphone", &["iphone", "pixel", "galaxy", "android"]),
    ("tablet", &["ipad", "tablet"]),
    ("action camera", &["gopro"]),
    ("drone", &["dji"]),
    (
        "camera",
        &["canon", "nikon", "sony", "fujifilm", "panasonic", "olympus", "leica"],
    ),
];

/// `key -> values` view over every `key=value` entry of every detail.
struct Entries<'a> {
    by_key: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> Entries<'a> {
    fn new(details: &'a [ScanDetail]) -> Self {
        let mut by_key: HashMap<&str, Vec<&str>> = HashMap::new();
        for entry in details.iter().flat_map(|d| d.values.iter()) {
            if let Some((key, value)) = split_key_value(entry) {
                by_key.entry(key).or_default().push(value);
            }
        }
        Self { by_key }
    }

    fn first(&self, key: &str) -> &'a str {
        self.by_key
            .get(key)
            .and_then(|values| values.first().copied())
            .unwrap_or("")
    }

    fn first_of(&self, keys: &[&str]) -> &'a str {
        keys.iter()
            .map(|key| self.first(key))
            .find(|value| !value.is_empty())
            .unwrap_or("")
    }
}

/// Build insights from collected scan details.
///
/// Order: location, device, timeline, identifier. Location and timeline are
/// each followed by an advisory line.
pub fn build_insights(details: &[ScanDetail]) -> Vec<ScanInsight> {
    if details.is_empty() {
        return Vec::new();
    }

    let entries = Entries::new(details);
    let mut insights = Vec::new();

    if let Some(location) = location_insight(&entries) {
        insights.push(location);
        insights.push(ScanInsight::new(InsightKind::Location, LOCATION_ADVISORY));
    }
    if let Some(device) = device_insight(&entries) {
        insights.push(device);
    }
    if let Some(timeline) = timeline_insight(&entries) {
        insights.push(timeline);
        insights.push(ScanInsight::new(InsightKind::Timeline, TIMELINE_ADVISORY));
    }
    if has_serial(&entries) {
        insights.push(ScanInsight::new(InsightKind::Identifier, IDENTIFIER_MESSAGE));
    }

    insights
}

fn location_insight(entries: &Entries<'_>) -> Option<ScanInsight> {
    let lat_raw = entries.first("GPSLatitude");
    let lon_raw = entries.first("GPSLongitude");
    if lat_raw.is_empty() || lon_raw.is_empty() {
        return None;
    }

    let mut lat = parse_coordinate(lat_raw)?;
    let mut lon = parse_coordinate(lon_raw)?;
    if entries.first("GPSLatitudeRef") == "S" {
        lat = -lat;
    }
    if entries.first("GPSLongitudeRef") == "W" {
        lon = -lon;
    }

    Some(ScanInsight::new(
        InsightKind::Location,
        format!("Approx location: {lat:.5}, {lon:.5}"),
    ))
}

fn device_insight(entries: &Entries<'_>) -> Option<ScanInsight> {
    let combined = format!("{} {}", entries.first("Make"), entries.first("Model"));
    let mut device = combined.trim();
    if device.is_empty() {
        device = entries.first("CameraModelName");
    }
    if device.is_empty() {
        return None;
    }

    let message = match infer_device_type(device) {
        Some(kind) => format!("Device: {device} ({kind})"),
        None => format!("Device: {device}"),
    };
    Some(ScanInsight::new(InsightKind::Device, message))
}

fn timeline_insight(entries: &Entries<'_>) -> Option<ScanInsight> {
    let ts = entries.first_of(&["DateTimeOriginal", "DateTimeDigitized", "DateTime"]);
    if ts.is_empty() {
        return None;
    }
    Some(ScanInsight::new(
        InsightKind::Timeline,
        format!("Captured: {} (timezone unknown)", format_date_separators(ts)),
    ))
}

fn has_serial(entries: &Entries<'_>) -> bool {
    entries
        .by_key
        .iter()
        .any(|(key, values)| key.to_ascii_lowercase().contains("serial") && !values.is_empty())
}

/// Parse a coordinate given as a decimal or as `[deg min sec]` rationals.
///
/// Returns `None` for anything unparseable.
pub fn parse_coordinate(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let raw = raw.strip_prefix('[').unwrap_or(raw);
    let raw = raw.strip_suffix(']').unwrap_or(raw);
    let parts: Vec<&str> = raw
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|p| !p.is_empty())
        .collect();

    if parts.len() == 1 {
        if let Ok(value) = parts[0].parse::<f64>() {
            return Some(value);
        }
    }

    let values = parts
        .iter()
        .map(|part| parse_rational(part))
        .collect::<Option<Vec<f64>>>()?;

    match values.as_slice() {
        [] => None,
        [deg, min, sec] => Some(deg + min / 60.0 + sec / 3600.0),
        [deg, min] => Some(deg + min / 60.0),
        [first, ..] => Some(*first),
    }
}

fn parse_rational(part: &str) -> Option<f64> {
    let part = part.trim();
    match part.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            Some(num / den)
        }
        None => part.parse().ok(),
    }
}

/// Case-insensitive vendor/keyword match.
pub fn infer_device_type(device: &str) -> Option<&'static str> {
    let device = device.to_lowercase();
    DEVICE_TYPES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| device.contains(k)))
        .map(|(kind, _)| *kind)
}

/// `2024:01:02 03:04:05` -> `2024-01-02 03:04:05`. Only the first two colons change.
fn format_date_separators(ts: &str) -> String {
    let mut out = String::with_capacity(ts.len());
    let mut replaced = 0;
    for c in ts.chars() {
        if c == ':' && replaced < 2 {
            out.push('-');
            replaced += 1;
        } else {
            out.push(c);
        }
    }
    out
}
