//! PNG privacy analysis: text chunks, `tIME`, and embedded `eXIf`.

use flate2::read::ZlibDecoder;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};

use super::exif::{analyze_exif, ExifAnalysis};
use super::values::{extend_unique, key_value, push_unique, sanitize_value};
use super::Category;
use crate::error::FormatError;
use crate::formats::png::{read_chunk_data, read_chunk_header, read_signature, skip_chunk};
use crate::types::ScanDetail;

/// Value recorded when compressed text cannot be inflated.
const COMPRESSED: &str = "compressed";

/// Per-file PNG findings, grouped by privacy category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PngAnalysis {
    pub has_gps: bool,
    pub gps_count: usize,
    pub has_model: bool,
    pub has_timestamp: bool,
    pub serial_count: usize,
    pub gps_values: Vec<String>,
    pub model_values: Vec<String>,
    pub timestamp_values: Vec<String>,
    pub serial_values: Vec<String>,
}

impl PngAnalysis {
    /// Route a text chunk through keyword categorization.
    pub fn record_text(&mut self, key: &str, value: &str) {
        let lower = key.to_lowercase();
        let entry = key_value(key, value);

        if lower.contains("gps") || lower.contains("latitude") || lower.contains("longitude") {
            self.has_gps = true;
            self.gps_count += 1;
            push_unique(&mut self.gps_values, entry.clone());
        }
        if lower.contains("model") || lower.contains("make") {
            self.has_model = true;
            push_unique(&mut self.model_values, entry.clone());
        }
        if lower.contains("date") || lower.contains("time") {
            self.has_timestamp = true;
            push_unique(&mut self.timestamp_values, entry.clone());
        }
        if lower.contains("serial") {
            self.serial_count += 1;
            push_unique(&mut self.serial_values, entry);
        }
    }

    /// Union an embedded EXIF analysis into this one.
    pub fn merge_exif(&mut self, exif: &ExifAnalysis) {
        self.has_gps |= exif.has_gps;
        self.has_model |= exif.has_model;
        self.has_timestamp |= exif.has_timestamp;
        self.gps_count += exif.gps_count;
        self.serial_count += exif.serial_count;
        extend_unique(&mut self.gps_values, &exif.gps_values);
        extend_unique(&mut self.model_values, &exif.model_values);
        extend_unique(&mut self.timestamp_values, &exif.timestamp_values);
        extend_unique(&mut self.serial_values, &exif.serial_values);
    }

    pub fn leak_count(&self) -> usize {
        self.gps_count + self.serial_count
    }

    pub fn details(&self) -> Vec<ScanDetail> {
        let mut details = Vec::new();
        if self.has_gps {
            details.push(ScanDetail::new(Category::Gps, self.gps_values.clone()));
        }
        if self.has_model {
            details.push(ScanDetail::new(Category::DeviceModel, self.model_values.clone()));
        }
        if self.has_timestamp {
            details.push(ScanDetail::new(Category::Timestamp, self.timestamp_values.clone()));
        }
        if self.serial_count > 0 {
            details.push(ScanDetail::new(Category::Identifier, self.serial_values.clone()));
        }
        details
    }
}

/// Analyze a PNG stream.
///
/// Fails on a bad signature or a truncated chunk. Ending on a chunk boundary
/// before `IEND` is a clean end of data. CRCs are not checked.
pub fn analyze_png<R: Read + Seek>(reader: &mut R) -> Result<PngAnalysis, FormatError> {
    reader.seek(SeekFrom::Start(0))?;
    let mut reader = BufReader::new(reader);
    read_signature(&mut reader)?;

    let mut analysis = PngAnalysis::default();

    while let Some(header) = read_chunk_header(&mut reader)? {
        match &header.kind {
            b"tEXt" | b"zTXt" | b"iTXt" => {
                let data = read_chunk_data(&mut reader, &header)?;
                let parsed = match &header.kind {
                    b"tEXt" => parse_text(&data),
                    b"zTXt" => parse_ztxt(&data),
                    _ => parse_itxt(&data),
                };
                if let Some((key, value)) = parsed {
                    analysis.record_text(&key, &value);
                }
            }
            b"tIME" => {
                analysis.has_timestamp = true;
                if header.length == 7 {
                    let data = read_chunk_data(&mut reader, &header)?;
                    if let Some(ts) = format_png_time(&data) {
                        push_unique(&mut analysis.timestamp_values, format!("tIME={ts}"));
                    }
                } else {
                    skip_chunk(&mut reader, &header)?;
                }
            }
            b"eXIf" => {
                let data = read_chunk_data(&mut reader, &header)?;
                let exif = analyze_exif(&mut Cursor::new(data))?;
                analysis.merge_exif(&exif);
            }
            _ => skip_chunk(&mut reader, &header)?,
        }

        if header.is_end() {
            break;
        }
    }

    Ok(analysis)
}

/// Split `key\0rest`; the key must be non-empty.
fn split_keyword(data: &[u8]) -> Option<(String, &[u8])> {
    let idx = data.iter().position(|&b| b == 0)?;
    if idx == 0 {
        return None;
    }
    Some((String::from_utf8_lossy(&data[..idx]).into_owned(), &data[idx + 1..]))
}

fn decode_text(bytes: &[u8]) -> String {
    sanitize_value(&String::from_utf8_lossy(bytes))
}

fn inflate(bytes: &[u8]) -> String {
    let mut decoded = Vec::new();
    match ZlibDecoder::new(bytes).read_to_end(&mut decoded) {
        Ok(_) => decode_text(&decoded),
        Err(e) => {
            tracing::trace!("Compressed PNG text did not inflate: {}", e);
            COMPRESSED.to_string()
        }
    }
}

/// `tEXt`: `key\0value`.
fn parse_text(data: &[u8]) -> Option<(String, String)> {
    let (key, rest) = split_keyword(data)?;
    Some((key, decode_text(rest)))
}

/// `zTXt`: `key\0 method zlib-data`.
fn parse_ztxt(data: &[u8]) -> Option<(String, String)> {
    let (key, rest) = split_keyword(data)?;
    let (&method, compressed) = rest.split_first()?;
    if method != 0 {
        return Some((key, COMPRESSED.to_string()));
    }
    Some((key, inflate(compressed)))
}

/// `iTXt`: `key\0 flag method lang\0 translated\0 text`.
fn parse_itxt(data: &[u8]) -> Option<(String, String)> {
    let (key, rest) = split_keyword(data)?;
    if rest.len() < 2 {
        return None;
    }
    let (flag, method) = (rest[0], rest[1]);
    if flag != 0 && method != 0 {
        return Some((key, COMPRESSED.to_string()));
    }

    let rest = &rest[2..];
    let Some(lang_end) = rest.iter().position(|&b| b == 0) else {
        return Some((key, String::new()));
    };
    let rest = &rest[lang_end + 1..];
    let Some(trans_end) = rest.iter().position(|&b| b == 0) else {
        return Some((key, String::new()));
    };
    let text = &rest[trans_end + 1..];

    if flag == 1 {
        Some((key, inflate(text)))
    } else {
        Some((key, decode_text(text)))
    }
}

/// `tIME`: big-endian year, then month, day, hour, minute, second.
fn format_png_time(data: &[u8]) -> Option<String> {
    let [y0, y1, month, day, hour, minute, second] = <[u8; 7]>::try_from(data).ok()?;
    let year = u16::from_be_bytes([y0, y1]);
    Some(format!(
        "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"
    ))
}
