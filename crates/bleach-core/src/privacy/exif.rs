//! EXIF/TIFF privacy analysis for JPEG and TIFF containers.

use std::io::{Read, Seek, SeekFrom};

use super::tags::{decode_container, decode_tiff, DecodedTag};
use super::values::{key_value, push_unique};
use super::Category;
use crate::error::FormatError;
use crate::formats::jpeg::signatures::EXIF as EXIF_HEADER;
use crate::formats::sniff::is_tiff_header;
use crate::types::ScanDetail;

/// Per-file EXIF findings, grouped by privacy category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExifAnalysis {
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

impl ExifAnalysis {
    /// Build an analysis from already-decoded tags.
    pub fn from_tags<'a, I>(tags: I) -> Self
    where
        I: IntoIterator<Item = &'a DecodedTag>,
    {
        let mut analysis = Self::default();
        for tag in tags {
            analysis.record(tag);
        }
        analysis
    }

    /// Classify one tag. A tag may land in more than one category.
    pub fn record(&mut self, tag: &DecodedTag) {
        let name = tag.name.as_str();
        let entry = || key_value(name, &tag.value);
        let has_value = !tag.value.is_empty();

        if name.starts_with("GPS") || tag.ifd_path.contains("GPS") {
            self.has_gps = true;
            self.gps_count += 1;
            if has_value {
                push_unique(&mut self.gps_values, entry());
            }
        }
        if matches!(name, "Model" | "CameraModelName" | "Make") {
            self.has_model = true;
            if has_value {
                push_unique(&mut self.model_values, entry());
            }
        }
        if matches!(name, "DateTimeOriginal" | "DateTimeDigitized" | "DateTime") {
            self.has_timestamp = true;
            if has_value {
                push_unique(&mut self.timestamp_values, entry());
            }
        }
        if name.to_ascii_lowercase().contains("serial") {
            self.serial_count += 1;
            if has_value {
                push_unique(&mut self.serial_values, entry());
            }
        }
    }

    /// Leak metric used by clean mode: GPS tags plus serial-number tags.
    pub fn leak_count(&self) -> usize {
        self.gps_count + self.serial_count
    }

    pub fn is_empty(&self) -> bool {
        !self.has_gps && !self.has_model && !self.has_timestamp && self.serial_count == 0
    }

    /// Scan details in fixed category order; a category appears when its flag is set.
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

/// Analyze a JPEG or TIFF stream, or a bare EXIF payload.
///
/// The stream is rewound first. TIFF-structured input is decoded directly,
/// with or without a leading `Exif\0\0` header; anything else is treated as
/// a container holding an APP1 block. No EXIF data at all yields an empty
/// analysis.
pub fn analyze_exif<R: Read + Seek>(reader: &mut R) -> Result<ExifAnalysis, FormatError> {
    reader.seek(SeekFrom::Start(0))?;
    let mut header = Vec::with_capacity(EXIF_HEADER.len());
    reader
        .by_ref()
        .take(EXIF_HEADER.len() as u64)
        .read_to_end(&mut header)?;

    let tags = if is_tiff_header(&header) {
        reader.seek(SeekFrom::Start(0))?;
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        decode_tiff(data)?
    } else if header == EXIF_HEADER {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        decode_tiff(data)?
    } else {
        reader.seek(SeekFrom::Start(0))?;
        decode_container(reader)?
    };

    tracing::trace!("Decoded {} EXIF tags", tags.len());
    Ok(ExifAnalysis::from_tags(&tags))
}
