//! Privacy analysis: find what personally-identifying metadata a file carries.
//!
//! - **tags**: flat EXIF/TIFF tag decoding
//! - **exif**: categorize decoded tags (JPEG and TIFF containers)
//! - **png**: categorize PNG text, time and embedded EXIF chunks
//! - **insights**: human-readable statements derived from category values

pub mod exif;
pub mod insights;
pub mod png;
pub mod tags;
pub mod values;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use self::exif::{analyze_exif, ExifAnalysis};
pub use self::insights::build_insights;
pub use self::png::{analyze_png, PngAnalysis};

/// Privacy category reported in scan details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "GPS")]
    Gps,
    #[serde(rename = "Device Model")]
    DeviceModel,
    #[serde(rename = "Timestamp")]
    Timestamp,
    #[serde(rename = "Serial Numbers")]
    Identifier,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gps => "GPS",
            Self::DeviceModel => "Device Model",
            Self::Timestamp => "Timestamp",
            Self::Identifier => "Serial Numbers",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
