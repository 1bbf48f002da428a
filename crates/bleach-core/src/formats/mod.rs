//! Container formats: signature sniffing and byte-level metadata strippers.
//!
//! - **sniff**: classify a stream by its first 8 bytes
//! - **jpeg**: marker-segment walker that drops EXIF/XMP/IPTC/ICC segments
//! - **png**: chunk walker that drops text, time, EXIF and ICC chunks
//!
//! None of these decode pixel data. Everything that is not dropped is copied
//! byte-for-byte.

pub mod jpeg;
pub mod png;
pub mod sniff;

pub use jpeg::strip_jpeg;
pub use png::strip_png;
pub use sniff::{sniff, Kind};

/// Whether `buf` starts with `prefix`.
pub(crate) fn has_prefix(buf: &[u8], prefix: &[u8]) -> bool {
    buf.len() >= prefix.len() && &buf[..prefix.len()] == prefix
}
