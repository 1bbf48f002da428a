//! Magic-number format detection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Read};

use super::has_prefix;
use super::png::PNG_SIGNATURE;
use crate::error::FormatError;

/// Number of header bytes needed to classify a stream.
pub const HEADER_LEN: usize = 8;

const JPEG_SIGNATURE: [u8; 3] = [0xFF, 0xD8, 0xFF];
const TIFF_SIGNATURE_LE: [u8; 4] = [0x49, 0x49, 0x2A, 0x00];
const TIFF_SIGNATURE_BE: [u8; 4] = [0x4D, 0x4D, 0x00, 0x2A];

/// Image container family, decided once per file from its signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Unknown,
    Jpeg,
    Png,
    Tiff,
}

impl Kind {
    /// Classify an 8-byte header.
    pub fn from_header(header: &[u8]) -> Result<Self, FormatError> {
        if header.len() < HEADER_LEN {
            return Err(FormatError::TruncatedHeader(header.len()));
        }

        if has_prefix(header, &JPEG_SIGNATURE) {
            return Ok(Self::Jpeg);
        }
        if has_prefix(header, &PNG_SIGNATURE) {
            return Ok(Self::Png);
        }
        if is_tiff_header(header) {
            return Ok(Self::Tiff);
        }

        Ok(Self::Unknown)
    }

    /// Whether files of this kind enter the pipeline at all.
    pub fn is_supported(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Tiff => "tiff",
        };
        f.write_str(name)
    }
}

/// Little- or big-endian TIFF header (`II*\0` / `MM\0*`).
pub fn is_tiff_header(header: &[u8]) -> bool {
    has_prefix(header, &TIFF_SIGNATURE_LE) || has_prefix(header, &TIFF_SIGNATURE_BE)
}

/// Read the first 8 bytes from `reader` and classify them.
///
/// An empty or truncated stream surfaces as `UnexpectedEof`.
pub fn sniff<R: Read>(reader: &mut R) -> Result<Kind, FormatError> {
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            FormatError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "file shorter than 8-byte signature",
            ))
        } else {
            FormatError::Io(e)
        }
    })?;
    Kind::from_header(&header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_sniff_jpeg() {
        let header = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F'];
        assert_eq!(Kind::from_header(&header).unwrap(), Kind::Jpeg);
    }

    #[test]
    fn test_sniff_png() {
        assert_eq!(Kind::from_header(&PNG_SIGNATURE).unwrap(), Kind::Png);
    }

    #[test]
    fn test_sniff_png_requires_full_signature() {
        let header = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x00];
        assert_eq!(Kind::from_header(&header).unwrap(), Kind::Unknown);
    }

    #[test]
    fn test_sniff_tiff_both_byte_orders() {
        let le = [b'I', b'I', 0x2A, 0x00, 8, 0, 0, 0];
        let be = [b'M', b'M', 0x00, 0x2A, 0, 0, 0, 8];
        assert_eq!(Kind::from_header(&le).unwrap(), Kind::Tiff);
        assert_eq!(Kind::from_header(&be).unwrap(), Kind::Tiff);
    }

    #[test]
    fn test_sniff_bare_ii_rejected() {
        let header = [b'I', b'I', 0x00, 0x00, 0, 0, 0, 0];
        assert_eq!(Kind::from_header(&header).unwrap(), Kind::Unknown);
    }

    #[test]
    fn test_sniff_unknown() {
        assert_eq!(Kind::from_header(b"GIF89a\0\0").unwrap(), Kind::Unknown);
        assert!(!Kind::Unknown.is_supported());
    }

    #[test]
    fn test_sniff_short_header_is_error() {
        assert!(matches!(
            Kind::from_header(&[0xFF, 0xD8, 0xFF]),
            Err(FormatError::TruncatedHeader(3))
        ));
    }

    #[test]
    fn test_sniff_reader_truncated() {
        let mut reader = Cursor::new(vec![0xFF, 0xD8]);
        let err = sniff(&mut reader).unwrap_err();
        match err {
            FormatError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_sniff_reader_consumes_header_only() {
        let mut data = PNG_SIGNATURE.to_vec();
        data.extend_from_slice(b"rest");
        let mut reader = Cursor::new(data);
        assert_eq!(sniff(&mut reader).unwrap(), Kind::Png);
        assert_eq!(reader.position(), 8);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(Kind::Jpeg.to_string(), "jpeg");
        assert_eq!(Kind::Tiff.to_string(), "tiff");
    }
}
