//! Flat EXIF/TIFF tag decoding on top of `kamadak-exif`.
//!
//! The analyzers only need `(name, IFD path, value)` triples; IFD pointer
//! resolution is left entirely to the decoder.

use ::exif::{Context, Field, In, Reader, Tag, Value};
use std::io::{BufReader, Read, Seek};

use crate::error::FormatError;

/// Message the decoder gives for a stream it cannot identify.
const UNKNOWN_CONTAINER: &str = "Unknown image format";

/// One decoded tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTag {
    /// Tag name as known to the decoder (e.g. `GPSLatitude`)
    pub name: String,
    /// Slash-separated IFD path (e.g. `IFD0/GPSInfo`)
    pub ifd_path: String,
    /// Textual value; empty when the tag carries nothing printable
    pub value: String,
}

/// Decode a raw TIFF byte buffer.
pub fn decode_tiff(data: Vec<u8>) -> Result<Vec<DecodedTag>, FormatError> {
    collect(Reader::new().read_raw(data))
}

/// Decode the EXIF block embedded in a container stream (JPEG APP1).
pub fn decode_container<R: Read + Seek>(reader: &mut R) -> Result<Vec<DecodedTag>, FormatError> {
    let mut buffered = BufReader::new(reader);
    collect(Reader::new().read_from_container(&mut buffered))
}

fn collect(parsed: Result<::exif::Exif, ::exif::Error>) -> Result<Vec<DecodedTag>, FormatError> {
    let exif = match parsed {
        Ok(exif) => exif,
        // No EXIF block at all is a normal, empty result, as is a payload
        // that is neither TIFF nor a container the decoder knows.
        Err(::exif::Error::NotFound(_)) => return Ok(Vec::new()),
        Err(::exif::Error::InvalidFormat(UNKNOWN_CONTAINER)) => return Ok(Vec::new()),
        Err(e) => return Err(FormatError::Exif(e.to_string())),
    };

    Ok(exif
        .fields()
        .filter(|field| !is_ifd_pointer(field.tag))
        .map(|field| DecodedTag {
            name: field.tag.to_string(),
            ifd_path: ifd_path(field),
            value: render_value(field),
        })
        .collect())
}

/// Offsets to sub-IFDs are structure, not metadata.
fn is_ifd_pointer(tag: Tag) -> bool {
    tag == Tag::ExifIFDPointer || tag == Tag::GPSInfoIFDPointer || tag == Tag::InteropIFDPointer
}

fn ifd_path(field: &Field) -> String {
    let root = if field.ifd_num == In::PRIMARY {
        "IFD0".to_string()
    } else {
        format!("IFD{}", field.ifd_num.index())
    };

    let context = field.tag.context();
    if context == Context::Exif {
        format!("{root}/Exif")
    } else if context == Context::Gps {
        format!("{root}/GPSInfo")
    } else if context == Context::Interop {
        format!("{root}/Exif/Iop")
    } else {
        root
    }
}

/// Render a value the way EXIF tools print it: strings without NUL padding,
/// rationals as `num/den`, multi-element values as `[a b c]`.
pub fn render_value(field: &Field) -> String {
    let parts: Vec<String> = match &field.value {
        Value::Ascii(strings) => {
            let joined = strings
                .iter()
                .map(|s| String::from_utf8_lossy(s).trim_end_matches('\0').to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            return joined.trim().to_string();
        }
        Value::Byte(v) => v.iter().map(u8::to_string).collect(),
        Value::Short(v) => v.iter().map(u16::to_string).collect(),
        Value::Long(v) => v.iter().map(u32::to_string).collect(),
        Value::SByte(v) => v.iter().map(i8::to_string).collect(),
        Value::SShort(v) => v.iter().map(i16::to_string).collect(),
        Value::SLong(v) => v.iter().map(i32::to_string).collect(),
        Value::Float(v) => v.iter().map(f32::to_string).collect(),
        Value::Double(v) => v.iter().map(f64::to_string).collect(),
        Value::Rational(v) => v.iter().map(|r| format!("{}/{}", r.num, r.denom)).collect(),
        Value::SRational(v) => v.iter().map(|r| format!("{}/{}", r.num, r.denom)).collect(),
        _ => return field.display_value().to_string().trim().to_string(),
    };

    match parts.len() {
        0 => String::new(),
        1 => parts.into_iter().next().unwrap_or_default(),
        _ => format!("[{}]", parts.join(" ")),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub enum Entry {
        Ascii(&'static str),
        Rationals(Vec<(u32, u32)>),
    }

    pub const TAG_MAKE: u16 = 0x010F;
    pub const TAG_MODEL: u16 = 0x0110;
    pub const TAG_DATETIME: u16 = 0x0132;
    pub const TAG_EXIF_POINTER: u16 = 0x8769;
    pub const TAG_GPS_POINTER: u16 = 0x8825;
    pub const TAG_DATETIME_ORIGINAL: u16 = 0x9003;
    pub const TAG_BODY_SERIAL: u16 = 0xA431;
    pub const TAG_GPS_LAT_REF: u16 = 0x0001;
    pub const TAG_GPS_LAT: u16 = 0x0002;
    pub const TAG_GPS_LON_REF: u16 = 0x0003;
    pub const TAG_GPS_LON: u16 = 0x0004;

    /// Little-endian TIFF: IFD0 entries plus optional Exif and GPS sub-IFDs.
    pub fn tiff(ifd0: &[(u16, Entry)], exif: &[(u16, Entry)], gps: &[(u16, Entry)]) -> Vec<u8> {
        let ifd_size = |n: usize| if n == 0 { 0 } else { 2 + 12 * n + 4 };
        let ifd0_len = ifd0.len() + usize::from(!exif.is_empty()) + usize::from(!gps.is_empty());
        let exif_at = 8 + ifd_size(ifd0_len);
        let gps_at = exif_at + ifd_size(exif.len());
        let mut data_offset = gps_at + ifd_size(gps.len());
        let mut blobs = Vec::new();

        let mut main: Vec<Vec<u8>> = Vec::new();
        let mut tags: Vec<(u16, Vec<u8>)> = ifd0
            .iter()
            .map(|(tag, value)| (*tag, entry(*tag, value, &mut data_offset, &mut blobs)))
            .collect();
        if !exif.is_empty() {
            tags.push((TAG_EXIF_POINTER, pointer(TAG_EXIF_POINTER, exif_at as u32)));
        }
        if !gps.is_empty() {
            tags.push((TAG_GPS_POINTER, pointer(TAG_GPS_POINTER, gps_at as u32)));
        }
        tags.sort_by_key(|(tag, _)| *tag);
        main.extend(tags.into_iter().map(|(_, e)| e));

        let exif_entries: Vec<Vec<u8>> = exif
            .iter()
            .map(|(tag, value)| entry(*tag, value, &mut data_offset, &mut blobs))
            .collect();
        let gps_entries: Vec<Vec<u8>> = gps
            .iter()
            .map(|(tag, value)| entry(*tag, value, &mut data_offset, &mut blobs))
            .collect();

        let mut out = vec![b'I', b'I', 0x2A, 0x00];
        out.extend_from_slice(&8u32.to_le_bytes());
        for ifd in [&main, &exif_entries, &gps_entries] {
            if ifd.is_empty() {
                continue;
            }
            out.extend_from_slice(&(ifd.len() as u16).to_le_bytes());
            for e in ifd.iter() {
                out.extend_from_slice(e);
            }
            out.extend_from_slice(&0u32.to_le_bytes());
        }
        for blob in blobs {
            out.extend_from_slice(&blob);
        }
        out
    }

    fn pointer(tag: u16, offset: u32) -> Vec<u8> {
        let mut e = Vec::with_capacity(12);
        e.extend_from_slice(&tag.to_le_bytes());
        e.extend_from_slice(&4u16.to_le_bytes());
        e.extend_from_slice(&1u32.to_le_bytes());
        e.extend_from_slice(&offset.to_le_bytes());
        e
    }

    fn entry(
        tag: u16,
        value: &Entry,
        data_offset: &mut usize,
        blobs: &mut Vec<Vec<u8>>,
    ) -> Vec<u8> {
        let (kind, count, bytes) = match value {
            Entry::Ascii(text) => {
                let mut bytes = text.as_bytes().to_vec();
                bytes.push(0);
                (2u16, bytes.len() as u32, bytes)
            }
            Entry::Rationals(values) => {
                let mut bytes = Vec::new();
                for (num, den) in values {
                    bytes.extend_from_slice(&num.to_le_bytes());
                    bytes.extend_from_slice(&den.to_le_bytes());
                }
                (5u16, values.len() as u32, bytes)
            }
        };

        let mut e = Vec::with_capacity(12);
        e.extend_from_slice(&tag.to_le_bytes());
        e.extend_from_slice(&kind.to_le_bytes());
        e.extend_from_slice(&count.to_le_bytes());
        if bytes.len() <= 4 {
            let mut inline = bytes;
            inline.resize(4, 0);
            e.extend_from_slice(&inline);
        } else {
            e.extend_from_slice(&(*data_offset as u32).to_le_bytes());
            let mut blob = bytes;
            if blob.len() % 2 == 1 {
                blob.push(0);
            }
            *data_offset += blob.len();
            blobs.push(blob);
        }
        e
    }

    /// Model + DateTime, the minimal camera fingerprint.
    pub fn camera_tiff() -> Vec<u8> {
        tiff(
            &[
                (TAG_MODEL, Entry::Ascii("TestCam")),
                (TAG_DATETIME, Entry::Ascii("2024:01:02 03:04:05")),
            ],
            &[],
            &[],
        )
    }

    /// Phone shot: Make/Model, DateTimeOriginal, a body serial and a Paris GPS fix.
    pub fn gps_tiff() -> Vec<u8> {
        tiff(
            &[
                (TAG_MAKE, Entry::Ascii("Apple")),
                (TAG_MODEL, Entry::Ascii("iPhone 15")),
            ],
            &[
                (TAG_DATETIME_ORIGINAL, Entry::Ascii("2024:01:02 03:04:05")),
                (TAG_BODY_SERIAL, Entry::Ascii("SN12345")),
            ],
            &[
                (TAG_GPS_LAT_REF, Entry::Ascii("N")),
                (TAG_GPS_LAT, Entry::Rationals(vec![(48, 1), (51, 1), (30, 1)])),
                (TAG_GPS_LON_REF, Entry::Ascii("E")),
                (TAG_GPS_LON, Entry::Rationals(vec![(2, 1), (20, 1), (0, 1)])),
            ],
        )
    }

    /// Wrap TIFF bytes in a minimal SOI + APP1 + EOI JPEG.
    pub fn jpeg_with_exif(tiff: &[u8]) -> Vec<u8> {
        let mut payload = b"Exif\0\0".to_vec();
        payload.extend_from_slice(tiff);
        let mut out = vec![0xFF, 0xD8];
        out.extend_from_slice(&crate::formats::jpeg::segment(0xE1, &payload));
        out.extend_from_slice(&[0xFF, 0xD9]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_decode_tiff_ifd0_strings() {
        let tags = decode_tiff(camera_tiff()).unwrap();
        let model = tags.iter().find(|t| t.name == "Model").unwrap();
        assert_eq!(model.value, "TestCam");
        assert_eq!(model.ifd_path, "IFD0");
        let dt = tags.iter().find(|t| t.name == "DateTime").unwrap();
        assert_eq!(dt.value, "2024:01:02 03:04:05");
    }

    #[test]
    fn test_decode_tiff_gps_rationals() {
        let tags = decode_tiff(gps_tiff()).unwrap();
        let lat = tags.iter().find(|t| t.name == "GPSLatitude").unwrap();
        assert_eq!(lat.value, "[48/1 51/1 30/1]");
        assert_eq!(lat.ifd_path, "IFD0/GPSInfo");
        let lat_ref = tags.iter().find(|t| t.name == "GPSLatitudeRef").unwrap();
        assert_eq!(lat_ref.value, "N");
    }

    #[test]
    fn test_decode_tiff_exif_subifd() {
        let tags = decode_tiff(gps_tiff()).unwrap();
        let original = tags.iter().find(|t| t.name == "DateTimeOriginal").unwrap();
        assert_eq!(original.ifd_path, "IFD0/Exif");
        assert!(tags.iter().any(|t| t.name == "BodySerialNumber" && t.value == "SN12345"));
        assert!(!tags.iter().any(|t| t.name.ends_with("IFDPointer")));
    }

    #[test]
    fn test_decode_container_jpeg() {
        let mut reader = Cursor::new(jpeg_with_exif(&camera_tiff()));
        let tags = decode_container(&mut reader).unwrap();
        assert!(tags.iter().any(|t| t.name == "Model" && t.value == "TestCam"));
    }

    #[test]
    fn test_decode_container_without_exif_is_empty() {
        let mut reader = Cursor::new(vec![0xFF, 0xD8, 0xFF, 0xD9]);
        assert!(decode_container(&mut reader).unwrap().is_empty());
    }

    #[test]
    fn test_decode_container_unknown_format_is_empty() {
        let mut reader = Cursor::new(b"not an image".to_vec());
        assert!(decode_container(&mut reader).unwrap().is_empty());
    }
}
