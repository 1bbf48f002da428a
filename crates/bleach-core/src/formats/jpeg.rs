//! JPEG metadata stripping.
//!
//! JPEG files are a sequence of `FF xx` marker segments. The stripper is a
//! single forward pass: every segment is copied verbatim except APP1 (EXIF,
//! XMP), APP13 (Photoshop IRB / IPTC) and APP2 (ICC profile) segments whose
//! payload starts with a known metadata signature. Once Start-Of-Scan is
//! reached the remainder of the file is copied without interpretation.

use std::io::{self, BufReader, BufWriter, Read, Write};

use super::has_prefix;
use crate::error::FormatError;

/// JPEG marker bytes.
mod markers {
    pub const PREFIX: u8 = 0xFF;

    pub const TEM: u8 = 0x01;
    pub const RST0: u8 = 0xD0;
    pub const RST7: u8 = 0xD7;
    pub const SOI: u8 = 0xD8;
    pub const EOI: u8 = 0xD9;
    pub const SOS: u8 = 0xDA;

    pub const APP1: u8 = 0xE1;
    pub const APP2: u8 = 0xE2;
    pub const APP13: u8 = 0xED;
}

/// Payload signatures of the segments that get dropped.
pub mod signatures {
    pub const EXIF: &[u8] = b"Exif\0\0";
    pub const XMP: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";
    pub const XMP_EXTENSION: &[u8] = b"http://ns.adobe.com/xmp/extension/\0";
    pub const PHOTOSHOP: &[u8] = b"Photoshop 3.0\0";
    pub const ICC_PROFILE: &[u8] = b"ICC_PROFILE\0";
}

/// Markers without a length field.
fn is_standalone_marker(marker: u8) -> bool {
    marker == markers::TEM || (markers::RST0..=markers::RST7).contains(&marker)
}

/// Markers whose payload has to be buffered and inspected.
fn is_inspected_marker(marker: u8) -> bool {
    matches!(marker, markers::APP1 | markers::APP2 | markers::APP13)
}

/// Decide whether an inspected segment carries privacy metadata.
pub fn should_drop_segment(marker: u8, payload: &[u8], preserve_icc: bool) -> bool {
    match marker {
        markers::APP1 => {
            has_prefix(payload, signatures::EXIF)
                || has_prefix(payload, signatures::XMP)
                || has_prefix(payload, signatures::XMP_EXTENSION)
        }
        markers::APP13 => has_prefix(payload, signatures::PHOTOSHOP),
        markers::APP2 => !preserve_icc && has_prefix(payload, signatures::ICC_PROFILE),
        _ => false,
    }
}

fn read_byte<R: Read>(reader: &mut R) -> io::Result<u8> {
    let mut byte = [0u8; 1];
    reader.read_exact(&mut byte)?;
    Ok(byte[0])
}

/// Stream `src` into `dst`, omitting metadata segments.
///
/// Fails if the stream does not begin with SOI, if a segment declares a
/// length below 2, or if the stream ends before EOI/SOS.
pub fn strip_jpeg<R: Read, W: Write>(
    src: R,
    dst: W,
    preserve_icc: bool,
) -> Result<(), FormatError> {
    let mut reader = BufReader::new(src);
    let mut writer = BufWriter::new(dst);

    let mut soi = [0u8; 2];
    reader.read_exact(&mut soi)?;
    if soi != [markers::PREFIX, markers::SOI] {
        return Err(FormatError::InvalidJpegSoi);
    }
    writer.write_all(&soi)?;

    loop {
        // Skip fill bytes up to the next marker prefix, then any padding.
        let mut byte = read_byte(&mut reader)?;
        while byte != markers::PREFIX {
            byte = read_byte(&mut reader)?;
        }
        let mut marker = read_byte(&mut reader)?;
        while marker == markers::PREFIX {
            marker = read_byte(&mut reader)?;
        }

        match marker {
            markers::EOI => {
                writer.write_all(&[markers::PREFIX, markers::EOI])?;
                break;
            }
            markers::SOS => {
                // Entropy-coded data follows; nothing downstream is rewritten.
                writer.write_all(&[markers::PREFIX, markers::SOS])?;
                io::copy(&mut reader, &mut writer)?;
                break;
            }
            m if is_standalone_marker(m) => {
                writer.write_all(&[markers::PREFIX, m])?;
                continue;
            }
            _ => {}
        }

        let mut len_buf = [0u8; 2];
        reader.read_exact(&mut len_buf)?;
        let length = u16::from_be_bytes(len_buf);
        if length < 2 {
            return Err(FormatError::InvalidSegmentLength { marker, length });
        }
        let payload_len = u64::from(length - 2);

        if is_inspected_marker(marker) {
            let mut payload = vec![0u8; payload_len as usize];
            reader.read_exact(&mut payload)?;

            if should_drop_segment(marker, &payload, preserve_icc) {
                tracing::trace!("Dropping JPEG segment 0x{:02X} ({} bytes)", marker, length);
                continue;
            }

            writer.write_all(&[markers::PREFIX, marker])?;
            writer.write_all(&len_buf)?;
            writer.write_all(&payload)?;
            continue;
        }

        writer.write_all(&[markers::PREFIX, marker])?;
        writer.write_all(&len_buf)?;
        let copied = io::copy(&mut (&mut reader).take(payload_len), &mut writer)?;
        if copied != payload_len {
            return Err(FormatError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("JPEG segment 0x{marker:02X} truncated"),
            )));
        }
    }

    writer.flush()?;
    Ok(())
}

/// Build a single `FF <marker> <len> <payload>` segment.
#[cfg(test)]
pub(crate) fn segment(marker: u8, payload: &[u8]) -> Vec<u8> {
    let length = (payload.len() + 2) as u16;
    let mut out = vec![markers::PREFIX, marker];
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(payload);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const APP0_JFIF: &[u8] = b"JFIF\0\x01\x01\0\0\x01\0\x01\0\0";
    const DQT: u8 = 0xDB;
    const COM: u8 = 0xFE;

    fn strip(data: &[u8], preserve_icc: bool) -> Result<Vec<u8>, FormatError> {
        let mut out = Vec::new();
        strip_jpeg(Cursor::new(data), &mut out, preserve_icc)?;
        Ok(out)
    }

    fn jpeg_with(segments: &[Vec<u8>], scan: &[u8]) -> Vec<u8> {
        let mut data = vec![0xFF, markers::SOI];
        for seg in segments {
            data.extend_from_slice(seg);
        }
        data.extend_from_slice(scan);
        data
    }

    fn scan_tail() -> Vec<u8> {
        // SOS header + entropy data containing a stuffed FF00, a restart
        // marker and finally EOI.
        let mut tail = segment(markers::SOS, &[0x01, 0x01, 0x00, 0x00, 0x3F, 0x00]);
        tail.extend_from_slice(&[0x12, 0xFF, 0x00, 0x34, 0xFF, 0xD0, 0x56, 0xFF, 0xD9]);
        tail
    }

    #[test]
    fn test_strip_drops_exif_segment() {
        let mut exif = signatures::EXIF.to_vec();
        exif.extend_from_slice(b"II*\0\x08\0\0\0");
        let data = jpeg_with(
            &[segment(0xE0, APP0_JFIF), segment(markers::APP1, &exif)],
            &scan_tail(),
        );

        let out = strip(&data, false).unwrap();
        let expected = jpeg_with(&[segment(0xE0, APP0_JFIF)], &scan_tail());
        assert_eq!(out, expected);
    }

    #[test]
    fn test_strip_drops_xmp_and_photoshop() {
        let mut xmp = signatures::XMP.to_vec();
        xmp.extend_from_slice(b"<x:xmpmeta/>");
        let mut ext = signatures::XMP_EXTENSION.to_vec();
        ext.extend_from_slice(b"GUID");
        let mut irb = signatures::PHOTOSHOP.to_vec();
        irb.extend_from_slice(b"8BIM\x04\x04");

        let data = jpeg_with(
            &[
                segment(markers::APP1, &xmp),
                segment(markers::APP1, &ext),
                segment(markers::APP13, &irb),
            ],
            &scan_tail(),
        );

        let out = strip(&data, false).unwrap();
        assert_eq!(out, jpeg_with(&[], &scan_tail()));
    }

    #[test]
    fn test_strip_keeps_unrecognized_app_segments() {
        let other_app1 = segment(markers::APP1, b"SomethingElse\0");
        let other_app13 = segment(markers::APP13, b"Adobe_CM\0");
        let comment = segment(COM, b"hello");
        let dqt = segment(DQT, &[0u8; 65]);
        let segments = vec![other_app1, other_app13, comment, dqt];
        let data = jpeg_with(&segments, &scan_tail());

        assert_eq!(strip(&data, false).unwrap(), data);
    }

    #[test]
    fn test_strip_icc_profile_respects_preserve_flag() {
        let mut icc = signatures::ICC_PROFILE.to_vec();
        icc.extend_from_slice(&[1, 1, 0, 0, 0, 0]);
        let data = jpeg_with(&[segment(markers::APP2, &icc)], &scan_tail());

        assert_eq!(strip(&data, false).unwrap(), jpeg_with(&[], &scan_tail()));
        assert_eq!(strip(&data, true).unwrap(), data);
    }

    #[test]
    fn test_strip_copies_scan_data_verbatim() {
        let mut data = jpeg_with(&[], &scan_tail());
        // Trailing bytes after EOI are part of "the rest of the file".
        data.extend_from_slice(b"trailer");
        assert_eq!(strip(&data, false).unwrap(), data);
    }

    #[test]
    fn test_strip_handles_standalone_and_padding() {
        let mut data = vec![0xFF, markers::SOI];
        data.extend_from_slice(&[0xFF, 0xFF, 0xFF, markers::RST0]);
        data.extend_from_slice(&[0xFF, markers::TEM]);
        data.extend_from_slice(&[0xFF, markers::EOI]);

        let out = strip(&data, false).unwrap();
        assert_eq!(
            out,
            vec![0xFF, markers::SOI, 0xFF, markers::RST0, 0xFF, markers::TEM, 0xFF, markers::EOI]
        );
    }

    #[test]
    fn test_strip_rejects_missing_soi() {
        let data = [0x89, b'P', b'N', b'G', 0, 0, 0, 0];
        assert!(matches!(strip(&data, false), Err(FormatError::InvalidJpegSoi)));
    }

    #[test]
    fn test_strip_rejects_short_segment_length() {
        let data = [0xFF, markers::SOI, 0xFF, DQT, 0x00, 0x01, 0xFF, markers::EOI];
        assert!(matches!(
            strip(&data, false),
            Err(FormatError::InvalidSegmentLength {
                marker: DQT,
                length: 1
            })
        ));
    }

    #[test]
    fn test_strip_truncated_segment_is_error() {
        let mut data = vec![0xFF, markers::SOI];
        data.extend_from_slice(&[0xFF, DQT, 0x00, 0x10, 1, 2, 3]);
        assert!(matches!(strip(&data, false), Err(FormatError::Io(_))));
    }

    #[test]
    fn test_strip_truncated_exif_payload_is_error() {
        let mut data = vec![0xFF, markers::SOI];
        data.extend_from_slice(&[0xFF, markers::APP1, 0x00, 0x40]);
        data.extend_from_slice(signatures::EXIF);
        assert!(matches!(strip(&data, false), Err(FormatError::Io(_))));
    }

    #[test]
    fn test_strip_preserves_decoded_pixels() {
        use image::codecs::jpeg::JpegEncoder;
        use image::{ExtendedColorType, RgbImage};

        let img = RgbImage::from_fn(16, 16, |x, y| {
            image::Rgb([(x * 16) as u8, (y * 16) as u8, 128])
        });
        let mut encoded = Vec::new();
        JpegEncoder::new_with_quality(&mut encoded, 90)
            .encode(img.as_raw(), 16, 16, ExtendedColorType::Rgb8)
            .unwrap();

        let mut exif = signatures::EXIF.to_vec();
        exif.extend_from_slice(b"MM\0*\0\0\0\x08\0\0\0\0\0\0");
        let mut with_exif = encoded[..2].to_vec();
        with_exif.extend_from_slice(&segment(markers::APP1, &exif));
        with_exif.extend_from_slice(&encoded[2..]);

        let cleaned = strip(&with_exif, false).unwrap();
        assert_eq!(cleaned, encoded);

        let before = image::load_from_memory(&with_exif).unwrap().to_rgb8();
        let after = image::load_from_memory(&cleaned).unwrap().to_rgb8();
        assert_eq!(before.dimensions(), after.dimensions());
        assert_eq!(before.as_raw(), after.as_raw());
    }
}
