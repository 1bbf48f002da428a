//! PNG chunk walking and metadata stripping.
//!
//! A PNG is the 8-byte signature followed by `[len][type][data][crc]` chunks
//! and terminated by `IEND`. CRCs are carried through untouched and never
//! verified.

use std::io::{self, BufReader, BufWriter, Read, Write};

use crate::error::FormatError;

/// The 8-byte PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

const CRC_LEN: u64 = 4;

/// Length and type of one chunk; the reader is left at the start of its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub length: u32,
    pub kind: [u8; 4],
}

impl ChunkHeader {
    pub fn is(&self, kind: &[u8; 4]) -> bool {
        &self.kind == kind
    }

    pub fn is_end(&self) -> bool {
        self.is(b"IEND")
    }

    /// Chunk type as text, for logging.
    pub fn name(&self) -> String {
        String::from_utf8_lossy(&self.kind).into_owned()
    }

    fn to_bytes(self) -> [u8; 8] {
        let mut out = [0u8; 8];
        out[..4].copy_from_slice(&self.length.to_be_bytes());
        out[4..].copy_from_slice(&self.kind);
        out
    }
}

/// Read and validate the signature.
pub fn read_signature<R: Read>(reader: &mut R) -> Result<[u8; 8], FormatError> {
    let mut sig = [0u8; 8];
    reader.read_exact(&mut sig)?;
    if sig != PNG_SIGNATURE {
        return Err(FormatError::InvalidPngSignature);
    }
    Ok(sig)
}

/// Read the next chunk header.
///
/// Returns `None` when the stream ends exactly on a chunk boundary; a partial
/// length or type field is an `UnexpectedEof` error.
pub fn read_chunk_header<R: Read>(reader: &mut R) -> io::Result<Option<ChunkHeader>> {
    let mut len_buf = [0u8; 4];
    let mut filled = 0;
    while filled < len_buf.len() {
        match reader.read(&mut len_buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }

    let mut kind = [0u8; 4];
    reader.read_exact(&mut kind)?;

    Ok(Some(ChunkHeader {
        length: u32::from_be_bytes(len_buf),
        kind,
    }))
}

/// Read a chunk's data and consume its CRC.
///
/// Reads through `take` so a bogus length cannot force a huge allocation.
pub fn read_chunk_data<R: Read>(reader: &mut R, header: &ChunkHeader) -> io::Result<Vec<u8>> {
    let expected = u64::from(header.length);
    let mut data = Vec::new();
    reader.by_ref().take(expected).read_to_end(&mut data)?;
    if data.len() as u64 != expected {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("PNG chunk {} truncated", header.name()),
        ));
    }
    skip_exact(reader, CRC_LEN)?;
    Ok(data)
}

/// Skip a chunk's data and CRC.
pub fn skip_chunk<R: Read>(reader: &mut R, header: &ChunkHeader) -> io::Result<()> {
    skip_exact(reader, u64::from(header.length) + CRC_LEN)
}

fn skip_exact<R: Read>(reader: &mut R, count: u64) -> io::Result<()> {
    copy_exact(reader, &mut io::sink(), count)
}

fn copy_exact<R: Read, W: Write>(reader: &mut R, writer: &mut W, count: u64) -> io::Result<()> {
    let copied = io::copy(&mut reader.by_ref().take(count), writer)?;
    if copied != count {
        return Err(io::ErrorKind::UnexpectedEof.into());
    }
    Ok(())
}

/// Whether a chunk type is removed when cleaning.
pub fn should_drop_chunk(header: &ChunkHeader, preserve_icc: bool) -> bool {
    match &header.kind {
        b"tEXt" | b"zTXt" | b"iTXt" | b"eXIf" | b"tIME" => true,
        b"iCCP" => !preserve_icc,
        _ => false,
    }
}

/// Stream `src` into `dst`, omitting privacy-bearing chunks.
///
/// Stops after `IEND`. A stream that ends on a chunk boundary before `IEND`
/// is copied as-is.
pub fn strip_png<R: Read, W: Write>(src: R, dst: W, preserve_icc: bool) -> Result<(), FormatError> {
    let mut reader = BufReader::new(src);
    let mut writer = BufWriter::new(dst);

    let sig = read_signature(&mut reader)?;
    writer.write_all(&sig)?;

    while let Some(header) = read_chunk_header(&mut reader)? {
        if should_drop_chunk(&header, preserve_icc) {
            tracing::trace!("Dropping PNG chunk {} ({} bytes)", header.name(), header.length);
            skip_chunk(&mut reader, &header)?;
        } else {
            writer.write_all(&header.to_bytes())?;
            copy_exact(&mut reader, &mut writer, u64::from(header.length) + CRC_LEN)?;
        }

        if header.is_end() {
            break;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Build a chunk with a valid CRC so real decoders accept test fixtures.
#[cfg(test)]
pub(crate) fn chunk(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut crc = flate2::Crc::new();
    crc.update(kind);
    crc.update(data);

    let mut out = Vec::with_capacity(12 + data.len());
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    out.extend_from_slice(&crc.sum().to_be_bytes());
    out
}

/// Insert chunks right before the trailing `IEND` of an encoded PNG.
#[cfg(test)]
pub(crate) fn insert_before_iend(png: &[u8], chunks: &[Vec<u8>]) -> Vec<u8> {
    let insert_at = png.len() - 12;
    assert_eq!(&png[insert_at + 4..insert_at + 8], b"IEND");
    let mut out = png[..insert_at].to_vec();
    for c in chunks {
        out.extend_from_slice(c);
    }
    out.extend_from_slice(&png[insert_at..]);
    out
}
