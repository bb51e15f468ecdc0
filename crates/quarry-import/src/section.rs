//! Binary section scanner
//!
//! A PSK stream is a flat run of sections until EOF:
//!
//! ```text
//! ┌──────────────────────┬────────┬──────────┬──────────┬──────────────────┐
//! │ tag (20, zero-pad)   │ flags  │ stride   │ count    │ stride × count   │
//! │                      │ i32 LE │ u32 LE   │ u32 LE   │ payload bytes    │
//! └──────────────────────┴────────┴──────────┴──────────┴──────────────────┘
//! ```

use crate::cursor::RecordCursor;
use byteorder::{LittleEndian, ReadBytesExt};
use quarry_core::{QuarryError, Result};
use std::fmt;
use std::io::Read;

/// Width of the zero-padded tag field
pub const TAG_SIZE: usize = 20;

/// Bytes in one section header
pub const HEADER_SIZE: usize = TAG_SIZE + 12;

/// The format-flag constant written by every known exporter
pub const FORMAT_FLAGS: i32 = 1999801;

/// A fixed-width section identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionTag([u8; TAG_SIZE]);

impl SectionTag {
    pub fn new(raw: [u8; TAG_SIZE]) -> Self {
        Self(raw)
    }

    /// Build a tag from text, zero-padding (or cutting) it to the field width
    pub fn from_name(name: &str) -> Self {
        let mut raw = [0u8; TAG_SIZE];
        let bytes = name.as_bytes();
        let len = bytes.len().min(TAG_SIZE);
        raw[..len].copy_from_slice(&bytes[..len]);
        Self(raw)
    }

    pub fn as_bytes(&self) -> &[u8; TAG_SIZE] {
        &self.0
    }

    /// The tag text up to the first NUL
    pub fn name(&self) -> String {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(TAG_SIZE);
        String::from_utf8_lossy(&self.0[..end]).into_owned()
    }
}

impl fmt::Debug for SectionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SectionTag({:?})", self.name())
    }
}

impl fmt::Display for SectionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One header plus its payload, borrowed from the scanned stream
#[derive(Debug, Clone)]
pub struct ByteSection<'a> {
    pub tag: SectionTag,
    pub flags: i32,
    pub stride: u32,
    pub count: u32,
    /// Offset of the header within the stream
    pub offset: usize,
    pub payload: &'a [u8],
}

impl<'a> ByteSection<'a> {
    /// One cursor per fixed-size record in the payload
    pub fn records(&self) -> impl Iterator<Item = RecordCursor<'a>> {
        let stride = self.stride as usize;
        let payload = self.payload;
        (0..self.count as usize)
            .map(move |i| RecordCursor::new(&payload[i * stride..(i + 1) * stride]))
    }
}

/// Single-pass iterator over the sections of a PSK stream.
///
/// Stops after the first error; the stream is not restartable.
pub struct SectionScanner<'a> {
    data: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> SectionScanner<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            failed: false,
        }
    }

    /// Bytes consumed so far (headers plus payloads)
    pub fn consumed(&self) -> usize {
        self.offset
    }

    fn next_section(&mut self) -> Result<ByteSection<'a>> {
        let remaining = self.data.len() - self.offset;
        if remaining < HEADER_SIZE {
            return Err(QuarryError::MalformedHeader {
                offset: self.offset,
                remaining,
                needed: HEADER_SIZE,
            });
        }

        let mut header = RecordCursor::new(&self.data[self.offset..self.offset + HEADER_SIZE]);
        let mut raw_tag = [0u8; TAG_SIZE];
        header.read_exact(&mut raw_tag)?;
        let tag = SectionTag::new(raw_tag);
        let flags = header.read_i32::<LittleEndian>()?;
        let stride = header.read_u32::<LittleEndian>()?;
        let count = header.read_u32::<LittleEndian>()?;

        let payload_start = self.offset + HEADER_SIZE;
        let available = self.data.len() - payload_start;
        let needed = stride as u64 * count as u64;
        if needed > available as u64 {
            return Err(QuarryError::TruncatedPayload {
                tag: tag.name(),
                offset: self.offset,
                needed,
                remaining: available,
            });
        }

        let payload_end = payload_start + needed as usize;
        let section = ByteSection {
            tag,
            flags,
            stride,
            count,
            offset: self.offset,
            payload: &self.data[payload_start..payload_end],
        };
        self.offset = payload_end;
        Ok(section)
    }
}

impl<'a> Iterator for SectionScanner<'a> {
    type Item = Result<ByteSection<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.data.len() {
            return None;
        }
        let result = self.next_section();
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}

impl std::iter::FusedIterator for SectionScanner<'_> {}
