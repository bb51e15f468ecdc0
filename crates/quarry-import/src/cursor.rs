//! Little-endian field reads for fixed-size records

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Cursor, Read};

/// Cursor over one record or header, borrowed from the scanned stream
pub type RecordCursor<'a> = Cursor<&'a [u8]>;

/// Composite fields of the PSK record layouts, on top of `byteorder`
pub trait ReadFieldsExt: Read {
    fn read_vec2(&mut self) -> io::Result<[f32; 2]> {
        Ok([
            self.read_f32::<LittleEndian>()?,
            self.read_f32::<LittleEndian>()?,
        ])
    }

    fn read_vec3(&mut self) -> io::Result<[f32; 3]> {
        Ok([
            self.read_f32::<LittleEndian>()?,
            self.read_f32::<LittleEndian>()?,
            self.read_f32::<LittleEndian>()?,
        ])
    }

    /// Read a fixed-size, zero-padded name field. Bytes after the first NUL
    /// are dropped.
    fn read_padded(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut raw = vec![0u8; len];
        self.read_exact(&mut raw)?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(len);
        raw.truncate(end);
        Ok(raw)
    }
}

impl<R: Read + ?Sized> ReadFieldsExt for R {}
