//! Sequential little-endian readers and writers over byte slices.
//!
//! [`ByteReader`] and [`ByteWriter`] consume their slice as values are
//! decoded or encoded. Running past the end yields
//! [`ZipError::TruncatedBuffer`] carrying absolute positions, so errors
//! raised by the record views name the byte range that was missing.

use byteorder::{ByteOrder, LittleEndian};

use super::error::{Result, ZipError};

/// Little-endian reader that advances through a borrowed slice.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Create a reader positioned `offset` bytes into `buf`.
    pub fn at(buf: &'a [u8], offset: usize) -> Result<Self> {
        let mut reader = Self::new(buf);
        reader.skip(offset)?;
        Ok(reader)
    }

    /// Current position relative to the start of the slice.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to consume.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// The unread tail, without advancing.
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    /// Return the next `n` bytes and advance past them.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or(ZipError::TruncatedBuffer {
            needed: usize::MAX,
            available: self.buf.len(),
        })?;
        if end > self.buf.len() {
            return Err(ZipError::TruncatedBuffer {
                needed: end,
                available: self.buf.len(),
            });
        }
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }
}

/// Little-endian writer that advances through a mutable slice.
#[derive(Debug)]
pub struct ByteWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> ByteWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Create a writer positioned `offset` bytes into `buf`.
    pub fn at(buf: &'a mut [u8], offset: usize) -> Result<Self> {
        let mut writer = Self::new(buf);
        writer.take(offset)?;
        Ok(writer)
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Return the next `n` bytes for writing and advance past them.
    pub fn take(&mut self, n: usize) -> Result<&mut [u8]> {
        let end = match self.pos.checked_add(n) {
            Some(end) if end <= self.buf.len() => end,
            _ => {
                return Err(ZipError::TruncatedBuffer {
                    needed: self.pos.saturating_add(n),
                    available: self.buf.len(),
                });
            }
        };
        let start = self.pos;
        self.pos = end;
        Ok(&mut self.buf[start..end])
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.take(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    pub fn write_u8(&mut self, v: u8) -> Result<()> {
        self.take(1)?[0] = v;
        Ok(())
    }

    pub fn write_u16(&mut self, v: u16) -> Result<()> {
        LittleEndian::write_u16(self.take(2)?, v);
        Ok(())
    }

    pub fn write_u32(&mut self, v: u32) -> Result<()> {
        LittleEndian::write_u32(self.take(4)?, v);
        Ok(())
    }

    pub fn write_u64(&mut self, v: u64) -> Result<()> {
        LittleEndian::write_u64(self.take(8)?, v);
        Ok(())
    }
}

pub(crate) fn read_u16_at(buf: &[u8], offset: usize) -> Result<u16> {
    ByteReader::at(buf, offset)?.read_u16()
}

pub(crate) fn read_u32_at(buf: &[u8], offset: usize) -> Result<u32> {
    ByteReader::at(buf, offset)?.read_u32()
}

pub(crate) fn write_u16_at(buf: &mut [u8], offset: usize, v: u16) -> Result<()> {
    ByteWriter::at(buf, offset)?.write_u16(v)
}

pub(crate) fn write_u32_at(buf: &mut [u8], offset: usize, v: u32) -> Result<()> {
    ByteWriter::at(buf, offset)?.write_u32(v)
}
