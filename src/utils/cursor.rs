// Bounds-checked integer access over a byte buffer
//
// FLAC block lengths are big-endian 24-bit, MP4 atom sizes are big-endian
// 32-bit and Vorbis comment lengths are little-endian 32-bit, so every
// multi-byte accessor takes the byte order explicitly.

use std::ops::Range;

use crate::error::{MuxError, Result};

/// Byte order of a multi-byte field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

/// Read/write view over a fixed-length buffer.
///
/// Offsets are absolute. An access that does not fit the buffer fails with
/// [`MuxError::OutOfBounds`]; nothing is truncated or wrapped.
#[derive(Debug)]
pub struct ByteCursor<B> {
    buf: B,
}

impl<B: AsRef<[u8]>> ByteCursor<B> {
    pub fn new(buf: B) -> Self {
        ByteCursor { buf }
    }

    pub fn len(&self) -> usize {
        self.buf.as_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_inner(self) -> B {
        self.buf
    }

    fn range(&self, offset: usize, len: usize) -> Result<Range<usize>> {
        let available = self.len();
        match offset.checked_add(len) {
            Some(end) if end <= available => Ok(offset..end),
            _ => Err(MuxError::OutOfBounds {
                offset,
                len,
                available,
            }),
        }
    }

    /// Borrow `len` bytes starting at `offset`.
    pub fn slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let range = self.range(offset, len)?;
        Ok(&self.buf.as_ref()[range])
    }

    fn array<const N: usize>(&self, offset: usize) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.slice(offset, N)?);
        Ok(out)
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8> {
        Ok(self.array::<1>(offset)?[0])
    }

    pub fn read_u16(&self, offset: usize, endian: Endian) -> Result<u16> {
        let bytes = self.array::<2>(offset)?;
        Ok(match endian {
            Endian::Big => u16::from_be_bytes(bytes),
            Endian::Little => u16::from_le_bytes(bytes),
        })
    }

    pub fn read_u24(&self, offset: usize, endian: Endian) -> Result<u32> {
        let [a, b, c] = self.array::<3>(offset)?;
        Ok(match endian {
            Endian::Big => u32::from_be_bytes([0, a, b, c]),
            Endian::Little => u32::from_le_bytes([a, b, c, 0]),
        })
    }

    pub fn read_u32(&self, offset: usize, endian: Endian) -> Result<u32> {
        let bytes = self.array::<4>(offset)?;
        Ok(match endian {
            Endian::Big => u32::from_be_bytes(bytes),
            Endian::Little => u32::from_le_bytes(bytes),
        })
    }

    pub fn read_u64(&self, offset: usize, endian: Endian) -> Result<u64> {
        let bytes = self.array::<8>(offset)?;
        Ok(match endian {
            Endian::Big => u64::from_be_bytes(bytes),
            Endian::Little => u64::from_le_bytes(bytes),
        })
    }

    /// Read a four-character code (atom type)
    pub fn read_fourcc(&self, offset: usize) -> Result<[u8; 4]> {
        self.array::<4>(offset)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> ByteCursor<B> {
    fn put(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        let range = self.range(offset, bytes.len())?;
        self.buf.as_mut()[range].copy_from_slice(bytes);
        Ok(())
    }

    pub fn write_u8(&mut self, offset: usize, value: u8) -> Result<()> {
        self.put(offset, &[value])
    }

    pub fn write_u16(&mut self, offset: usize, value: u16, endian: Endian) -> Result<()> {
        match endian {
            Endian::Big => self.put(offset, &value.to_be_bytes()),
            Endian::Little => self.put(offset, &value.to_le_bytes()),
        }
    }

    /// Write the low 24 bits of `value`; higher bits must be zero.
    pub fn write_u24(&mut self, offset: usize, value: u32, endian: Endian) -> Result<()> {
        if value > 0x00FF_FFFF {
            return Err(MuxError::BlockTooLarge {
                kind: "24-bit field",
                size: value as usize,
            });
        }
        match endian {
            Endian::Big => self.put(offset, &value.to_be_bytes()[1..]),
            Endian::Little => self.put(offset, &value.to_le_bytes()[..3]),
        }
    }

    pub fn write_u32(&mut self, offset: usize, value: u32, endian: Endian) -> Result<()> {
        match endian {
            Endian::Big => self.put(offset, &value.to_be_bytes()),
            Endian::Little => self.put(offset, &value.to_le_bytes()),
        }
    }

    pub fn write_u64(&mut self, offset: usize, value: u64, endian: Endian) -> Result<()> {
        match endian {
            Endian::Big => self.put(offset, &value.to_be_bytes()),
            Endian::Little => self.put(offset, &value.to_le_bytes()),
        }
    }
}
