//! Positioned, bounds-checked reading over an immutable byte image.
//!
//! Every format walker drives exactly one `Cursor`. Reads honor the
//! cursor's current endianness mode, which ELF walkers switch at runtime
//! after the identification bytes and the OpenPGP walker fixes to
//! big-endian. A failed read leaves the position untouched.

use crate::error::{DecodeFault, Result};

/// Byte order for multi-byte reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// A stateful reader over a byte slice.
///
/// The position always satisfies `pos <= len`. Bounds are checked before
/// any state changes, so a fault never advances the cursor.
#[derive(Debug)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: u64,
    endian: Endian,
}

impl<'a> Cursor<'a> {
    /// Creates a little-endian cursor at position 0.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            endian: Endian::Little,
        }
    }

    /// Total image size in bytes.
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    /// True for a zero-length image.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current position.
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Bytes between the position and the image end.
    pub fn remaining(&self) -> u64 {
        self.len() - self.pos
    }

    /// True once the position has reached the image end.
    pub fn is_eof(&self) -> bool {
        self.pos >= self.len()
    }

    /// Current byte order.
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Switches the byte order for subsequent multi-byte reads.
    pub fn set_endian(&mut self, endian: Endian) {
        self.endian = endian;
    }

    /// The underlying image.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Moves the position to `pos`. The target may sit at the image end.
    pub fn seek(&mut self, pos: u64) -> Result<()> {
        if pos > self.len() {
            return Err(DecodeFault::OutOfBounds {
                offset: pos,
                needed: 0,
                size: self.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Advances the position by `n` bytes.
    pub fn skip(&mut self, n: u64) -> Result<()> {
        let target = self.pos.checked_add(n).ok_or(DecodeFault::OutOfBounds {
            offset: self.pos,
            needed: n,
            size: self.len(),
        })?;
        self.seek(target)
    }

    fn check(&self, n: u64) -> Result<()> {
        if self.remaining() < n {
            return Err(DecodeFault::OutOfBounds {
                offset: self.pos,
                needed: n,
                size: self.len(),
            });
        }
        Ok(())
    }

    /// Reads `n` bytes and advances.
    pub fn read_bytes(&mut self, n: u64) -> Result<&'a [u8]> {
        self.check(n)?;
        let start = self.pos as usize;
        let end = start + n as usize;
        self.pos += n;
        Ok(&self.data[start..end])
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let bytes = self.read_bytes(1)?;
        Ok(bytes[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes: [u8; 2] = self.read_bytes(2)?.try_into().unwrap();
        Ok(match self.endian {
            Endian::Little => u16::from_le_bytes(bytes),
            Endian::Big => u16::from_be_bytes(bytes),
        })
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes: [u8; 4] = self.read_bytes(4)?.try_into().unwrap();
        Ok(match self.endian {
            Endian::Little => u32::from_le_bytes(bytes),
            Endian::Big => u32::from_be_bytes(bytes),
        })
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let bytes: [u8; 8] = self.read_bytes(8)?.try_into().unwrap();
        Ok(match self.endian {
            Endian::Little => u64::from_le_bytes(bytes),
            Endian::Big => u64::from_be_bytes(bytes),
        })
    }

    /// Reads an `n`-byte fixed-width name field, stripping trailing NULs
    /// and replacing non-UTF-8 bytes.
    pub fn read_fixed_str(&mut self, n: u64) -> Result<String> {
        let bytes = self.read_bytes(n)?;
        Ok(trim_nul_padding(bytes))
    }

    /// Decodes a ULEB128 value of at most 10 octets.
    ///
    /// An encoding that fails to terminate within 10 octets faults as
    /// unterminated at the value's first octet.
    pub fn read_uleb128(&mut self) -> Result<u64> {
        let start = self.pos;
        let mut value: u64 = 0;
        let mut shift = 0u32;
        for _ in 0..10 {
            let byte = match self.read_u8() {
                Ok(b) => b,
                Err(fault) => {
                    self.pos = start;
                    return Err(fault);
                }
            };
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
        self.pos = start;
        Err(DecodeFault::UnterminatedString { offset: start })
    }

    pub fn peek_u8(&mut self) -> Result<u8> {
        let saved = self.pos;
        let value = self.read_u8()?;
        self.pos = saved;
        Ok(value)
    }

    pub fn peek_u16(&mut self) -> Result<u16> {
        let saved = self.pos;
        let value = self.read_u16()?;
        self.pos = saved;
        Ok(value)
    }

    pub fn peek_u32(&mut self) -> Result<u32> {
        let saved = self.pos;
        let value = self.read_u32()?;
        self.pos = saved;
        Ok(value)
    }

    pub fn peek_u64(&mut self) -> Result<u64> {
        let saved = self.pos;
        let value = self.read_u64()?;
        self.pos = saved;
        Ok(value)
    }
}

/// Strips trailing NUL padding from a fixed-width name field and replaces
/// non-UTF-8 bytes for label embedding.
pub fn trim_nul_padding(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .rposition(|&b| b != 0)
        .map(|i| i + 1)
        .unwrap_or(0);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
