//! NUL-terminated string table resolution.
//!
//! ELF section and symbol names and DEX string data live in tables that the
//! walkers address by relative offset. A `StringTable` is a view over a
//! `(base, size)` window of the image; lookups scan for a terminator and
//! never copy or mutate the table.

use crate::error::{DecodeFault, Result};

/// A view over a NUL-terminated string table within an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringTable {
    base: u64,
    size: u64,
}

impl StringTable {
    pub fn new(base: u64, size: u64) -> Self {
        Self { base, size }
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Resolves the string at `rel` bytes into the table.
    ///
    /// Scans from `base + rel` for a NUL, crossing neither the table window
    /// nor the image end. Non-UTF-8 bytes are replaced for label embedding.
    pub fn lookup(&self, data: &[u8], rel: u64) -> Result<String> {
        let start = self
            .base
            .checked_add(rel)
            .ok_or(DecodeFault::OutOfBounds {
                offset: self.base,
                needed: rel,
                size: data.len() as u64,
            })?;
        if start > data.len() as u64 {
            return Err(DecodeFault::OutOfBounds {
                offset: start,
                needed: 1,
                size: data.len() as u64,
            });
        }
        if rel >= self.size {
            return Err(DecodeFault::UnterminatedString { offset: start });
        }
        let window_end = self
            .base
            .saturating_add(self.size)
            .min(data.len() as u64) as usize;
        let window = &data[start as usize..window_end];
        match memchr::memchr(0, window) {
            Some(nul) => Ok(String::from_utf8_lossy(&window[..nul]).into_owned()),
            None => Err(DecodeFault::UnterminatedString { offset: start }),
        }
    }

    /// Like `lookup`, but degrades failures to a `"?"` placeholder for
    /// callers where the name only feeds a label.
    pub fn lookup_label(&self, data: &[u8], rel: u64) -> String {
        self.lookup(data, rel).unwrap_or_else(|_| "?".to_string())
    }
}
