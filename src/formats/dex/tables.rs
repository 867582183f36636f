//! Eager DEX index tables.
//!
//! Built in dependency order while the walk annotates each id table:
//! strings first, then types (string indices), then proto shorties, so
//! that later tables can embed resolved names in their labels. Lookups
//! answer `UnsupportedValue` for out-of-range indices; callers degrade the
//! label to `"err"` and keep walking.

use crate::error::{DecodeFault, Result};

/// Name tables collected across the id-table walk.
#[derive(Debug, Default)]
pub struct DexTables {
    strings: Vec<String>,
    types: Vec<String>,
    shorties: Vec<String>,
}

impl DexTables {
    pub fn push_string(&mut self, s: String) {
        self.strings.push(s);
    }

    pub fn push_type(&mut self, s: String) {
        self.types.push(s);
    }

    pub fn push_shorty(&mut self, s: String) {
        self.shorties.push(s);
    }

    /// Decoded string at `idx`.
    pub fn string(&self, idx: u32) -> Result<&str> {
        self.strings
            .get(idx as usize)
            .map(String::as_str)
            .ok_or(DecodeFault::UnsupportedValue {
                field: "string_idx",
                value: u64::from(idx),
            })
    }

    /// Type descriptor at `idx`.
    pub fn type_name(&self, idx: u32) -> Result<&str> {
        self.types
            .get(idx as usize)
            .map(String::as_str)
            .ok_or(DecodeFault::UnsupportedValue {
                field: "type_idx",
                value: u64::from(idx),
            })
    }

    /// Proto shorty descriptor at `idx`.
    pub fn shorty(&self, idx: u32) -> Result<&str> {
        self.shorties
            .get(idx as usize)
            .map(String::as_str)
            .ok_or(DecodeFault::UnsupportedValue {
                field: "proto_idx",
                value: u64::from(idx),
            })
    }
}
