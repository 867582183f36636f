//! Byte-range annotations and the sink that collects them.
//!
//! An annotation is one labeled half-open byte range. Walkers emit them in
//! walk order into a `Sink`; ranges routinely overlap because a struct-level
//! wrap and its per-field annotations both appear. Nothing here ever writes
//! to stdout; rendering returns a string for the caller to do with as it
//! pleases.

use crate::error::ScathaError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A half-open byte range `[start, end)` within a file image.
///
/// Every range emitted by a walker satisfies `start <= end <= image size`.
/// Zero-length ranges are legal and mark positions rather than spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ByteRange {
    /// The starting offset (inclusive).
    pub start: u64,
    /// The ending offset (exclusive).
    pub end: u64,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// Length of the range in bytes.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// True for a zero-length range.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True if `offset` falls inside the range.
    pub fn contains(&self, offset: u64) -> bool {
        offset >= self.start && offset < self.end
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#X},{:#X})", self.start, self.end)
    }
}

/// One labeled byte range.
///
/// The address hint is informational and defaults to 0; labels are free
/// text that deterministically encode the structural kind, an index within
/// a repeated collection when applicable, and any resolved symbolic name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub range: ByteRange,
    pub addr_hint: u64,
    pub label: String,
}

impl Annotation {
    pub fn new(range: ByteRange, label: impl Into<String>) -> Self {
        Self {
            range,
            addr_hint: 0,
            label: label.into(),
        }
    }

    /// Serialize to a JSON string.
    pub fn to_json_string(&self) -> Result<String, ScathaError> {
        serde_json::to_string(self).map_err(|e| ScathaError::Serialization(e.to_string()))
    }

    /// Deserialize from a JSON string.
    pub fn from_json_str(json_str: &str) -> Result<Self, ScathaError> {
        serde_json::from_str(json_str).map_err(|e| ScathaError::Serialization(e.to_string()))
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:#X} {}", self.range, self.addr_hint, self.label)
    }
}

/// Emission-ordered annotation collector.
///
/// Annotations are created once, never mutated, and kept in the order the
/// walker produced them rather than sorted by offset.
#[derive(Debug, Default)]
pub struct Sink {
    annotations: Vec<Annotation>,
}

impl Sink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one annotation.
    pub fn emit(&mut self, range: ByteRange, label: impl Into<String>) {
        self.annotations.push(Annotation::new(range, label));
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn into_annotations(self) -> Vec<Annotation> {
        self.annotations
    }

    /// Renders one `[0xSTART,0xEND) 0xHINT LABEL` line per annotation.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for a in &self.annotations {
            out.push_str(&a.to_string());
            out.push('\n');
        }
        out
    }

    /// Serialize the collected annotations to a JSON string.
    pub fn to_json_string(&self) -> Result<String, ScathaError> {
        serde_json::to_string(&self.annotations)
            .map_err(|e| ScathaError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_basics() {
        let r = ByteRange::new(0x10, 0x18);
        assert_eq!(r.len(), 8);
        assert!(!r.is_empty());
        assert!(r.contains(0x10));
        assert!(r.contains(0x17));
        assert!(!r.contains(0x18));
        assert!(ByteRange::new(4, 4).is_empty());
    }

    #[test]
    fn test_display_line_format() {
        let a = Annotation::new(ByteRange::new(0, 0x40), "elf64_hdr");
        assert_eq!(a.to_string(), "[0x0,0x40) 0x0 elf64_hdr");
    }

    #[test]
    fn test_sink_preserves_emission_order() {
        let mut sink = Sink::new();
        sink.emit(ByteRange::new(0x20, 0x30), "second region first");
        sink.emit(ByteRange::new(0, 0x10), "first region second");
        let lines = sink.render();
        assert_eq!(
            lines,
            "[0x20,0x30) 0x0 second region first\n[0x0,0x10) 0x0 first region second\n"
        );
    }

    #[test]
    fn test_json_round_trip() {
        let a = Annotation::new(ByteRange::new(0x34, 0x38), "e_phoff=0x34");
        let json = a.to_json_string().unwrap();
        let back = Annotation::from_json_str(&json).unwrap();
        assert_eq!(a, back);
    }
}
