//! The tagger couples one cursor with one sink for the duration of a walk.
//!
//! It carries the emission idiom all walkers share: scalar fields become
//! `name=0xVAL` annotations over their own bytes, fixed-width strings become
//! `name "value"`, and struct-level wraps overlap the fields they contain.
//! Values are returned to the walker so decoding and annotating stay one
//! step.

use crate::annot::{Annotation, ByteRange, Sink};
use crate::cursor::{trim_nul_padding, Cursor};
use crate::error::Result;

/// Walk state: a cursor over the image plus the annotation sink.
#[derive(Debug)]
pub struct Tagger<'a> {
    pub cur: Cursor<'a>,
    sink: Sink,
}

impl<'a> Tagger<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cur: Cursor::new(data),
            sink: Sink::new(),
        }
    }

    /// Annotates `[pos, pos+len)` with `label` and advances, returning the
    /// covered bytes.
    pub fn tag(&mut self, len: u64, label: impl Into<String>) -> Result<&'a [u8]> {
        let start = self.cur.pos();
        let bytes = self.cur.read_bytes(len)?;
        self.sink.emit(ByteRange::new(start, start + len), label);
        Ok(bytes)
    }

    /// Annotates `[pos, pos+len)` without advancing; used for struct wraps
    /// emitted ahead of their field annotations.
    pub fn tag_peek(&mut self, len: u64, label: impl Into<String>) -> Result<&'a [u8]> {
        let start = self.cur.pos();
        let bytes = self.cur.read_bytes(len)?;
        self.cur.seek(start)?;
        self.sink.emit(ByteRange::new(start, start + len), label);
        Ok(bytes)
    }

    /// Reads a scalar and annotates its bytes with `name=0xVAL`.
    pub fn tag_u8(&mut self, name: &str) -> Result<u8> {
        let start = self.cur.pos();
        let value = self.cur.read_u8()?;
        self.sink
            .emit(ByteRange::new(start, start + 1), format!("{name}={value:#X}"));
        Ok(value)
    }

    pub fn tag_u16(&mut self, name: &str) -> Result<u16> {
        let start = self.cur.pos();
        let value = self.cur.read_u16()?;
        self.sink
            .emit(ByteRange::new(start, start + 2), format!("{name}={value:#X}"));
        Ok(value)
    }

    pub fn tag_u32(&mut self, name: &str) -> Result<u32> {
        let start = self.cur.pos();
        let value = self.cur.read_u32()?;
        self.sink
            .emit(ByteRange::new(start, start + 4), format!("{name}={value:#X}"));
        Ok(value)
    }

    pub fn tag_u64(&mut self, name: &str) -> Result<u64> {
        let start = self.cur.pos();
        let value = self.cur.read_u64()?;
        self.sink
            .emit(ByteRange::new(start, start + 8), format!("{name}={value:#X}"));
        Ok(value)
    }

    /// Reads an `n`-byte fixed-width string field and annotates it with
    /// `name "value"` (trailing NULs stripped).
    pub fn tag_str(&mut self, len: u64, name: &str) -> Result<String> {
        let start = self.cur.pos();
        let bytes = self.cur.read_bytes(len)?;
        let value = trim_nul_padding(bytes);
        self.sink.emit(
            ByteRange::new(start, start + len),
            format!("{name} \"{value}\""),
        );
        Ok(value)
    }

    /// Annotates `[start, pos)` — the struct wrap emitted after its fields.
    pub fn wrap(&mut self, start: u64, label: impl Into<String>) {
        self.sink
            .emit(ByteRange::new(start, self.cur.pos()), label);
    }

    /// Annotates an arbitrary already-validated range without touching the
    /// cursor.
    pub fn note(&mut self, start: u64, end: u64, label: impl Into<String>) {
        self.sink.emit(ByteRange::new(start, end), label);
    }

    pub fn annotations(&self) -> &[Annotation] {
        self.sink.annotations()
    }

    pub fn into_annotations(self) -> Vec<Annotation> {
        self.sink.into_annotations()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeFault;

    #[test]
    fn test_scalar_tag_labels() {
        let data = [0x7Fu8, 0x45, 0x4C, 0x46, 0x02, 0x01];
        let mut t = Tagger::new(&data);
        assert_eq!(t.tag_u32("magic").unwrap(), 0x464C457F);
        assert_eq!(t.tag_u8("ei_class").unwrap(), 2);
        let labels: Vec<&str> = t.annotations().iter().map(|a| a.label.as_str()).collect();
        assert_eq!(labels, ["magic=0x464C457F", "ei_class=0x2"]);
        assert_eq!(t.annotations()[1].range, ByteRange::new(4, 5));
    }

    #[test]
    fn test_tag_peek_stays_put() {
        let data = [0u8; 8];
        let mut t = Tagger::new(&data);
        t.tag_peek(8, "whole header").unwrap();
        assert_eq!(t.cur.pos(), 0);
        assert_eq!(t.annotations()[0].range, ByteRange::new(0, 8));
    }

    #[test]
    fn test_wrap_spans_consumed_fields() {
        let data = [1u8, 0, 2, 0];
        let mut t = Tagger::new(&data);
        let start = t.cur.pos();
        t.tag_u16("a").unwrap();
        t.tag_u16("b").unwrap();
        t.wrap(start, "pair");
        let last = &t.annotations()[2];
        assert_eq!(last.range, ByteRange::new(0, 4));
        assert_eq!(last.label, "pair");
    }

    #[test]
    fn test_tag_str_strips_padding() {
        let data = b".text\0\0\0";
        let mut t = Tagger::new(data);
        let name = t.tag_str(8, "Name").unwrap();
        assert_eq!(name, ".text");
        assert_eq!(t.annotations()[0].label, "Name \".text\"");
    }

    #[test]
    fn test_failed_tag_emits_nothing() {
        let data = [0u8; 2];
        let mut t = Tagger::new(&data);
        let err = t.tag_u32("field").unwrap_err();
        assert!(matches!(err, DecodeFault::OutOfBounds { .. }));
        assert!(t.annotations().is_empty());
        assert_eq!(t.cur.pos(), 0);
    }
}
