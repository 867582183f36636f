//! DEX structural walk.
//!
//! The header is architecturally fixed: `header_size` and `endian_tag` are
//! format-defining constants and a mismatch is fatal, unlike the soft
//! policies elsewhere. The id tables are walked eagerly in dependency order
//! (strings, then types, then protos, then fields/methods/class defs) so
//! every later table's labels carry resolved names instead of raw indices.
//! Out-of-range indices degrade to an `"err"` label and the walk continues.

pub mod tables;

use crate::error::{DecodeFault, Result};
use crate::tagger::Tagger;
use tables::DexTables;

pub const DEX_MAGIC_035: &[u8; 8] = b"dex\n035\0";
pub const DEX_MAGIC_037: &[u8; 8] = b"dex\n037\0";

pub const ENDIAN_CONSTANT: u32 = 0x12345678;
pub const SIZE_DEX_HEADER: u64 = 0x70;

fn magic_str(magic: &[u8]) -> &'static str {
    if magic == DEX_MAGIC_035 {
        "v035"
    } else if magic == DEX_MAGIC_037 {
        "v037 (Android 7.0)"
    } else {
        "unknown"
    }
}

/// True for the `dex\n` magic of a supported version.
pub fn probe_dex(data: &[u8]) -> bool {
    data.starts_with(DEX_MAGIC_035) || data.starts_with(DEX_MAGIC_037)
}

/// Counts and offsets of the id tables, pulled from the header.
struct HeaderInfo {
    string_ids: (u32, u32),
    type_ids: (u32, u32),
    proto_ids: (u32, u32),
    field_ids: (u32, u32),
    method_ids: (u32, u32),
    class_defs: (u32, u32),
}

pub fn walk_dex(t: &mut Tagger<'_>) -> Result<()> {
    let hdr = tag_header(t)?;
    let mut tables = DexTables::default();
    tag_string_ids(t, hdr.string_ids, &mut tables)?;
    tag_type_ids(t, hdr.type_ids, &mut tables)?;
    tag_proto_ids(t, hdr.proto_ids, &mut tables)?;
    tag_field_ids(t, hdr.field_ids, &tables)?;
    tag_method_ids(t, hdr.method_ids, &tables)?;
    tag_class_defs(t, hdr.class_defs, &tables)?;
    Ok(())
}

fn tag_header(t: &mut Tagger<'_>) -> Result<HeaderInfo> {
    t.tag_peek(SIZE_DEX_HEADER, "dex_header")?;

    let o_magic = t.cur.pos();
    let magic = t.cur.read_bytes(8)?;
    t.note(o_magic, o_magic + 8, format!("magic ({})", magic_str(magic)));
    t.tag_u32("checksum (adler32)")?;
    let o_sig = t.cur.pos();
    let signature = t.cur.read_bytes(20)?;
    t.note(
        o_sig,
        o_sig + 20,
        format!("signature (sha1) {}", hex::encode(signature)),
    );
    t.tag_u32("file_size")?;

    let header_size = t.tag_u32("header_size")?;
    if u64::from(header_size) != SIZE_DEX_HEADER {
        return Err(DecodeFault::HeaderSizeMismatch {
            field: "header_size",
            expected: SIZE_DEX_HEADER,
            found: u64::from(header_size),
        });
    }
    let endian_tag = t.tag_u32("endian_tag")?;
    if endian_tag != ENDIAN_CONSTANT {
        return Err(DecodeFault::HeaderSizeMismatch {
            field: "endian_tag",
            expected: u64::from(ENDIAN_CONSTANT),
            found: u64::from(endian_tag),
        });
    }

    t.tag_u32("link_size")?;
    t.tag_u32("link_off")?;
    t.tag_u32("map_off")?;
    let string_ids = tag_size_off(t, "string_ids")?;
    let type_ids = tag_size_off(t, "type_ids")?;
    let proto_ids = tag_size_off(t, "proto_ids")?;
    let field_ids = tag_size_off(t, "field_ids")?;
    let method_ids = tag_size_off(t, "method_ids")?;
    let class_defs = tag_size_off(t, "class_defs")?;
    t.tag_u32("data_size")?;
    t.tag_u32("data_off")?;

    Ok(HeaderInfo {
        string_ids,
        type_ids,
        proto_ids,
        field_ids,
        method_ids,
        class_defs,
    })
}

fn tag_size_off(t: &mut Tagger<'_>, table: &str) -> Result<(u32, u32)> {
    let size = t.tag_u32(&format!("{table}_size"))?;
    let off = t.tag_u32(&format!("{table}_off"))?;
    Ok((size, off))
}

/// Annotates a ULEB128 field over exactly the octets it occupies.
fn tag_uleb128(t: &mut Tagger<'_>, name: &str) -> Result<u64> {
    let start = t.cur.pos();
    let value = t.cur.read_uleb128()?;
    t.note(start, t.cur.pos(), format!("{name}={value:#X}"));
    Ok(value)
}

/// Walks the string_id table, then each referenced `string_data_item`,
/// collecting decoded strings for the later tables.
fn tag_string_ids(t: &mut Tagger<'_>, (n, off): (u32, u32), tables: &mut DexTables) -> Result<()> {
    if n == 0 {
        return Ok(());
    }
    t.cur.seek(u64::from(off))?;
    let mut offsets = Vec::new();
    for i in 0..n {
        let data_off = t.tag_u32(&format!("string_id_item {}/{}", i + 1, n))?;
        offsets.push(data_off);
    }
    t.note(
        u64::from(off),
        t.cur.pos(),
        format!("string_ids ({n} entries)"),
    );

    for data_off in offsets {
        t.cur.seek(u64::from(data_off))?;
        let o_item = t.cur.pos();
        tag_uleb128(t, "utf16_size")?;
        let decoded = tag_string_data(t)?;
        t.wrap(o_item, format!("string_data_item \"{decoded}\""));
        tables.push_string(decoded);
    }
    Ok(())
}

/// Annotates the modified-UTF-8 bytes of a `string_data_item` through the
/// NUL terminator and returns the decoded (lossy) text.
fn tag_string_data(t: &mut Tagger<'_>) -> Result<String> {
    let start = t.cur.pos();
    let rest = &t.cur.data()[start as usize..];
    let nul = memchr::memchr(0, rest).ok_or(DecodeFault::UnterminatedString { offset: start })?;
    let bytes = t.tag(nul as u64 + 1, "data")?;
    Ok(String::from_utf8_lossy(&bytes[..nul]).into_owned())
}

fn tag_type_ids(t: &mut Tagger<'_>, (n, off): (u32, u32), tables: &mut DexTables) -> Result<()> {
    if n == 0 {
        return Ok(());
    }
    t.cur.seek(u64::from(off))?;
    for i in 0..n {
        let descriptor_idx = t.cur.peek_u32()?;
        let name = tables.string(descriptor_idx).unwrap_or("err").to_string();
        t.tag(4, format!("type_id_item {}/{} \"{}\"", i + 1, n, name))?;
        tables.push_type(name);
    }
    t.note(u64::from(off), t.cur.pos(), format!("type_ids ({n} entries)"));
    Ok(())
}

fn tag_proto_ids(t: &mut Tagger<'_>, (n, off): (u32, u32), tables: &mut DexTables) -> Result<()> {
    if n == 0 {
        return Ok(());
    }
    t.cur.seek(u64::from(off))?;
    for i in 0..n {
        let o_item = t.cur.pos();
        let shorty_idx = t.cur.peek_u32()?;
        let shorty = tables.string(shorty_idx).unwrap_or("err").to_string();
        t.tag(4, format!("shorty_idx={shorty_idx:#X} \"{shorty}\""))?;
        let return_type_idx = t.cur.peek_u32()?;
        let ret = tables.type_name(return_type_idx).unwrap_or("err");
        t.tag(4, format!("return_type_idx={return_type_idx:#X} \"{ret}\""))?;
        t.tag_u32("parameters_off")?;
        t.wrap(o_item, format!("proto_id_item {}/{} \"{}\"", i + 1, n, shorty));
        tables.push_shorty(shorty);
    }
    t.note(u64::from(off), t.cur.pos(), format!("proto_ids ({n} entries)"));
    Ok(())
}

fn tag_field_ids(t: &mut Tagger<'_>, (n, off): (u32, u32), tables: &DexTables) -> Result<()> {
    if n == 0 {
        return Ok(());
    }
    t.cur.seek(u64::from(off))?;
    for i in 0..n {
        let o_item = t.cur.pos();
        let class_idx = t.cur.peek_u16()?;
        let class = tables.type_name(u32::from(class_idx)).unwrap_or("err");
        t.tag(2, format!("class_idx={class_idx:#X} \"{class}\""))?;
        let type_idx = t.cur.peek_u16()?;
        let typ = tables.type_name(u32::from(type_idx)).unwrap_or("err");
        t.tag(2, format!("type_idx={type_idx:#X} \"{typ}\""))?;
        let name_idx = t.cur.peek_u32()?;
        let name = tables.string(name_idx).unwrap_or("err").to_string();
        t.tag(4, format!("name_idx={name_idx:#X} \"{name}\""))?;
        t.wrap(o_item, format!("field_id_item {}/{} \"{}\"", i + 1, n, name));
    }
    t.note(u64::from(off), t.cur.pos(), format!("field_ids ({n} entries)"));
    Ok(())
}

fn tag_method_ids(t: &mut Tagger<'_>, (n, off): (u32, u32), tables: &DexTables) -> Result<()> {
    if n == 0 {
        return Ok(());
    }
    t.cur.seek(u64::from(off))?;
    for i in 0..n {
        let o_item = t.cur.pos();
        let class_idx = t.cur.peek_u16()?;
        let class = tables.type_name(u32::from(class_idx)).unwrap_or("err");
        t.tag(2, format!("class_idx={class_idx:#X} \"{class}\""))?;
        let proto_idx = t.cur.peek_u16()?;
        let shorty = tables.shorty(u32::from(proto_idx)).unwrap_or("err");
        t.tag(2, format!("proto_idx={proto_idx:#X} \"{shorty}\""))?;
        let name_idx = t.cur.peek_u32()?;
        let name = tables.string(name_idx).unwrap_or("err").to_string();
        t.tag(4, format!("name_idx={name_idx:#X} \"{name}\""))?;
        t.wrap(o_item, format!("method_id_item {}/{} \"{}\"", i + 1, n, name));
    }
    t.note(u64::from(off), t.cur.pos(), format!("method_ids ({n} entries)"));
    Ok(())
}

fn tag_class_defs(t: &mut Tagger<'_>, (n, off): (u32, u32), tables: &DexTables) -> Result<()> {
    if n == 0 {
        return Ok(());
    }
    t.cur.seek(u64::from(off))?;
    for i in 0..n {
        let o_item = t.cur.pos();
        let class_idx = t.cur.peek_u32()?;
        let class = tables.type_name(class_idx).unwrap_or("err").to_string();
        t.tag(4, format!("class_idx={class_idx:#X} \"{class}\""))?;
        t.tag_u32("access_flags")?;
        let superclass_idx = t.cur.peek_u32()?;
        let superclass = tables.type_name(superclass_idx).unwrap_or("err");
        t.tag(4, format!("superclass_idx={superclass_idx:#X} \"{superclass}\""))?;
        t.tag_u32("interfaces_off")?;
        t.tag_u32("source_file_idx")?;
        t.tag_u32("annotations_off")?;
        t.tag_u32("class_data_off")?;
        t.tag_u32("static_values_off")?;
        t.wrap(o_item, format!("class_def_item {}/{} \"{}\"", i + 1, n, class));
    }
    t.note(u64::from(off), t.cur.pos(), format!("class_defs ({n} entries)"));
    Ok(())
}
