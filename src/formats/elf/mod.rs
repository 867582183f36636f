//! ELF structural walk, 32- and 64-bit classes.
//!
//! One walk covers both classes behind the [`Width`] selector: the class
//! fixes the record sizes and the width of address-sized fields, everything
//! else is shared. The walk annotates the file header, every section header
//! (plus a whole-section contents range), `.dynamic` entries, `.symtab`
//! entries with names resolved through `.strtab`, and every program header.
//! Byte order follows `e_ident[EI_DATA]`.

pub mod types;

use tracing::warn;

use crate::cursor::{Cursor, Endian};
use crate::error::Result;
use crate::strtab::StringTable;
use crate::tagger::Tagger;
use types::*;

/// Class selector carrying the record sizes and word width of one walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    W32,
    W64,
}

impl Width {
    /// Label prefix for file-level structs: `elf32` or `elf64`.
    fn prefix(self) -> &'static str {
        match self {
            Width::W32 => "elf32",
            Width::W64 => "elf64",
        }
    }

    fn bits(self) -> &'static str {
        match self {
            Width::W32 => "32-bit",
            Width::W64 => "64-bit",
        }
    }

    fn hdr_size(self) -> u64 {
        match self {
            Width::W32 => SIZE_ELF32_HDR,
            Width::W64 => SIZE_ELF64_HDR,
        }
    }

    fn shdr_size(self) -> u64 {
        match self {
            Width::W32 => SIZE_ELF32_SHDR,
            Width::W64 => SIZE_ELF64_SHDR,
        }
    }

    /// Width of address-sized fields.
    fn word_size(self) -> u64 {
        match self {
            Width::W32 => 4,
            Width::W64 => 8,
        }
    }

    fn read_word(self, cur: &mut Cursor<'_>) -> Result<u64> {
        match self {
            Width::W32 => cur.read_u32().map(u64::from),
            Width::W64 => cur.read_u64(),
        }
    }

    fn peek_word(self, cur: &mut Cursor<'_>) -> Result<u64> {
        match self {
            Width::W32 => cur.peek_u32().map(u64::from),
            Width::W64 => cur.peek_u64(),
        }
    }

    fn tag_word(self, t: &mut Tagger<'_>, name: &str) -> Result<u64> {
        match self {
            Width::W32 => t.tag_u32(name).map(u64::from),
            Width::W64 => t.tag_u64(name),
        }
    }

    fn dyn_struct(self) -> &'static str {
        match self {
            Width::W32 => "Elf32_Dyn",
            Width::W64 => "Elf64_Dyn",
        }
    }

    fn sym_struct(self) -> &'static str {
        match self {
            Width::W32 => "Elf32_Sym",
            Width::W64 => "Elf64_Sym",
        }
    }
}

fn probe_class(data: &[u8], class: u8) -> bool {
    data.len() > EI_VERSION
        && data.starts_with(ELFMAG)
        && data[EI_CLASS] == class
        && (data[EI_DATA] == ELFDATA2LSB || data[EI_DATA] == ELFDATA2MSB)
        && data[EI_VERSION] == EV_CURRENT
}

/// True for `\x7fELF` with a 64-bit class byte, a known data encoding, and
/// ident version 1.
pub fn probe_elf64(data: &[u8]) -> bool {
    probe_class(data, ELFCLASS64)
}

/// The 32-bit counterpart of [`probe_elf64`].
pub fn probe_elf32(data: &[u8]) -> bool {
    probe_class(data, ELFCLASS32)
}

pub fn walk_elf64(t: &mut Tagger<'_>) -> Result<()> {
    walk(t, Width::W64)
}

pub fn walk_elf32(t: &mut Tagger<'_>) -> Result<()> {
    walk(t, Width::W32)
}

fn walk(t: &mut Tagger<'_>, w: Width) -> Result<()> {
    let hdr = tag_header(t, w)?;
    let refs = tag_sections(t, w, &hdr)?;

    if let Some((offset, size)) = refs.dynamic {
        tag_dynamic(t, w, offset, size)?;
    }
    if let Some((offset, size)) = refs.symtab {
        let names = refs.strtab.map(|(base, sz)| StringTable::new(base, sz));
        tag_symbols(t, w, offset, size, names)?;
    }
    tag_phdrs(t, w, &hdr)?;
    Ok(())
}

/// Counts and offsets pulled from the file header while annotating it.
struct HeaderInfo {
    e_phoff: u64,
    e_shoff: u64,
    e_phnum: u16,
    e_shnum: u16,
    e_shstrndx: u16,
}

fn tag_header(t: &mut Tagger<'_>, w: Width) -> Result<HeaderInfo> {
    t.tag_peek(w.hdr_size(), format!("{}_hdr", w.prefix()))?;

    t.tag(4, "e_ident[0..4)")?;
    t.tag_u8(&format!("e_ident[EI_CLASS] ({})", w.bits()))?;

    let ei_data = t.cur.peek_u8()?;
    t.tag_u8(&format!("e_ident[EI_DATA] {}", ei_data_str(ei_data)))?;
    if ei_data == ELFDATA2MSB {
        t.cur.set_endian(Endian::Big);
    }

    t.tag_u8("e_ident[EI_VERSION]")?;
    t.tag_u8("e_ident[EI_OSABI]")?;
    t.tag_u8("e_ident[EI_ABIVERSION]")?;
    t.tag(7, "e_ident[EI_PAD]")?;

    t.tag_u16("e_type")?;
    t.tag_u16("e_machine")?;
    t.tag_u32("e_version")?;
    w.tag_word(t, "e_entry")?;
    let e_phoff = w.tag_word(t, "e_phoff")?;
    let e_shoff = w.tag_word(t, "e_shoff")?;
    t.tag_u32("e_flags")?;
    let e_ehsize = t.tag_u16("e_ehsize")?;
    if u64::from(e_ehsize) != w.hdr_size() {
        warn!(
            found = e_ehsize,
            expected = w.hdr_size(),
            "unexpected e_ehsize"
        );
    }
    t.tag_u16("e_phentsize")?;
    let e_phnum = t.tag_u16("e_phnum")?;
    let e_shentsize = t.tag_u16("e_shentsize")?;
    let e_shnum = t.tag_u16("e_shnum")?;
    let e_shstrndx = t.tag_u16("e_shstrndx")?;
    if e_shnum > 0 && u64::from(e_shentsize) != w.shdr_size() {
        warn!(
            found = e_shentsize,
            expected = w.shdr_size(),
            "unexpected e_shentsize"
        );
    }

    Ok(HeaderInfo {
        e_phoff,
        e_shoff,
        e_phnum,
        e_shnum,
        e_shstrndx,
    })
}

/// File offsets of the sections the walk revisits after the header pass.
#[derive(Default)]
struct SectionRefs {
    dynamic: Option<(u64, u64)>,
    symtab: Option<(u64, u64)>,
    strtab: Option<(u64, u64)>,
}

fn tag_sections(t: &mut Tagger<'_>, w: Width, hdr: &HeaderInfo) -> Result<SectionRefs> {
    let mut refs = SectionRefs::default();
    if hdr.e_shnum == 0 {
        return Ok(refs);
    }

    let data = t.cur.data();
    let file_size = t.cur.len();

    // the name table header is read ahead, unannotated, so sections can be
    // named as they are walked
    let names_hdr = u64::from(hdr.e_shstrndx)
        .checked_mul(w.shdr_size())
        .and_then(|rel| hdr.e_shoff.checked_add(rel))
        .unwrap_or(u64::MAX);
    t.cur.seek(names_hdr)?;
    t.cur.skip(8)?; // sh_name, sh_type
    t.cur.skip(2 * w.word_size())?; // sh_flags, sh_addr
    let names_base = w.read_word(&mut t.cur)?;
    let names_size = w.read_word(&mut t.cur)?;
    let names = StringTable::new(names_base, names_size);

    t.cur.seek(hdr.e_shoff)?;
    for _ in 0..hdr.e_shnum {
        let o_hdr = t.cur.pos();
        let sh_name = t.tag_u32("sh_name")?;
        let sh_type = t.cur.peek_u32()?;
        t.tag(4, format!("sh_type={:#X} ({})", sh_type, sh_type_str(sh_type)))?;
        let sh_flags = w.peek_word(&mut t.cur)?;
        t.tag(
            w.word_size(),
            format!("sh_flags={:#X} ({})", sh_flags, sh_flags_str(sh_flags)),
        )?;
        w.tag_word(t, "sh_addr")?;
        let sh_offset = w.tag_word(t, "sh_offset")?;
        let sh_size = w.tag_word(t, "sh_size")?;
        t.tag_u32("sh_link")?;
        t.tag_u32("sh_info")?;
        w.tag_word(t, "sh_addralign")?;
        w.tag_word(t, "sh_entsize")?;

        let name = names.lookup_label(data, u64::from(sh_name));
        match name.as_str() {
            ".dynamic" => refs.dynamic = Some((sh_offset, sh_size)),
            ".symtab" => refs.symtab = Some((sh_offset, sh_size)),
            ".strtab" => refs.strtab = Some((sh_offset, sh_size)),
            _ => {}
        }

        t.wrap(
            o_hdr,
            format!("{}_shdr \"{}\" {}", w.prefix(), name, sh_type_str(sh_type)),
        );

        if sh_type != SHT_NULL && sh_type != SHT_NOBITS {
            match sh_offset.checked_add(sh_size) {
                Some(end) if end <= file_size => {
                    t.note(sh_offset, end, format!("section \"{}\" contents", name));
                }
                _ => warn!(
                    section = %name,
                    sh_offset,
                    sh_size,
                    "contents range crosses the image end"
                ),
            }
        }
    }

    Ok(refs)
}

/// Walks `.dynamic` as an array of tag/value pairs, stopping after the
/// `DT_NULL` terminator or at the section end.
fn tag_dynamic(t: &mut Tagger<'_>, w: Width, offset: u64, size: u64) -> Result<()> {
    t.cur.seek(offset)?;
    let end = offset.saturating_add(size);
    while t.cur.pos() < end {
        let o_dyn = t.cur.pos();
        let d_tag = w.peek_word(&mut t.cur)?;
        let tag_str = dynamic_type_str(d_tag);
        t.tag(w.word_size(), format!("d_tag:{:#X} ({})", d_tag, tag_str))?;
        w.tag_word(t, "val_ptr")?;
        t.wrap(o_dyn, format!("{} ({})", w.dyn_struct(), tag_str));

        if d_tag == DT_NULL {
            break;
        }
    }
    Ok(())
}

/// Walks `.symtab` as an array of symbol records; names resolve through
/// `.strtab` when present and degrade to `?` otherwise.
///
/// The two classes lay the record out differently: 64-bit keeps the name
/// and info bytes up front, 32-bit interleaves them after value and size.
fn tag_symbols(
    t: &mut Tagger<'_>,
    w: Width,
    offset: u64,
    size: u64,
    names: Option<StringTable>,
) -> Result<()> {
    let data = t.cur.data();
    t.cur.seek(offset)?;
    let end = offset.saturating_add(size);
    while t.cur.pos() < end {
        let o_sym = t.cur.pos();
        let st_name = t.cur.peek_u32()?;
        let name = match &names {
            Some(tab) => tab.lookup_label(data, u64::from(st_name)),
            None => "?".to_string(),
        };
        t.tag(4, format!("st_name={:#X} \"{}\"", st_name, name))?;
        match w {
            Width::W64 => {
                tag_st_info(t)?;
                t.tag_u8("st_other")?;
                t.tag_u16("st_shndx")?;
                t.tag_u64("st_value")?;
                t.tag_u64("st_size")?;
            }
            Width::W32 => {
                t.tag_u32("st_value")?;
                t.tag_u32("st_size")?;
                tag_st_info(t)?;
                t.tag_u8("st_other")?;
                t.tag_u16("st_shndx")?;
            }
        }
        t.wrap(o_sym, format!("{} \"{}\"", w.sym_struct(), name));
    }
    Ok(())
}

fn tag_st_info(t: &mut Tagger<'_>) -> Result<()> {
    let st_info = t.cur.peek_u8()?;
    let bind = st_info >> 4;
    let typ = st_info & 0xF;
    t.tag(
        1,
        format!(
            "st_info bind:{}({}) type:{}({})",
            bind,
            symbol_binding_str(bind),
            typ,
            symbol_type_str(typ)
        ),
    )?;
    Ok(())
}

fn tag_phdrs(t: &mut Tagger<'_>, w: Width, hdr: &HeaderInfo) -> Result<()> {
    if hdr.e_phnum == 0 {
        return Ok(());
    }
    t.cur.seek(hdr.e_phoff)?;
    for i in 0..hdr.e_phnum {
        let o_phdr = t.cur.pos();
        let p_type = t.tag_u32("p_type")?;
        match w {
            Width::W64 => {
                t.tag_u32("p_flags")?;
                t.tag_u64("p_offset")?;
                t.tag_u64("p_vaddr")?;
                t.tag_u64("p_paddr")?;
                t.tag_u64("p_filesz")?;
                t.tag_u64("p_memsz")?;
                t.tag_u64("p_align")?;
            }
            Width::W32 => {
                t.tag_u32("p_offset")?;
                t.tag_u32("p_vaddr")?;
                t.tag_u32("p_paddr")?;
                t.tag_u32("p_filesz")?;
                t.tag_u32("p_memsz")?;
                t.tag_u32("p_flags")?;
                t.tag_u32("p_align")?;
            }
        }
        t.wrap(
            o_phdr,
            format!("{}_phdr {} {}", w.prefix(), i, phdr_type_str(p_type)),
        );
    }
    Ok(())
}
