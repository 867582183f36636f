//! PE structural walk, PE32 and PE32+.
//!
//! The walk annotates the DOS header, seeks `e_lfanew`, and decodes the NT
//! headers with the optional-header layout fixed by the [`Width`] selector:
//! PE32 carries `BaseOfData` and 32-bit image-base/stack/heap fields, PE32+
//! drops `BaseOfData` and widens those fields to 64 bits. Data directories
//! run to `NumberOfRvaAndSizes`, section headers to `NumberOfSections`, and
//! a section literally named `.reloc` additionally gets its relocation
//! blocks decoded.

pub mod types;

use tracing::warn;

use crate::error::{DecodeFault, Result};
use crate::tagger::Tagger;
use types::*;

/// Optional-header layout selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    W32,
    W64,
}

impl Width {
    fn opt_magic(self) -> u16 {
        match self {
            Width::W32 => OPT_MAGIC_PE32,
            Width::W64 => OPT_MAGIC_PE32PLUS,
        }
    }

    fn opt_label(self) -> &'static str {
        match self {
            Width::W32 => "image_optional_header32",
            Width::W64 => "image_optional_header64",
        }
    }

    /// Tags one of the stack/heap reserve/commit fields at this width.
    fn tag_size(self, t: &mut Tagger, name: &str) -> Result<u64> {
        match self {
            Width::W32 => t.tag_u32(name).map(u64::from),
            Width::W64 => t.tag_u64(name),
        }
    }
}

fn probe_pe(data: &[u8], machine: u16) -> bool {
    if data.len() < SIZE_DOS_HEADER as usize || !data.starts_with(DOS_MAGIC) {
        return false;
    }
    let e_lfanew = u32::from_le_bytes(
        data[OFFSET_E_LFANEW..OFFSET_E_LFANEW + 4]
            .try_into()
            .unwrap(),
    ) as usize;
    let nt = match e_lfanew
        .checked_add(6)
        .and_then(|end| data.get(e_lfanew..end))
    {
        Some(nt) => nt,
        None => return false,
    };
    nt[..4] == *PE_SIGNATURE && u16::from_le_bytes([nt[4], nt[5]]) == machine
}

/// `true` when `data` is an `MZ` image whose NT headers declare an i386
/// (PE32) machine.
pub fn probe_pe32(data: &[u8]) -> bool {
    probe_pe(data, MACHINE_I386)
}

/// `true` when `data` is an `MZ` image whose NT headers declare an AMD64
/// (PE32+) machine.
pub fn probe_pe64(data: &[u8]) -> bool {
    probe_pe(data, MACHINE_AMD64)
}

pub fn walk_pe32(t: &mut Tagger) -> Result<()> {
    walk(t, Width::W32)
}

pub fn walk_pe64(t: &mut Tagger) -> Result<()> {
    walk(t, Width::W64)
}

fn walk(t: &mut Tagger, w: Width) -> Result<()> {
    let e_lfanew = tag_dos_header(t)?;
    t.cur.seek(u64::from(e_lfanew))?;
    t.tag_u32("signature")?;
    let (number_of_sections, size_of_optional_header) = tag_file_header(t)?;
    let o_ioh = t.cur.pos();
    tag_optional_header(t, w)?;
    t.wrap(u64::from(e_lfanew), "image_nt_headers");

    t.cur
        .seek(o_ioh.checked_add(u64::from(size_of_optional_header)).unwrap_or(u64::MAX))?;
    let mut reloc = None;
    for _ in 0..number_of_sections {
        if let Some(range) = tag_section_header(t)? {
            reloc = Some(range);
        }
    }
    if let Some((offset, size)) = reloc {
        tag_reloc(t, offset, size)?;
    }
    Ok(())
}

/// Annotates the DOS header and returns `e_lfanew`.
fn tag_dos_header(t: &mut Tagger) -> Result<u32> {
    t.tag_peek(SIZE_DOS_HEADER, "image_dos_header")?;
    t.tag(2, "e_magic")?;
    t.tag_u16("e_cblp")?;
    t.tag_u16("e_cp")?;
    t.tag_u16("e_crlc")?;
    t.tag_u16("e_cparhdr")?;
    t.tag_u16("e_minalloc")?;
    t.tag_u16("e_maxalloc")?;
    t.tag_u16("e_ss")?;
    t.tag_u16("e_sp")?;
    t.tag_u16("e_csum")?;
    t.tag_u16("e_eip")?;
    t.tag_u16("e_cs")?;
    t.tag_u16("e_lfarlc")?;
    t.tag_u16("e_ovno")?;
    t.tag(8, "e_res")?;
    t.tag_u16("e_oemid")?;
    t.tag_u16("e_oeminfo")?;
    t.tag(20, "e_res2")?;
    t.tag_u32("e_lfanew")
}

/// Annotates `image_file_header`, returning `(NumberOfSections,
/// SizeOfOptionalHeader)`.
fn tag_file_header(t: &mut Tagger) -> Result<(u16, u16)> {
    let o_ifh = t.cur.pos();
    let machine = t.cur.peek_u16()?;
    t.tag(2, format!("Machine={machine:#X} ({})", machine_str(machine)))?;
    let number_of_sections = t.tag_u16("NumberOfSections")?;
    t.tag_u32("TimeDateStamp")?;
    t.tag_u32("PointerToSymbolTable")?;
    t.tag_u32("NumberOfSymbols")?;
    let size_of_optional_header = t.tag_u16("SizeOfOptionalHeader")?;
    t.tag_u16("Characteristics")?;
    t.wrap(o_ifh, "image_file_header");
    Ok((number_of_sections, size_of_optional_header))
}

fn tag_optional_header(t: &mut Tagger, w: Width) -> Result<()> {
    let o_ioh = t.cur.pos();
    let magic = t.tag_u16("Magic")?;
    if magic != w.opt_magic() {
        return Err(DecodeFault::HeaderSizeMismatch {
            field: "Magic",
            expected: u64::from(w.opt_magic()),
            found: u64::from(magic),
        });
    }
    t.tag_u8("MajorLinkerVersion")?;
    t.tag_u8("MinorLinkerVersion")?;
    t.tag_u32("SizeOfCode")?;
    t.tag_u32("SizeOfInitializedData")?;
    t.tag_u32("SizeOfUninitializedData")?;
    t.tag_u32("AddressOfEntryPoint")?;
    t.tag_u32("BaseOfCode")?;
    match w {
        // BaseOfData exists only at 32 bits; its bytes are absorbed into
        // the widened ImageBase at 64.
        Width::W32 => {
            t.tag_u32("BaseOfData")?;
            t.tag_u32("ImageBase")?;
        }
        Width::W64 => {
            t.tag_u64("ImageBase")?;
        }
    }
    t.tag_u32("SectionAlignment")?;
    t.tag_u32("FileAlignment")?;
    t.tag_u16("MajorOperatingSystemVersion")?;
    t.tag_u16("MinorOperatingSystemVersion")?;
    t.tag_u16("MajorImageVersion")?;
    t.tag_u16("MinorImageVersion")?;
    t.tag_u16("MajorSubsystemVersion")?;
    t.tag_u16("MinorSubsystemVersion")?;
    t.tag_u32("Win32VersionValue")?;
    t.tag_u32("SizeOfImage")?;
    t.tag_u32("SizeOfHeaders")?;
    t.tag_u32("CheckSum")?;
    let subsystem = t.cur.peek_u16()?;
    t.tag(
        2,
        format!("Subsystem={subsystem:#X} ({})", subsystem_str(subsystem)),
    )?;
    t.tag_u16("DllCharacteristics")?;
    w.tag_size(t, "SizeOfStackReserve")?;
    w.tag_size(t, "SizeOfStackCommit")?;
    w.tag_size(t, "SizeOfHeapReserve")?;
    w.tag_size(t, "SizeOfHeapCommit")?;
    t.tag_u32("LoaderFlags")?;
    let n_dirs = t.tag_u32("NumberOfRvaAndSizes")?;

    let o_dd = t.cur.pos();
    for i in 0..n_dirs {
        let o_de = t.cur.pos();
        t.tag_u32("VirtualAddress")?;
        t.tag_u32("Size")?;
        t.wrap(o_de, format!("data_directory ({})", data_dir_str(i)));
    }
    t.wrap(o_dd, "DataDirectory");
    t.wrap(o_ioh, w.opt_label());
    Ok(())
}

/// Annotates one section header; returns the raw-data range when the
/// section is named `.reloc`.
fn tag_section_header(t: &mut Tagger) -> Result<Option<(u64, u64)>> {
    let o_ish = t.cur.pos();
    let name = t.tag_str(8, "Name")?;
    t.tag_u32("VirtualSize")?;
    t.tag_u32("VirtualAddress")?;
    let size_of_raw_data = t.tag_u32("SizeOfRawData")?;
    let pointer_to_raw_data = t.tag_u32("PointerToRawData")?;
    t.tag_u32("PointerToRelocations")?;
    t.tag_u32("PointerToLineNumbers")?;
    t.tag_u16("NumberOfRelocations")?;
    t.tag_u16("NumberOfLineNumbers")?;
    t.tag_u32("Characteristics")?;
    t.wrap(o_ish, format!("image_section_header \"{name}\""));

    let start = u64::from(pointer_to_raw_data);
    let end = start + u64::from(size_of_raw_data);
    if size_of_raw_data > 0 {
        if end <= t.cur.len() {
            t.note(start, end, format!("section \"{name}\" contents"));
        } else {
            warn!(
                section = %name,
                pointer_to_raw_data,
                size_of_raw_data,
                "contents range crosses the image end"
            );
        }
    }

    if name == ".reloc" {
        Ok(Some((start, u64::from(size_of_raw_data))))
    } else {
        Ok(None)
    }
}

/// Walks the base-relocation blocks inside the `.reloc` section's raw
/// range. Entry counts come from `SizeOfBlock` but never run past the
/// declared section end; a NULL 8-byte peek terminates the stream.
fn tag_reloc(t: &mut Tagger, offset: u64, size: u64) -> Result<()> {
    t.cur.seek(offset)?;
    let end = offset.saturating_add(size);
    while t.cur.pos() < end {
        let o_block = t.cur.pos();
        if end - o_block < 8 {
            break;
        }
        if t.cur.peek_u64()? == 0 {
            t.note(o_block, o_block + 8, "reloc block NULL");
            break;
        }
        let virtual_address = t.tag_u32("VirtualAddress")?;
        let size_of_block = t.tag_u32("SizeOfBlock")?;
        let declared = u64::from(size_of_block).saturating_sub(8) / 2;
        let n_entries = declared.min((end - t.cur.pos()) / 2);
        for _ in 0..n_entries {
            let entry = t.cur.peek_u16()?;
            let rtype = entry >> 12;
            let roffs = entry & 0xFFF;
            t.tag(
                2,
                format!(
                    "reloc entry {rtype}={} offset={roffs:#X}",
                    reloc_type_str(rtype)
                ),
            )?;
        }
        t.wrap(o_block, format!("reloc block (VA {virtual_address:#X})"));
    }
    Ok(())
}
