//! ELF constants and name lookups shared by the 32- and 64-bit walks.
//!
//! Lookups return display names for annotation labels. Values outside the
//! named enumerations fall back to their reserved-range name (`OS`, `PROC`,
//! `USER`) or `UNKNOWN`.

use bitflags::bitflags;

/// ELF magic bytes.
pub const ELFMAG: &[u8; 4] = b"\x7fELF";

/// e_ident offsets and values.
pub const EI_CLASS: usize = 4;
pub const EI_DATA: usize = 5;
pub const EI_VERSION: usize = 6;
pub const ELFCLASS32: u8 = 1;
pub const ELFCLASS64: u8 = 2;
pub const ELFDATA2LSB: u8 = 1;
pub const ELFDATA2MSB: u8 = 2;
pub const EV_CURRENT: u8 = 1;

/// Fixed record sizes, 32-bit class.
pub const SIZE_ELF32_HDR: u64 = 0x34;
pub const SIZE_ELF32_SHDR: u64 = 0x28;

/// Fixed record sizes, 64-bit class.
pub const SIZE_ELF64_HDR: u64 = 0x40;
pub const SIZE_ELF64_SHDR: u64 = 0x40;

/// Section header types.
pub const SHT_NULL: u32 = 0;
pub const SHT_PROGBITS: u32 = 1;
pub const SHT_SYMTAB: u32 = 2;
pub const SHT_STRTAB: u32 = 3;
pub const SHT_RELA: u32 = 4;
pub const SHT_HASH: u32 = 5;
pub const SHT_DYNAMIC: u32 = 6;
pub const SHT_NOTE: u32 = 7;
pub const SHT_NOBITS: u32 = 8;
pub const SHT_REL: u32 = 9;
pub const SHT_SHLIB: u32 = 10;
pub const SHT_DYNSYM: u32 = 11;
pub const SHT_INIT_ARRAY: u32 = 14;
pub const SHT_FINI_ARRAY: u32 = 15;
pub const SHT_PREINIT_ARRAY: u32 = 16;
pub const SHT_GROUP: u32 = 17;
pub const SHT_SYMTAB_SHNDX: u32 = 18;
pub const SHT_NUM: u32 = 19;
pub const SHT_GNU_ATTRIBUTES: u32 = 0x6ffffff5;
pub const SHT_GNU_HASH: u32 = 0x6ffffff6;
pub const SHT_GNU_LIBLIST: u32 = 0x6ffffff7;
pub const SHT_CHECKSUM: u32 = 0x6ffffff8;
pub const SHT_SUNW_MOVE: u32 = 0x6ffffffa;
pub const SHT_SUNW_COMDAT: u32 = 0x6ffffffb;
pub const SHT_SUNW_SYMINFO: u32 = 0x6ffffffc;
pub const SHT_GNU_VERDEF: u32 = 0x6ffffffd;
pub const SHT_GNU_VERNEED: u32 = 0x6ffffffe;
pub const SHT_GNU_VERSYM: u32 = 0x6fffffff;
pub const SHT_LOOS: u32 = 0x60000000;
pub const SHT_HIOS: u32 = 0x6fffffff;
pub const SHT_LOPROC: u32 = 0x70000000;
pub const SHT_HIPROC: u32 = 0x7fffffff;
pub const SHT_LOUSER: u32 = 0x80000000;

pub fn sh_type_str(t: u32) -> &'static str {
    match t {
        SHT_NULL => "NULL",
        SHT_PROGBITS => "PROGBITS",
        SHT_SYMTAB => "SYMTAB",
        SHT_STRTAB => "STRTAB",
        SHT_RELA => "RELA",
        SHT_HASH => "HASH",
        SHT_DYNAMIC => "DYNAMIC",
        SHT_NOTE => "NOTE",
        SHT_NOBITS => "NOBITS",
        SHT_REL => "REL",
        SHT_SHLIB => "SHLIB",
        SHT_DYNSYM => "DYNSYM",
        SHT_INIT_ARRAY => "INIT_ARRAY",
        SHT_FINI_ARRAY => "FINI_ARRAY",
        SHT_PREINIT_ARRAY => "PREINIT_ARRAY",
        SHT_GROUP => "GROUP",
        SHT_SYMTAB_SHNDX => "SYMTAB_SHNDX",
        SHT_NUM => "NUM",
        SHT_GNU_ATTRIBUTES => "GNU_ATTRIBUTES",
        SHT_GNU_HASH => "GNU_HASH",
        SHT_GNU_LIBLIST => "GNU_LIBLIST",
        SHT_CHECKSUM => "CHECKSUM",
        SHT_SUNW_MOVE => "SUNW_move",
        SHT_SUNW_COMDAT => "SUNW_COMDAT",
        SHT_SUNW_SYMINFO => "SUNW_syminfo",
        SHT_GNU_VERDEF => "GNU_verdef",
        SHT_GNU_VERNEED => "GNU_verneed",
        SHT_GNU_VERSYM => "GNU_versym",
        SHT_LOOS..=SHT_HIOS => "OS",
        SHT_LOPROC..=SHT_HIPROC => "PROC",
        SHT_LOUSER..=u32::MAX => "USER",
        _ => "UNKNOWN",
    }
}

bitflags! {
    /// Section header flags (the named subset; OS and processor bits render
    /// through the fallback).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SectionFlags: u64 {
        const WRITE = 1 << 0;
        const ALLOC = 1 << 1;
        const EXECINSTR = 1 << 2;
        const MERGE = 1 << 4;
        const STRINGS = 1 << 5;
        const INFO_LINK = 1 << 6;
        const LINK_ORDER = 1 << 7;
        const OS_NONCONFORMING = 1 << 8;
        const GROUP = 1 << 9;
        const TLS = 1 << 10;
    }
}

/// Renders sh_flags as a `|`-joined name list: `0` when empty, `UNKNOWN`
/// when only unrecognized bits are set.
pub fn sh_flags_str(a: u64) -> String {
    if a == 0 {
        return "0".to_string();
    }
    let known = SectionFlags::from_bits_truncate(a);
    if known.is_empty() {
        return "UNKNOWN".to_string();
    }
    let names: Vec<&str> = known.iter_names().map(|(name, _)| name).collect();
    names.join("|")
}

/// Program header types.
pub const PT_NULL: u32 = 0;
pub const PT_LOAD: u32 = 1;
pub const PT_DYNAMIC: u32 = 2;
pub const PT_INTERP: u32 = 3;
pub const PT_NOTE: u32 = 4;
pub const PT_SHLIB: u32 = 5;
pub const PT_PHDR: u32 = 6;
pub const PT_TLS: u32 = 7;
pub const PT_LOOS: u32 = 0x60000000;
pub const PT_HIOS: u32 = 0x6fffffff;
pub const PT_LOPROC: u32 = 0x70000000;
pub const PT_HIPROC: u32 = 0x7fffffff;

pub fn phdr_type_str(t: u32) -> &'static str {
    match t {
        PT_NULL => "PT_NULL",
        PT_LOAD => "PT_LOAD",
        PT_DYNAMIC => "PT_DYNAMIC",
        PT_INTERP => "PT_INTERP",
        PT_NOTE => "PT_NOTE",
        PT_SHLIB => "PT_SHLIB",
        PT_PHDR => "PT_PHDR",
        PT_TLS => "PT_TLS",
        PT_LOOS..=PT_HIOS => "OS",
        PT_LOPROC..=PT_HIPROC => "PROC",
        _ => "UNKNOWN",
    }
}

/// Dynamic entry tags.
pub const DT_NULL: u64 = 0;
pub const DT_NEEDED: u64 = 1;
pub const DT_PLTRELSZ: u64 = 2;
pub const DT_PLTGOT: u64 = 3;
pub const DT_HASH: u64 = 4;
pub const DT_STRTAB: u64 = 5;
pub const DT_SYMTAB: u64 = 6;
pub const DT_RELA: u64 = 7;
pub const DT_RELASZ: u64 = 8;
pub const DT_RELAENT: u64 = 9;
pub const DT_STRSZ: u64 = 10;
pub const DT_SYMENT: u64 = 11;
pub const DT_INIT: u64 = 12;
pub const DT_FINI: u64 = 13;
pub const DT_SONAME: u64 = 14;
pub const DT_RPATH: u64 = 15;
pub const DT_SYMBOLIC: u64 = 16;
pub const DT_REL: u64 = 17;
pub const DT_RELSZ: u64 = 18;
pub const DT_RELENT: u64 = 19;
pub const DT_PLTREL: u64 = 20;
pub const DT_DEBUG: u64 = 21;
pub const DT_TEXTREL: u64 = 22;
pub const DT_JMPREL: u64 = 23;
pub const DT_BIND_NOW: u64 = 24;
pub const DT_INIT_ARRAY: u64 = 25;
pub const DT_FINI_ARRAY: u64 = 26;
pub const DT_INIT_ARRAYSZ: u64 = 27;
pub const DT_FINI_ARRAYSZ: u64 = 28;
pub const DT_LOOS: u64 = 0x60000000;
pub const DT_HIOS: u64 = 0x6fffffff;
pub const DT_LOPROC: u64 = 0x70000000;
pub const DT_HIPROC: u64 = 0x7fffffff;

pub fn dynamic_type_str(t: u64) -> &'static str {
    match t {
        DT_NULL => "NULL",
        DT_NEEDED => "NEEDED",
        DT_PLTRELSZ => "PLTRELSZ",
        DT_PLTGOT => "PLTGOT",
        DT_HASH => "HASH",
        DT_STRTAB => "STRTAB",
        DT_SYMTAB => "SYMTAB",
        DT_RELA => "RELA",
        DT_RELASZ => "RELASZ",
        DT_RELAENT => "RELAENT",
        DT_STRSZ => "STRSZ",
        DT_SYMENT => "SYMENT",
        DT_INIT => "INIT",
        DT_FINI => "FINI",
        DT_SONAME => "SONAME",
        DT_RPATH => "RPATH",
        DT_SYMBOLIC => "SYMBOLIC",
        DT_REL => "REL",
        DT_RELSZ => "RELSZ",
        DT_RELENT => "RELENT",
        DT_PLTREL => "PLTREL",
        DT_DEBUG => "DEBUG",
        DT_TEXTREL => "TEXTREL",
        DT_JMPREL => "JMPREL",
        DT_BIND_NOW => "BIND_NOW",
        DT_INIT_ARRAY => "INIT_ARRAY",
        DT_FINI_ARRAY => "FINI_ARRAY",
        DT_INIT_ARRAYSZ => "INIT_ARRAYSZ",
        DT_FINI_ARRAYSZ => "FINI_ARRAYSZ",
        DT_LOOS..=DT_HIOS => "OS",
        DT_LOPROC..=DT_HIPROC => "PROC",
        _ => "UNKNOWN",
    }
}

/// Symbol bindings (high nibble of st_info).
pub const STB_LOCAL: u8 = 0;
pub const STB_GLOBAL: u8 = 1;
pub const STB_WEAK: u8 = 2;
pub const STB_LOPROC: u8 = 13;
pub const STB_HIPROC: u8 = 15;

pub fn symbol_binding_str(b: u8) -> &'static str {
    match b {
        STB_LOCAL => "LOCAL",
        STB_GLOBAL => "GLOBAL",
        STB_WEAK => "WEAK",
        STB_LOPROC..=STB_HIPROC => "PROC",
        _ => "UNKNOWN",
    }
}

/// Symbol types (low nibble of st_info).
pub const STT_NOTYPE: u8 = 0;
pub const STT_OBJECT: u8 = 1;
pub const STT_FUNC: u8 = 2;
pub const STT_SECTION: u8 = 3;
pub const STT_FILE: u8 = 4;
pub const STT_COMMON: u8 = 5;
pub const STT_TLS: u8 = 6;
pub const STT_LOPROC: u8 = 13;
pub const STT_HIPROC: u8 = 15;

pub fn symbol_type_str(t: u8) -> &'static str {
    match t {
        STT_NOTYPE => "NOTYPE",
        STT_OBJECT => "OBJECT",
        STT_FUNC => "FUNC",
        STT_SECTION => "SECTION",
        STT_FILE => "FILE",
        STT_COMMON => "COMMON",
        STT_TLS => "TLS",
        STT_LOPROC..=STT_HIPROC => "PROC",
        _ => "UNKNOWN",
    }
}

pub fn ei_data_str(d: u8) -> &'static str {
    match d {
        0 => "NONE",
        ELFDATA2LSB => "LSB (little-end)",
        ELFDATA2MSB => "MSB (big-end)",
        _ => "UNKNOWN",
    }
}
