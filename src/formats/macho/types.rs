//! Mach-O constants and name lookups for the 64-bit walk.
//!
//! Lookups return display names for annotation labels; values outside the
//! named enumerations fall back to `UNKNOWN`.

/// Header magics, both byte orders plus fat archives.
pub const MH_MAGIC: u32 = 0xFEEDFACE;
pub const MH_CIGAM: u32 = 0xCEFAEDFE;
pub const MH_MAGIC_64: u32 = 0xFEEDFACF;
pub const MH_CIGAM_64: u32 = 0xCFFAEDFE;
pub const FAT_MAGIC: u32 = 0xCAFEBABE;
pub const FAT_CIGAM: u32 = 0xBEBAFECA;

/// `mach_header_64` is eight 32-bit fields.
pub const SIZE_MACH_HEADER_64: u64 = 0x20;

/// File types.
pub const MH_OBJECT: u32 = 0x1;
pub const MH_EXECUTE: u32 = 0x2;
pub const MH_FVMLIB: u32 = 0x3;
pub const MH_CORE: u32 = 0x4;
pub const MH_PRELOAD: u32 = 0x5;
pub const MH_DYLIB: u32 = 0x6;
pub const MH_DYLINKER: u32 = 0x7;
pub const MH_BUNDLE: u32 = 0x8;
pub const MH_DYLIB_STUB: u32 = 0x9;
pub const MH_DSYM: u32 = 0xA;
pub const MH_KEXT_BUNDLE: u32 = 0xB;

/// CPU types. 64-bit variants set the ABI64 bit over their 32-bit base.
pub const CPU_ARCH_ABI64: u32 = 0x0100_0000;
pub const CPU_TYPE_ANY: u32 = 0xFFFF_FFFF;
pub const CPU_TYPE_VAX: u32 = 1;
pub const CPU_TYPE_MC680X0: u32 = 6;
pub const CPU_TYPE_X86: u32 = 7;
pub const CPU_TYPE_X86_64: u32 = CPU_TYPE_X86 | CPU_ARCH_ABI64;
pub const CPU_TYPE_MIPS: u32 = 8;
pub const CPU_TYPE_MC98000: u32 = 10;
pub const CPU_TYPE_HPPA: u32 = 11;
pub const CPU_TYPE_ARM: u32 = 12;
pub const CPU_TYPE_MC88000: u32 = 13;
pub const CPU_TYPE_SPARC: u32 = 14;
pub const CPU_TYPE_I860: u32 = 15;
pub const CPU_TYPE_ALPHA: u32 = 16;
pub const CPU_TYPE_POWERPC: u32 = 18;
pub const CPU_TYPE_POWERPC64: u32 = CPU_TYPE_POWERPC | CPU_ARCH_ABI64;

/// CPU subtypes, x86 family. The high byte of the field carries capability
/// bits, masked off before the lookup.
pub const CPU_SUBTYPE_MASK: u32 = 0xFF00_0000;
pub const CPU_SUBTYPE_LIB64: u32 = 0x8000_0000;
pub const CPU_SUBTYPE_I386_ALL: u32 = 3;
pub const CPU_SUBTYPE_486: u32 = 4;
pub const CPU_SUBTYPE_486SX: u32 = 0x84;
pub const CPU_SUBTYPE_586: u32 = 5;
pub const CPU_SUBTYPE_PENTPRO: u32 = 0x16;
pub const CPU_SUBTYPE_PENTII_M3: u32 = 0x36;
pub const CPU_SUBTYPE_PENTII_M5: u32 = 0x56;
pub const CPU_SUBTYPE_CELERON: u32 = 0x67;
pub const CPU_SUBTYPE_CELERON_MOBILE: u32 = 0x77;
pub const CPU_SUBTYPE_PENTIUM_3: u32 = 0x08;
pub const CPU_SUBTYPE_PENTIUM_3_M: u32 = 0x18;
pub const CPU_SUBTYPE_PENTIUM_3_XEON: u32 = 0x28;
pub const CPU_SUBTYPE_PENTIUM_M: u32 = 0x09;
pub const CPU_SUBTYPE_PENTIUM_4: u32 = 0x0A;
pub const CPU_SUBTYPE_PENTIUM_4_M: u32 = 0x1A;
pub const CPU_SUBTYPE_ITANIUM: u32 = 0x0B;
pub const CPU_SUBTYPE_ITANIUM_2: u32 = 0x1B;
pub const CPU_SUBTYPE_XEON: u32 = 0x0C;
pub const CPU_SUBTYPE_XEON_MP: u32 = 0x1C;

/// Load command identifiers. Commands the dynamic linker must understand
/// carry the REQ_DYLD bit.
pub const LC_REQ_DYLD: u32 = 0x8000_0000;
pub const LC_SEGMENT: u32 = 0x1;
pub const LC_SYMTAB: u32 = 0x2;
pub const LC_SYMSEG: u32 = 0x3;
pub const LC_THREAD: u32 = 0x4;
pub const LC_UNIXTHREAD: u32 = 0x5;
pub const LC_LOADFVMLIB: u32 = 0x6;
pub const LC_IDFVMLIB: u32 = 0x7;
pub const LC_IDENT: u32 = 0x8;
pub const LC_FVMFILE: u32 = 0x9;
pub const LC_PREPAGE: u32 = 0xA;
pub const LC_DYSYMTAB: u32 = 0xB;
pub const LC_LOAD_DYLIB: u32 = 0xC;
pub const LC_ID_DYLIB: u32 = 0xD;
pub const LC_LOAD_DYLINKER: u32 = 0xE;
pub const LC_ID_DYLINKER: u32 = 0xF;
pub const LC_PREBOUND_DYLIB: u32 = 0x10;
pub const LC_ROUTINES: u32 = 0x11;
pub const LC_SUB_FRAMEWORK: u32 = 0x12;
pub const LC_SUB_UMBRELLA: u32 = 0x13;
pub const LC_SUB_CLIENT: u32 = 0x14;
pub const LC_SUB_LIBRARY: u32 = 0x15;
pub const LC_TWOLEVEL_HINTS: u32 = 0x16;
pub const LC_PREBIND_CKSUM: u32 = 0x17;
pub const LC_LOAD_WEAK_DYLIB: u32 = 0x18 | LC_REQ_DYLD;
pub const LC_SEGMENT_64: u32 = 0x19;
pub const LC_ROUTINES_64: u32 = 0x1A;
pub const LC_UUID: u32 = 0x1B;
pub const LC_RPATH: u32 = 0x1C | LC_REQ_DYLD;
pub const LC_CODE_SIGNATURE: u32 = 0x1D;
pub const LC_SEGMENT_SPLIT_INFO: u32 = 0x1E;
pub const LC_REEXPORT_DYLIB: u32 = 0x1F | LC_REQ_DYLD;
pub const LC_LAZY_LOAD_DYLIB: u32 = 0x20;
pub const LC_ENCRYPTION_INFO: u32 = 0x21;
pub const LC_DYLD_INFO: u32 = 0x22;
pub const LC_DYLD_INFO_ONLY: u32 = 0x22 | LC_REQ_DYLD;
pub const LC_LOAD_UPWARD_DYLIB: u32 = 0x23 | LC_REQ_DYLD;
pub const LC_VERSION_MIN_MACOSX: u32 = 0x24;
pub const LC_VERSION_MIN_IPHONEOS: u32 = 0x25;
pub const LC_FUNCTION_STARTS: u32 = 0x26;
pub const LC_DYLD_ENVIRONMENT: u32 = 0x27;
pub const LC_MAIN: u32 = 0x28 | LC_REQ_DYLD;
pub const LC_DATA_IN_CODE: u32 = 0x29;
pub const LC_SOURCE_VERSION: u32 = 0x2A;
pub const LC_DYLIB_CODE_SIGN_DRS: u32 = 0x2B;
pub const LC_ENCRYPTION_INFO_64: u32 = 0x2C;
pub const LC_LINKER_OPTION: u32 = 0x2D;
pub const LC_LINKER_OPTIMIZATION_HINT: u32 = 0x2E;

/// Display name for a header magic.
pub fn magic_str(value: u32) -> &'static str {
    match value {
        MH_MAGIC => "MH_MAGIC",
        MH_CIGAM => "MH_CIGAM",
        MH_MAGIC_64 => "MH_MAGIC_64",
        MH_CIGAM_64 => "MH_CIGAM_64",
        FAT_MAGIC => "FAT_MAGIC",
        FAT_CIGAM => "FAT_CIGAM",
        _ => "UNKNOWN",
    }
}

/// Display name for a file type.
pub fn filetype_str(value: u32) -> &'static str {
    match value {
        MH_OBJECT => "MH_OBJECT",
        MH_EXECUTE => "MH_EXECUTE",
        MH_FVMLIB => "MH_FVMLIB",
        MH_CORE => "MH_CORE",
        MH_PRELOAD => "MH_PRELOAD",
        MH_DYLIB => "MH_DYLIB",
        MH_DYLINKER => "MH_DYLINKER",
        MH_BUNDLE => "MH_BUNDLE",
        MH_DYLIB_STUB => "MH_DYLIB_STUB",
        MH_DSYM => "MH_DSYM",
        MH_KEXT_BUNDLE => "MH_KEXT_BUNDLE",
        _ => "UNKNOWN",
    }
}

/// Display name for a CPU type.
pub fn cputype_str(value: u32) -> &'static str {
    match value {
        CPU_TYPE_ANY => "CPU_TYPE_ANY",
        CPU_TYPE_VAX => "CPU_TYPE_VAX",
        CPU_TYPE_MC680X0 => "CPU_TYPE_MC680x0",
        CPU_TYPE_X86 => "CPU_TYPE_X86",
        CPU_TYPE_X86_64 => "CPU_TYPE_X86_64",
        CPU_TYPE_MIPS => "CPU_TYPE_MIPS",
        CPU_TYPE_MC98000 => "CPU_TYPE_MC98000",
        CPU_TYPE_HPPA => "CPU_TYPE_HPPA",
        CPU_TYPE_ARM => "CPU_TYPE_ARM",
        CPU_TYPE_MC88000 => "CPU_TYPE_MC88000",
        CPU_TYPE_SPARC => "CPU_TYPE_SPARC",
        CPU_TYPE_I860 => "CPU_TYPE_I860",
        CPU_TYPE_ALPHA => "CPU_TYPE_ALPHA",
        CPU_TYPE_POWERPC => "CPU_TYPE_POWERPC",
        CPU_TYPE_POWERPC64 => "CPU_TYPE_POWERPC64",
        _ => "UNKNOWN",
    }
}

/// Display name for an x86 CPU subtype with the capability byte masked off.
pub fn cpusubtype_str(value: u32) -> &'static str {
    match value {
        CPU_SUBTYPE_I386_ALL => "CPU_SUBTYPE_I386_ALL",
        CPU_SUBTYPE_486 => "CPU_SUBTYPE_486",
        CPU_SUBTYPE_486SX => "CPU_SUBTYPE_486SX",
        CPU_SUBTYPE_586 => "CPU_SUBTYPE_586",
        CPU_SUBTYPE_PENTPRO => "CPU_SUBTYPE_PENTPRO",
        CPU_SUBTYPE_PENTII_M3 => "CPU_SUBTYPE_PENTII_M3",
        CPU_SUBTYPE_PENTII_M5 => "CPU_SUBTYPE_PENTII_M5",
        CPU_SUBTYPE_CELERON => "CPU_SUBTYPE_CELERON",
        CPU_SUBTYPE_CELERON_MOBILE => "CPU_SUBTYPE_CELERON_MOBILE",
        CPU_SUBTYPE_PENTIUM_3 => "CPU_SUBTYPE_PENTIUM_3",
        CPU_SUBTYPE_PENTIUM_3_M => "CPU_SUBTYPE_PENTIUM_3_M",
        CPU_SUBTYPE_PENTIUM_3_XEON => "CPU_SUBTYPE_PENTIUM_3_XEON",
        CPU_SUBTYPE_PENTIUM_M => "CPU_SUBTYPE_PENTIUM_M",
        CPU_SUBTYPE_PENTIUM_4 => "CPU_SUBTYPE_PENTIUM_4",
        CPU_SUBTYPE_PENTIUM_4_M => "CPU_SUBTYPE_PENTIUM_4_M",
        CPU_SUBTYPE_ITANIUM => "CPU_SUBTYPE_ITANIUM",
        CPU_SUBTYPE_ITANIUM_2 => "CPU_SUBTYPE_ITANIUM_2",
        CPU_SUBTYPE_XEON => "CPU_SUBTYPE_XEON",
        CPU_SUBTYPE_XEON_MP => "CPU_SUBTYPE_XEON_MP",
        _ => "UNKNOWN",
    }
}

/// Full label for the raw `cpusubtype` field: the masked subtype name,
/// prefixed with the capability name when capability bits are set.
pub fn cpusubtype_label(value: u32) -> String {
    let name = cpusubtype_str(value & 0xFF);
    match value & CPU_SUBTYPE_MASK {
        0 => name.to_string(),
        CPU_SUBTYPE_LIB64 => format!("CPU_SUBTYPE_LIB64|{name}"),
        _ => format!("UNKNOWN|{name}"),
    }
}

/// Display name for a load command identifier.
pub fn cmd_str(value: u32) -> &'static str {
    match value {
        LC_SEGMENT => "LC_SEGMENT",
        LC_SYMTAB => "LC_SYMTAB",
        LC_SYMSEG => "LC_SYMSEG",
        LC_THREAD => "LC_THREAD",
        LC_UNIXTHREAD => "LC_UNIXTHREAD",
        LC_LOADFVMLIB => "LC_LOADFVMLIB",
        LC_IDFVMLIB => "LC_IDFVMLIB",
        LC_IDENT => "LC_IDENT",
        LC_FVMFILE => "LC_FVMFILE",
        LC_PREPAGE => "LC_PREPAGE",
        LC_DYSYMTAB => "LC_DYSYMTAB",
        LC_LOAD_DYLIB => "LC_LOAD_DYLIB",
        LC_ID_DYLIB => "LC_ID_DYLIB",
        LC_LOAD_DYLINKER => "LC_LOAD_DYLINKER",
        LC_ID_DYLINKER => "LC_ID_DYLINKER",
        LC_PREBOUND_DYLIB => "LC_PREBOUND_DYLIB",
        LC_ROUTINES => "LC_ROUTINES",
        LC_SUB_FRAMEWORK => "LC_SUB_FRAMEWORK",
        LC_SUB_UMBRELLA => "LC_SUB_UMBRELLA",
        LC_SUB_CLIENT => "LC_SUB_CLIENT",
        LC_SUB_LIBRARY => "LC_SUB_LIBRARY",
        LC_TWOLEVEL_HINTS => "LC_TWOLEVEL_HINTS",
        LC_PREBIND_CKSUM => "LC_PREBIND_CKSUM",
        LC_LOAD_WEAK_DYLIB => "LC_LOAD_WEAK_DYLIB",
        LC_SEGMENT_64 => "LC_SEGMENT_64",
        LC_ROUTINES_64 => "LC_ROUTINES_64",
        LC_UUID => "LC_UUID",
        LC_RPATH => "LC_RPATH",
        LC_CODE_SIGNATURE => "LC_CODE_SIGNATURE",
        LC_SEGMENT_SPLIT_INFO => "LC_SEGMENT_SPLIT_INFO",
        LC_REEXPORT_DYLIB => "LC_REEXPORT_DYLIB",
        LC_LAZY_LOAD_DYLIB => "LC_LAZY_LOAD_DYLIB",
        LC_ENCRYPTION_INFO => "LC_ENCRYPTION_INFO",
        LC_DYLD_INFO => "LC_DYLD_INFO",
        LC_DYLD_INFO_ONLY => "LC_DYLD_INFO_ONLY",
        LC_LOAD_UPWARD_DYLIB => "LC_LOAD_UPWARD_DYLIB",
        LC_VERSION_MIN_MACOSX => "LC_VERSION_MIN_MACOSX",
        LC_VERSION_MIN_IPHONEOS => "LC_VERSION_MIN_IPHONEOS",
        LC_FUNCTION_STARTS => "LC_FUNCTION_STARTS",
        LC_DYLD_ENVIRONMENT => "LC_DYLD_ENVIRONMENT",
        LC_MAIN => "LC_MAIN",
        LC_DATA_IN_CODE => "LC_DATA_IN_CODE",
        LC_SOURCE_VERSION => "LC_SOURCE_VERSION",
        LC_DYLIB_CODE_SIGN_DRS => "LC_DYLIB_CODE_SIGN_DRS",
        LC_ENCRYPTION_INFO_64 => "LC_ENCRYPTION_INFO_64",
        LC_LINKER_OPTION => "LC_LINKER_OPTION",
        LC_LINKER_OPTIMIZATION_HINT => "LC_LINKER_OPTIMIZATION_HINT",
        _ => "UNKNOWN",
    }
}
