//! PE constants and name lookups shared by the 32- and 64-bit walks.

/// DOS stub magic.
pub const DOS_MAGIC: &[u8; 2] = b"MZ";
/// Offset of `e_lfanew` inside the DOS header.
pub const OFFSET_E_LFANEW: usize = 0x3C;
/// `image_dos_header` is 64 bytes.
pub const SIZE_DOS_HEADER: u64 = 0x40;
/// NT signature bytes at `e_lfanew`.
pub const PE_SIGNATURE: &[u8; 4] = b"PE\0\0";

/// Optional-header magics selecting the 32- or 64-bit field layout.
pub const OPT_MAGIC_PE32: u16 = 0x10B;
pub const OPT_MAGIC_PE32PLUS: u16 = 0x20B;

/// `image_file_header.Machine` values.
pub const MACHINE_I386: u16 = 0x014C;
pub const MACHINE_ARM: u16 = 0x01C0;
pub const MACHINE_ARMNT: u16 = 0x01C4;
pub const MACHINE_IA64: u16 = 0x0200;
pub const MACHINE_EBC: u16 = 0x0EBC;
pub const MACHINE_AMD64: u16 = 0x8664;
pub const MACHINE_ARM64: u16 = 0xAA64;

/// Positional data-directory names, indices 0 through 14.
const DATA_DIR_NAMES: [&str; 15] = [
    "EXPORT",
    "IMPORT",
    "RESOURCE",
    "EXCEPTION",
    "SECURITY",
    "BASERELOC",
    "DEBUG",
    "ARCHITECTURE",
    "GLOBALPTR",
    "TLS",
    "LOAD_CONFIG",
    "BOUND_IMPORT",
    "IAT",
    "DELAY_IMPORT",
    "COM_DESCRIPTOR",
];

/// Display name for a `Machine` value.
pub fn machine_str(value: u16) -> &'static str {
    match value {
        MACHINE_I386 => "I386",
        MACHINE_ARM => "ARM",
        MACHINE_ARMNT => "ARMNT",
        MACHINE_IA64 => "IA64",
        MACHINE_EBC => "EBC",
        MACHINE_AMD64 => "AMD64",
        MACHINE_ARM64 => "ARM64",
        _ => "UNKNOWN",
    }
}

/// Display name for a `Subsystem` value.
pub fn subsystem_str(value: u16) -> &'static str {
    match value {
        1 => "NATIVE",
        2 => "WINDOWS_GUI",
        3 => "WINDOWS_CUI",
        5 => "OS2_CUI",
        7 => "POSIX_CUI",
        9 => "WINDOWS_CE_GUI",
        10 => "EFI_APPLICATION",
        11 => "EFI_BOOT_SERVICE_DRIVER",
        12 => "EFI_RUNTIME_DRIVER",
        13 => "EFI_ROM",
        14 => "XBOX",
        16 => "WINDOWS_BOOT_APPLICATION",
        _ => "UNKNOWN",
    }
}

/// Positional name for a data-directory index.
pub fn data_dir_str(idx: u32) -> &'static str {
    DATA_DIR_NAMES
        .get(idx as usize)
        .copied()
        .unwrap_or("UNKNOWN")
}

/// Display name for a base-relocation entry type (x86/x64 table; the
/// MIPS/ARM/RISC-V overloads of slots 5 and 7 stay unnamed here).
pub fn reloc_type_str(value: u16) -> &'static str {
    match value {
        0 => "ABSOLUTE",
        1 => "HIGH",
        2 => "LOW",
        3 => "HIGHLOW",
        4 => "HIGHADJ",
        6 => "RESERVED",
        8 => "RISCV_LOW12S",
        9 => "JMPADDR16",
        10 => "DIR64",
        _ => "UNKNOWN",
    }
}
