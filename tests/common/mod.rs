//! Shared synthetic-image builders for the integration tests.
//!
//! Each builder produces the smallest well-formed image that exercises the
//! corresponding walker; tests mutate the returned bytes to create the
//! malformed variants they need.

#![allow(dead_code)]

pub fn push_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

pub fn push_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

pub fn push_u64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// ELF64 little-endian header with no sections and no program headers.
pub fn minimal_elf64() -> Vec<u8> {
    let mut data = vec![0u8; 64];
    data[0..4].copy_from_slice(b"\x7fELF");
    data[4] = 2; // EI_CLASS: 64-bit
    data[5] = 1; // EI_DATA: little endian
    data[6] = 1; // EI_VERSION
    data[16] = 2; // e_type = ET_EXEC
    data[18] = 62; // e_machine = EM_X86_64
    data[20] = 1; // e_version
    data[52] = 64; // e_ehsize
    data
}

/// The 32-bit counterpart of [`minimal_elf64`].
pub fn minimal_elf32() -> Vec<u8> {
    let mut data = vec![0u8; 52];
    data[0..4].copy_from_slice(b"\x7fELF");
    data[4] = 1;
    data[5] = 1;
    data[6] = 1;
    data[16] = 2;
    data[18] = 3; // e_machine = EM_386
    data[20] = 1;
    data[40] = 0x34; // e_ehsize
    data
}

/// `mach_header_64` for an x86-64 executable with `ncmds` commands declared
/// (command bytes are the caller's problem).
pub fn macho64_header(ncmds: u32, sizeofcmds: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    push_u32(&mut buf, 0xFEEDFACF); // MH_MAGIC_64
    push_u32(&mut buf, 0x0100_0007); // CPU_TYPE_X86_64
    push_u32(&mut buf, 0x8000_0003); // LIB64 | I386_ALL
    push_u32(&mut buf, 2); // MH_EXECUTE
    push_u32(&mut buf, ncmds);
    push_u32(&mut buf, sizeofcmds);
    push_u32(&mut buf, 0); // flags
    push_u32(&mut buf, 0); // reserved
    buf
}

/// Mach-O 64 with a single LC_SYMTAB command.
pub fn minimal_macho64() -> Vec<u8> {
    let mut buf = macho64_header(1, 0x18);
    push_u32(&mut buf, 0x2); // LC_SYMTAB
    push_u32(&mut buf, 0x18);
    for _ in 0..4 {
        push_u32(&mut buf, 0);
    }
    buf
}

fn dos_header(e_lfanew: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(b"MZ");
    for _ in 0..13 {
        push_u16(&mut buf, 0);
    }
    buf.extend_from_slice(&[0; 8]); // e_res
    push_u16(&mut buf, 0); // e_oemid
    push_u16(&mut buf, 0); // e_oeminfo
    buf.extend_from_slice(&[0; 20]); // e_res2
    push_u32(&mut buf, e_lfanew);
    buf
}

fn pe_file_header(buf: &mut Vec<u8>, machine: u16, nsections: u16, opt_size: u16) {
    buf.extend_from_slice(b"PE\0\0");
    push_u16(buf, machine);
    push_u16(buf, nsections);
    push_u32(buf, 0); // TimeDateStamp
    push_u32(buf, 0); // PointerToSymbolTable
    push_u32(buf, 0); // NumberOfSymbols
    push_u16(buf, opt_size);
    push_u16(buf, 0x0102); // Characteristics
}

fn optional32(buf: &mut Vec<u8>, n_dirs: u32) {
    push_u16(buf, 0x10B);
    buf.push(9);
    buf.push(0);
    push_u32(buf, 0x400); // SizeOfCode
    push_u32(buf, 0x200); // SizeOfInitializedData
    push_u32(buf, 0); // SizeOfUninitializedData
    push_u32(buf, 0x1000); // AddressOfEntryPoint
    push_u32(buf, 0x1000); // BaseOfCode
    push_u32(buf, 0x2000); // BaseOfData
    push_u32(buf, 0x400000); // ImageBase
    push_u32(buf, 0x1000); // SectionAlignment
    push_u32(buf, 0x200); // FileAlignment
    for _ in 0..6 {
        push_u16(buf, 0);
    }
    push_u32(buf, 0); // Win32VersionValue
    push_u32(buf, 0x3000); // SizeOfImage
    push_u32(buf, 0x200); // SizeOfHeaders
    push_u32(buf, 0); // CheckSum
    push_u16(buf, 3); // Subsystem
    push_u16(buf, 0); // DllCharacteristics
    push_u32(buf, 0x100000); // SizeOfStackReserve
    push_u32(buf, 0x1000); // SizeOfStackCommit
    push_u32(buf, 0x100000); // SizeOfHeapReserve
    push_u32(buf, 0x1000); // SizeOfHeapCommit
    push_u32(buf, 0); // LoaderFlags
    push_u32(buf, n_dirs);
    for _ in 0..n_dirs * 2 {
        push_u32(buf, 0);
    }
}

fn optional64(buf: &mut Vec<u8>, n_dirs: u32) {
    push_u16(buf, 0x20B);
    buf.push(14);
    buf.push(0);
    push_u32(buf, 0x400);
    push_u32(buf, 0x200);
    push_u32(buf, 0);
    push_u32(buf, 0x1000);
    push_u32(buf, 0x1000);
    push_u64(buf, 0x1_4000_0000); // ImageBase
    push_u32(buf, 0x1000);
    push_u32(buf, 0x200);
    for _ in 0..6 {
        push_u16(buf, 0);
    }
    push_u32(buf, 0);
    push_u32(buf, 0x3000);
    push_u32(buf, 0x200);
    push_u32(buf, 0);
    push_u16(buf, 2); // Subsystem
    push_u16(buf, 0x8160);
    push_u64(buf, 0x100000);
    push_u64(buf, 0x1000);
    push_u64(buf, 0x100000);
    push_u64(buf, 0x1000);
    push_u32(buf, 0);
    push_u32(buf, n_dirs);
    for _ in 0..n_dirs * 2 {
        push_u32(buf, 0);
    }
}

fn pe_section_header(buf: &mut Vec<u8>, name: &str, raw_size: u32, raw_ptr: u32) {
    let mut field = [0u8; 8];
    field[..name.len()].copy_from_slice(name.as_bytes());
    buf.extend_from_slice(&field);
    push_u32(buf, raw_size); // VirtualSize
    push_u32(buf, 0x1000); // VirtualAddress
    push_u32(buf, raw_size);
    push_u32(buf, raw_ptr);
    push_u32(buf, 0);
    push_u32(buf, 0);
    push_u16(buf, 0);
    push_u16(buf, 0);
    push_u32(buf, 0x6000_0020); // Characteristics
}

/// PE32 with one `.text` section whose raw data sits at 0xF0.
pub fn minimal_pe32() -> Vec<u8> {
    let mut buf = dos_header(0x40);
    pe_file_header(&mut buf, 0x014C, 1, 0x70);
    optional32(&mut buf, 2);
    pe_section_header(&mut buf, ".text", 0x10, 0xF0);
    buf.resize(0xF0, 0);
    buf.extend_from_slice(&[0x90; 0x10]);
    buf
}

/// PE32+ with no sections.
pub fn minimal_pe64() -> Vec<u8> {
    let mut buf = dos_header(0x40);
    pe_file_header(&mut buf, 0x8664, 0, 0x70);
    optional64(&mut buf, 0);
    buf
}

/// DEX header with empty id tables.
pub fn minimal_dex() -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(b"dex\n035\0");
    push_u32(&mut buf, 0x1234_5678); // checksum
    buf.extend_from_slice(&[0xAB; 20]); // signature
    push_u32(&mut buf, 0x70); // file_size
    push_u32(&mut buf, 0x70); // header_size
    push_u32(&mut buf, 0x12345678); // endian_tag
    buf.resize(0x70, 0);
    buf
}

/// DEX with one string ("LFoo;"), one type, and one class_def referencing
/// the type. The class_idx field sits 32 bytes from the end.
pub fn dex_with_class_def() -> Vec<u8> {
    let mut buf = minimal_dex();

    let o_data = buf.len() as u32;
    buf.push(5); // utf16_size
    buf.extend_from_slice(b"LFoo;\0");

    let o_string_ids = buf.len() as u32;
    push_u32(&mut buf, o_data);
    buf[0x38..0x3C].copy_from_slice(&1u32.to_le_bytes());
    buf[0x3C..0x40].copy_from_slice(&o_string_ids.to_le_bytes());

    let o_type_ids = buf.len() as u32;
    push_u32(&mut buf, 0);
    buf[0x40..0x44].copy_from_slice(&1u32.to_le_bytes());
    buf[0x44..0x48].copy_from_slice(&o_type_ids.to_le_bytes());

    let o_class_defs = buf.len() as u32;
    push_u32(&mut buf, 0); // class_idx
    for _ in 0..7 {
        push_u32(&mut buf, 0);
    }
    buf[0x60..0x64].copy_from_slice(&1u32.to_le_bytes());
    buf[0x64..0x68].copy_from_slice(&o_class_defs.to_le_bytes());

    let size = buf.len() as u32;
    buf[32..36].copy_from_slice(&size.to_le_bytes());
    buf
}

/// Old-format literal-data packet (tag 11, length type 0) carrying `data`.
pub fn pgp_literal(data: &[u8]) -> Vec<u8> {
    let body_len = 6 + data.len();
    assert!(body_len <= 0xFF);
    let mut buf = vec![0xAC, body_len as u8];
    buf.push(b'b'); // format
    buf.push(0); // filename length
    buf.extend_from_slice(&[0, 0, 0, 0]); // date
    buf.extend_from_slice(data);
    buf
}
