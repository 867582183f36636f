//! Mach-O structural walk, 64-bit x86-64 images.
//!
//! The walk annotates `mach_header_64` with decoded magic/CPU/filetype
//! names, then iterates `ncmds` load commands. Each recognized command gets
//! a per-field decode plus a wrapping annotation; unrecognized commands get
//! a single spanning annotation. After every command the cursor resyncs to
//! `o_cmd + cmdsize`, so decoders that stop short of declared trailing
//! padding never desynchronize the loop.

pub mod types;

use crate::cursor::trim_nul_padding;
use crate::error::{DecodeFault, Result};
use crate::tagger::Tagger;
use types::*;

/// `true` when `data` starts with a little-endian 64-bit x86-64 Mach-O
/// header. Checks the magic, the CPU type, and the masked CPU subtype.
pub fn probe_macho64(data: &[u8]) -> bool {
    if data.len() < 12 {
        return false;
    }
    let word = |i: usize| u32::from_le_bytes(data[i..i + 4].try_into().unwrap());
    word(0) == MH_MAGIC_64
        && word(4) == CPU_TYPE_X86_64
        && (word(8) & 0xFF) == CPU_SUBTYPE_I386_ALL
}

/// Walks a 64-bit Mach-O image from offset zero.
pub fn walk_macho64(t: &mut Tagger) -> Result<()> {
    let ncmds = tag_header(t)?;
    for _ in 0..ncmds {
        tag_command(t)?;
    }
    Ok(())
}

/// Annotates `mach_header_64` and returns `ncmds`.
fn tag_header(t: &mut Tagger) -> Result<u32> {
    t.tag_peek(SIZE_MACH_HEADER_64, "mach_header_64")?;
    let magic = t.cur.peek_u32()?;
    t.tag(4, format!("magic={magic:#010X} ({})", magic_str(magic)))?;
    let cputype = t.cur.peek_u32()?;
    t.tag(4, format!("cputype={cputype:#010X} ({})", cputype_str(cputype)))?;
    let subtype = t.cur.peek_u32()?;
    t.tag(
        4,
        format!("cpusubtype={subtype:#010X} ({})", cpusubtype_label(subtype)),
    )?;
    let filetype = t.cur.peek_u32()?;
    t.tag(
        4,
        format!("filetype={filetype:#010X} ({})", filetype_str(filetype)),
    )?;
    let ncmds = t.tag_u32("ncmds")?;
    t.tag_u32("sizeofcmds")?;
    t.tag_u32("flags")?;
    t.tag_u32("reserved")?;
    Ok(ncmds)
}

/// Annotates one load command and resyncs the cursor past it.
fn tag_command(t: &mut Tagger) -> Result<()> {
    let o_cmd = t.cur.pos();
    let cmd = t.cur.peek_u32()?;
    t.tag(4, format!("cmd={cmd:#X} ({})", cmd_str(cmd)))?;
    let cmdsize = u64::from(t.tag_u32("cmdsize")?);
    // cmdsize includes cmd and cmdsize themselves; anything smaller cannot
    // advance the loop.
    if cmdsize < 8 {
        return Err(DecodeFault::HeaderSizeMismatch {
            field: "cmdsize",
            expected: 8,
            found: cmdsize,
        });
    }
    let cmd_end = o_cmd + cmdsize;

    match cmd {
        LC_SEGMENT_64 => tag_segment64(t, o_cmd, cmd_end)?,
        LC_LOAD_DYLIB | LC_ID_DYLIB => tag_dylib(t, o_cmd, cmd_end)?,
        LC_LOAD_DYLINKER | LC_ID_DYLINKER => tag_dylinker(t, o_cmd, cmd_end)?,
        LC_DYLD_INFO | LC_DYLD_INFO_ONLY => tag_dyld_info(t, o_cmd)?,
        LC_SYMTAB => tag_symtab(t, o_cmd)?,
        LC_DYSYMTAB => tag_dysymtab(t, o_cmd)?,
        LC_UUID => tag_uuid(t, o_cmd, cmd_end)?,
        LC_VERSION_MIN_MACOSX | LC_VERSION_MIN_IPHONEOS => tag_version_min(t, o_cmd, cmd_end)?,
        LC_SOURCE_VERSION => tag_source_version(t, o_cmd, cmd_end)?,
        LC_CODE_SIGNATURE | LC_SEGMENT_SPLIT_INFO | LC_FUNCTION_STARTS | LC_DATA_IN_CODE
        | LC_DYLIB_CODE_SIGN_DRS | LC_LINKER_OPTIMIZATION_HINT => {
            tag_linkedit_data(t, o_cmd, cmd_end, cmd)?
        }
        LC_MAIN => tag_entry_point(t, o_cmd, cmd_end)?,
        _ => t.note(o_cmd, cmd_end, format!("load_command {cmd:#X} (unknown)")),
    }

    t.cur.seek(cmd_end)
}

fn tag_segment64(t: &mut Tagger, o_cmd: u64, cmd_end: u64) -> Result<()> {
    let segname = t.tag_str(16, "segname")?;
    t.tag_u64("vmaddr")?;
    t.tag_u64("vmsize")?;
    t.tag_u64("fileoff")?;
    t.tag_u64("filesize")?;
    t.tag_u32("maxprot")?;
    t.tag_u32("initprot")?;
    let nsects = t.tag_u32("nsects")?;
    t.tag_u32("flags")?;
    for j in 0..nsects {
        let o_sect = t.cur.pos();
        let sectname = t.tag_str(16, "sectname")?;
        t.tag_str(16, "segname")?;
        t.tag_u64("addr")?;
        t.tag_u64("size")?;
        t.tag_u32("offset")?;
        t.tag_u32("align")?;
        t.tag_u32("reloff")?;
        t.tag_u32("nreloc")?;
        t.tag_u32("flags")?;
        t.tag_u32("reserved1")?;
        t.tag_u32("reserved2")?;
        t.tag_u32("reserved3")?;
        t.wrap(o_sect, format!("section_64 {}/{} \"{}\"", j + 1, nsects, sectname));
    }
    t.note(o_cmd, cmd_end, format!("segment_command_64 \"{segname}\""));
    Ok(())
}

fn tag_dylib(t: &mut Tagger, o_cmd: u64, cmd_end: u64) -> Result<()> {
    t.tag_peek(16, "dylib")?;
    let lc_str = u64::from(t.tag_u32("lc_str")?);
    t.tag_u32("timestamp")?;
    t.tag_u32("current_version")?;
    t.tag_u32("compatibility_version")?;
    let path = read_lc_path(t, o_cmd, cmd_end, lc_str)?;
    t.note(o_cmd, cmd_end, format!("dylib_command \"{path}\""));
    Ok(())
}

fn tag_dylinker(t: &mut Tagger, o_cmd: u64, cmd_end: u64) -> Result<()> {
    let lc_str = u64::from(t.tag_u32("lc_str")?);
    let path = read_lc_path(t, o_cmd, cmd_end, lc_str)?;
    t.note(o_cmd, cmd_end, format!("dylinker_command \"{path}\""));
    Ok(())
}

/// Reads the path that trails a dylib/dylinker command. `lc_str` is the
/// path's offset relative to the command start; the path runs to the end of
/// the command with trailing NULs stripped. The bytes themselves get no
/// annotation of their own, only the command wrap carries the path.
fn read_lc_path(t: &mut Tagger, o_cmd: u64, cmd_end: u64, lc_str: u64) -> Result<String> {
    let start = o_cmd.checked_add(lc_str).unwrap_or(u64::MAX);
    t.cur.seek(start)?;
    let bytes = t.cur.read_bytes(cmd_end.saturating_sub(start))?;
    Ok(trim_nul_padding(bytes))
}

fn tag_dyld_info(t: &mut Tagger, o_cmd: u64) -> Result<()> {
    t.tag_u32("rebase_off")?;
    t.tag_u32("rebase_size")?;
    t.tag_u32("bind_off")?;
    t.tag_u32("bind_size")?;
    t.tag_u32("weak_bind_off")?;
    t.tag_u32("weak_bind_size")?;
    t.tag_u32("lazy_bind_off")?;
    t.tag_u32("lazy_bind_size")?;
    t.tag_u32("export_off")?;
    t.tag_u32("export_size")?;
    t.wrap(o_cmd, "dyld_info_command");
    Ok(())
}

fn tag_symtab(t: &mut Tagger, o_cmd: u64) -> Result<()> {
    t.tag_u32("symoff")?;
    t.tag_u32("nsyms")?;
    t.tag_u32("stroff")?;
    t.tag_u32("strsize")?;
    t.wrap(o_cmd, "symtab_command");
    Ok(())
}

fn tag_dysymtab(t: &mut Tagger, o_cmd: u64) -> Result<()> {
    t.tag_u32("ilocalsym")?;
    t.tag_u32("nlocalsym")?;
    t.tag_u32("iextdefsym")?;
    t.tag_u32("nextdefsym")?;
    t.tag_u32("iundefsym")?;
    t.tag_u32("nundefsym")?;
    t.tag_u32("tocoff")?;
    t.tag_u32("ntoc")?;
    t.tag_u32("modtaboff")?;
    t.tag_u32("nmodtab")?;
    t.tag_u32("extrefsymoff")?;
    t.tag_u32("nextrefsyms")?;
    t.tag_u32("indirectsymoff")?;
    t.tag_u32("nindirectsyms")?;
    t.tag_u32("extreloff")?;
    t.tag_u32("nextrel")?;
    t.tag_u32("locreloff")?;
    t.tag_u32("nlocrel")?;
    t.wrap(o_cmd, "dysymtab_command");
    Ok(())
}

fn tag_uuid(t: &mut Tagger, o_cmd: u64, cmd_end: u64) -> Result<()> {
    let uuid = t.tag(16, "uuid")?;
    t.note(o_cmd, cmd_end, format!("uuid_command \"{}\"", hex::encode(uuid)));
    Ok(())
}

fn tag_version_min(t: &mut Tagger, o_cmd: u64, cmd_end: u64) -> Result<()> {
    let version = t.tag_u32("version")?;
    let sdk = t.tag_u32("sdk")?;
    t.note(
        o_cmd,
        cmd_end,
        format!(
            "version_min_command ver={} sdk={}",
            dotted_version32(version),
            dotted_version32(sdk)
        ),
    );
    Ok(())
}

fn tag_source_version(t: &mut Tagger, o_cmd: u64, cmd_end: u64) -> Result<()> {
    let version = t.tag_u64("version")?;
    t.note(
        o_cmd,
        cmd_end,
        format!("source_version_command {}", dotted_version64(version)),
    );
    Ok(())
}

fn tag_linkedit_data(t: &mut Tagger, o_cmd: u64, cmd_end: u64, cmd: u32) -> Result<()> {
    let kind = match cmd {
        LC_CODE_SIGNATURE => "signature",
        LC_SEGMENT_SPLIT_INFO => "splitinfo",
        LC_FUNCTION_STARTS => "function_starts",
        LC_DATA_IN_CODE => "data_in_code",
        LC_DYLIB_CODE_SIGN_DRS => "code_sign_drs",
        _ => "linker_optimization_hint",
    };
    t.tag_u32("dataoff")?;
    t.tag_u32("datasize")?;
    t.note(o_cmd, cmd_end, format!("linkedit_data_command ({kind})"));
    Ok(())
}

fn tag_entry_point(t: &mut Tagger, o_cmd: u64, cmd_end: u64) -> Result<()> {
    t.tag_u64("entryoff")?;
    t.tag_u64("stacksize")?;
    t.note(o_cmd, cmd_end, "entry_point_command");
    Ok(())
}

/// Splits an X.Y.Z version packed 16/8/8.
fn dotted_version32(v: u32) -> String {
    format!("{}.{}.{}", v >> 16, (v >> 8) & 0xFF, v & 0xFF)
}

/// Splits an A.B.C.D.E version packed 24/10/10/10/10.
fn dotted_version64(v: u64) -> String {
    format!(
        "{}.{}.{}.{}.{}",
        v >> 40,
        (v >> 30) & 0x3FF,
        (v >> 20) & 0x3FF,
        (v >> 10) & 0x3FF,
        v & 0x3FF
    )
}
