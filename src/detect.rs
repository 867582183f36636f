//! Format detection and the walker registry.
//!
//! One descriptor per supported format, probed in a fixed priority order:
//! the magic-anchored probes (ELF, Mach-O, PE, DEX) come before the
//! content-only OpenPGP probe, and within ELF/PE the 64-bit class is tried
//! first. Probes are pure functions over the image prefix; a non-match is a
//! normal `false`, never a fault.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::formats::{dex, elf, macho, pe, pgp};
use crate::tagger::Tagger;

/// Identity of a supported container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatId {
    Elf64,
    Elf32,
    MachO64,
    Pe64,
    Pe32,
    Dex,
    OpenPgp,
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormatId::Elf64 => "ELF64",
            FormatId::Elf32 => "ELF32",
            FormatId::MachO64 => "Mach-O64",
            FormatId::Pe64 => "PE64",
            FormatId::Pe32 => "PE32",
            FormatId::Dex => "DEX",
            FormatId::OpenPgp => "OpenPGP",
        };
        write!(f, "{name}")
    }
}

/// One registered probe + walk pair.
pub struct FormatDescriptor {
    pub id: FormatId,
    pub probe: fn(&[u8]) -> bool,
    pub walk: fn(&mut Tagger<'_>) -> Result<()>,
}

static REGISTRY: Lazy<Vec<FormatDescriptor>> = Lazy::new(|| {
    vec![
        FormatDescriptor {
            id: FormatId::Elf64,
            probe: elf::probe_elf64,
            walk: elf::walk_elf64,
        },
        FormatDescriptor {
            id: FormatId::Elf32,
            probe: elf::probe_elf32,
            walk: elf::walk_elf32,
        },
        FormatDescriptor {
            id: FormatId::MachO64,
            probe: macho::probe_macho64,
            walk: macho::walk_macho64,
        },
        FormatDescriptor {
            id: FormatId::Pe64,
            probe: pe::probe_pe64,
            walk: pe::walk_pe64,
        },
        FormatDescriptor {
            id: FormatId::Pe32,
            probe: pe::probe_pe32,
            walk: pe::walk_pe32,
        },
        FormatDescriptor {
            id: FormatId::Dex,
            probe: dex::probe_dex,
            walk: dex::walk_dex,
        },
        FormatDescriptor {
            id: FormatId::OpenPgp,
            probe: pgp::probe_pgp,
            walk: pgp::walk_pgp,
        },
    ]
});

/// All registered descriptors in probe-priority order.
pub fn registry() -> &'static [FormatDescriptor] {
    &REGISTRY
}

/// Identifies the format of `data`, if any probe claims it.
pub fn detect(data: &[u8]) -> Option<FormatId> {
    claim(data).map(|d| d.id)
}

/// The first descriptor whose probe claims `data`.
pub(crate) fn claim(data: &[u8]) -> Option<&'static FormatDescriptor> {
    REGISTRY.iter().find(|d| (d.probe)(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elf_ident(class: u8) -> Vec<u8> {
        let mut data = vec![0u8; 64];
        data[0..4].copy_from_slice(b"\x7fELF");
        data[4] = class;
        data[5] = 1;
        data[6] = 1;
        data
    }

    #[test]
    fn test_registry_order() {
        let ids: Vec<FormatId> = registry().iter().map(|d| d.id).collect();
        assert_eq!(
            ids,
            [
                FormatId::Elf64,
                FormatId::Elf32,
                FormatId::MachO64,
                FormatId::Pe64,
                FormatId::Pe32,
                FormatId::Dex,
                FormatId::OpenPgp,
            ]
        );
    }

    #[test]
    fn test_detect_basics() {
        assert_eq!(detect(&elf_ident(2)), Some(FormatId::Elf64));
        assert_eq!(detect(&elf_ident(1)), Some(FormatId::Elf32));
        assert_eq!(detect(b"dex\n035\0more"), Some(FormatId::Dex));
        assert_eq!(detect(&[0xAC, 0x00]), Some(FormatId::OpenPgp));
        assert_eq!(detect(b"not a binary"), None);
        assert_eq!(detect(&[]), None);
    }

    #[test]
    fn test_elf_outranks_pgp() {
        // \x7f has bit 7 clear so there is no ambiguity, but an ELF image
        // whose class byte is damaged falls all the way through
        let mut data = elf_ident(2);
        data[4] = 9;
        assert_eq!(detect(&data), None);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(FormatId::MachO64.to_string(), "Mach-O64");
        assert_eq!(FormatId::OpenPgp.to_string(), "OpenPGP");
    }
}
