//! Format walkers: one probe + walk pair per supported container format.

pub mod dex;
pub mod elf;
pub mod macho;
pub mod pe;
pub mod pgp;
