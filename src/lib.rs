//! Scatha: structural byte-range annotation for binary container formats.
//!
//! Given a byte image, the engine detects which supported format it is
//! (ELF 32/64, Mach-O 64, PE 32/64, DEX, OpenPGP packet stream) and walks
//! that format's structure, emitting an ordered list of labeled byte
//! ranges: headers, tables, variable-length records, and their fields.
//! Hosts (hex viewers, triage pipelines) render or index the annotations;
//! the engine itself never writes to stdout and never mutates its input.
//!
//! ```
//! let mut image = vec![0u8; 64];
//! image[0..4].copy_from_slice(b"\x7fELF");
//! image[4] = 2; // 64-bit
//! image[5] = 1; // little endian
//! image[6] = 1;
//! image[52] = 64; // e_ehsize
//!
//! let annotations = scatha::tag_format(&image).unwrap();
//! assert_eq!(annotations[0].label, "elf64_hdr");
//! ```

pub mod annot;
pub mod cursor;
pub mod detect;
pub mod error;
pub mod formats;
pub mod io;
pub mod logging;
pub mod strtab;
pub mod tagger;

pub use annot::{Annotation, ByteRange, Sink};
pub use cursor::{Cursor, Endian};
pub use detect::{detect, FormatId};
pub use error::{DecodeFault, ScathaError};
pub use io::{IoLimits, SafeReader};
pub use strtab::StringTable;
pub use tagger::Tagger;

use tracing::debug;

/// Detects the format of `data` and walks it, returning the annotations in
/// emission order.
///
/// `NoMatchingFormat` when no probe claims the input; otherwise the
/// selected walker's result. A fatal fault discards any annotations
/// gathered before it.
pub fn tag_format(data: &[u8]) -> Result<Vec<Annotation>, DecodeFault> {
    let desc = detect::claim(data).ok_or(DecodeFault::NoMatchingFormat)?;
    debug!(format = %desc.id, size = data.len(), "walking image");
    let mut tagger = Tagger::new(data);
    (desc.walk)(&mut tagger)?;
    Ok(tagger.into_annotations())
}

/// Memory-maps a file under the default [`IoLimits`] and tags it.
pub fn tag_file<P: AsRef<std::path::Path>>(path: P) -> Result<Vec<Annotation>, ScathaError> {
    tag_file_with_limits(path, IoLimits::default())
}

/// Memory-maps a file under explicit limits and tags it.
pub fn tag_file_with_limits<P: AsRef<std::path::Path>>(
    path: P,
    limits: IoLimits,
) -> Result<Vec<Annotation>, ScathaError> {
    let reader = SafeReader::open(path, limits)?;
    Ok(tag_format(reader.data())?)
}
