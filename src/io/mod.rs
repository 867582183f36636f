//! Bounded and safe I/O for whole-file tagging.
//!
//! This module provides a `SafeReader` that memory-maps a file and exposes
//! its full contents as a byte slice for the format walkers. A size limit
//! protects against mapping pathologically large files.

pub mod error;

pub use crate::io::error::IoError;

use crate::io::error::Result;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

/// Defines the resource limits for I/O operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoLimits {
    /// The absolute maximum file size that can be opened.
    pub max_file_size: u64,
}

impl Default for IoLimits {
    fn default() -> Self {
        Self {
            max_file_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// A bounded file reader that memory-maps the whole file for tagging.
///
/// Walkers need random access across the entire image (section contents,
/// string tables and index tables live far from the headers), so the file
/// is mapped once and exposed as a single slice.
pub struct SafeReader {
    // None when the file size is zero; memmap cannot map empty files.
    mmap: Option<Mmap>,
    file_size: u64,
}

impl SafeReader {
    /// Opens a file, memory-maps it, and wraps it in a `SafeReader`.
    ///
    /// This function will fail if the file size exceeds `limits.max_file_size`.
    pub fn open<P: AsRef<Path>>(path: P, limits: IoLimits) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let metadata = file.metadata()?;
        let file_size = metadata.len();

        debug!(
            path = %path.display(),
            size = file_size,
            limits.max_file_size = limits.max_file_size,
            "Opening file for tagging"
        );

        if file_size > limits.max_file_size {
            warn!(
                path = %path.display(),
                size = file_size,
                limit = limits.max_file_size,
                "File is too large"
            );
            return Err(IoError::FileTooLarge {
                limit: limits.max_file_size,
                found: file_size,
            });
        }

        // For zero-length files, do not attempt to mmap (unsupported); keep None.
        // For non-empty files, map read-only.
        let mmap = if file_size == 0 {
            None
        } else {
            // Safety: The file is backed by a real file on disk and we only request a read-only map.
            Some(unsafe { Mmap::map(&file)? })
        };

        Ok(Self { mmap, file_size })
    }

    /// Returns the total size of the underlying file in bytes.
    pub fn size(&self) -> u64 {
        self.file_size
    }

    /// Returns the mapped file contents.
    pub fn data(&self) -> &[u8] {
        match &self.mmap {
            Some(m) => &m[..],
            None => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_file(content: &[u8]) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content).unwrap();
        temp_file
    }

    #[test]
    fn open_file_successfully() {
        let file = create_temp_file(b"hello world");
        let limits = IoLimits::default();
        let reader = SafeReader::open(file.path(), limits).unwrap();
        assert_eq!(reader.size(), 11);
        assert_eq!(reader.data(), b"hello world");
    }

    #[test]
    fn open_file_too_large() {
        let file = create_temp_file(&[0; 100]);
        let limits = IoLimits { max_file_size: 50 };
        let result = SafeReader::open(file.path(), limits);
        assert!(matches!(result, Err(IoError::FileTooLarge { .. })));
    }

    #[test]
    fn open_missing_file() {
        let result = SafeReader::open("/nonexistent/scatha-test", IoLimits::default());
        assert!(matches!(result, Err(IoError::StdIo(_))));
    }

    #[test]
    fn open_empty_file() {
        let file = create_temp_file(b"");
        let limits = IoLimits::default();
        let reader = SafeReader::open(file.path(), limits).unwrap();
        assert_eq!(reader.size(), 0);
        assert!(reader.data().is_empty());
    }
}
