//! In-memory ZIP construction.
//!
//! Entries are compressed as they are added. Every entry gets the same fixed
//! modification time and permissions, so identical input yields an identical
//! container.
//!
//! For the reverse operation, see the [`reader`](super::reader) module.

use crate::{Error, Result};
use std::collections::BTreeSet;
use std::fmt;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// ZIP compression level for container entries.
///
/// Controls the trade-off between compression speed and output file size.
/// Use the provided constants for common use cases, or [`CompressionLevel::new`]
/// for custom levels.
///
/// # Examples
///
/// ```
/// use pkpass::CompressionLevel;
///
/// let stored = CompressionLevel::NONE;
/// let balanced = CompressionLevel::DEFAULT;
///
/// // Custom levels are clamped to 0-9
/// assert_eq!(CompressionLevel::new(12).level(), 9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionLevel(u32);

impl CompressionLevel {
    /// No compression (level 0); entries are stored.
    pub const NONE: CompressionLevel = CompressionLevel(0);

    /// Default deflate level (6).
    pub const DEFAULT: CompressionLevel = CompressionLevel(6);

    /// Maximum deflate level (9).
    pub const MAX: CompressionLevel = CompressionLevel(9);

    /// Creates a compression level from 0-9.
    ///
    /// Values greater than 9 are clamped to 9.
    #[must_use]
    pub fn new(level: u32) -> Self {
        CompressionLevel(level.min(9))
    }

    /// Returns the compression level value (0-9).
    #[must_use]
    pub fn level(&self) -> u32 {
        self.0
    }

    fn file_options(self) -> SimpleFileOptions {
        let options = SimpleFileOptions::default()
            .last_modified_time(zip::DateTime::default())
            .unix_permissions(0o644);
        if self.0 == 0 {
            options.compression_method(CompressionMethod::Stored)
        } else {
            options
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(i64::from(self.0)))
        }
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u32> for CompressionLevel {
    fn from(level: u32) -> Self {
        CompressionLevel::new(level)
    }
}

/// Append-only ZIP writer over a memory buffer.
///
/// The writer is open until [`ArchiveWriter::finalize`] consumes it; there
/// is no way to add entries to a finalized archive.
///
/// # Examples
///
/// ```
/// use pkpass::archive::{ArchiveReader, ArchiveWriter};
///
/// let mut writer = ArchiveWriter::new();
/// writer.add_entry("pass.json", b"{}")?;
/// assert!(writer.add_entry("pass.json", b"{}").is_err());
///
/// let bytes = writer.finalize()?;
/// let reader = ArchiveReader::open(bytes)?;
/// assert_eq!(reader.extract("pass.json")?, b"{}");
/// # Ok::<(), pkpass::Error>(())
/// ```
pub struct ArchiveWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    names: BTreeSet<String>,
    options: SimpleFileOptions,
}

impl ArchiveWriter {
    /// Creates a writer using [`CompressionLevel::DEFAULT`].
    pub fn new() -> Self {
        Self::with_compression(CompressionLevel::DEFAULT)
    }

    pub fn with_compression(level: CompressionLevel) -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            names: BTreeSet::new(),
            options: level.file_options(),
        }
    }

    /// Changes the compression of entries added from now on.
    pub fn set_compression(&mut self, level: CompressionLevel) {
        self.options = level.file_options();
    }

    /// Compresses `bytes` into a new entry at `path`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidEntryPath`] if `path` is empty, absolute, uses
    ///   backslashes, or contains empty, `.` or `..` components
    /// - [`Error::DuplicateEntry`] if `path` was already added
    /// - [`Error::Zip`] / [`Error::Io`] if compression fails
    pub fn add_entry(&mut self, path: &str, bytes: &[u8]) -> Result<()> {
        validate_entry_path(path)?;
        if self.names.contains(path) {
            return Err(Error::DuplicateEntry(path.to_string()));
        }

        self.zip.start_file(path, self.options)?;
        self.zip.write_all(bytes)?;
        self.names.insert(path.to_string());
        log::debug!("archive: added {path} ({} bytes)", bytes.len());
        Ok(())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.names.contains(path)
    }

    /// Paths added so far, in ascending order.
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Writes the central directory and returns the complete archive.
    pub fn finalize(self) -> Result<Vec<u8>> {
        let count = self.names.len();
        let bytes = self.zip.finish()?.into_inner();
        log::debug!("archive: finalized {count} entries, {} bytes", bytes.len());
        Ok(bytes)
    }
}

impl fmt::Debug for ArchiveWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveWriter")
            .field("entries", &self.names)
            .finish_non_exhaustive()
    }
}

impl Default for ArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks that `path` is a relative, normalized, `/`-separated file path.
pub fn validate_entry_path(path: &str) -> Result<()> {
    let invalid = path.is_empty()
        || path.starts_with('/')
        || path.contains('\\')
        || path.contains('\0')
        || path
            .split('/')
            .any(|part| part.is_empty() || part == "." || part == "..");
    if invalid {
        return Err(Error::InvalidEntryPath(path.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_level_clamps() {
        assert_eq!(CompressionLevel::new(0).level(), 0);
        assert_eq!(CompressionLevel::new(9).level(), 9);
        assert_eq!(CompressionLevel::new(100).level(), 9);
        assert_eq!(CompressionLevel::from(3u32).level(), 3);
        assert_eq!(CompressionLevel::default(), CompressionLevel::DEFAULT);
    }

    #[test]
    fn test_duplicate_entry_rejected() {
        let mut writer = ArchiveWriter::new();
        writer.add_entry("icon.png", b"one").unwrap();

        let err = writer.add_entry("icon.png", b"two").unwrap_err();
        assert!(matches!(err, Error::DuplicateEntry(ref p) if p == "icon.png"));
        assert_eq!(writer.len(), 1);
    }

    #[test]
    fn test_invalid_paths_rejected() {
        let rejected = [
            "",
            "/pass.json",
            "../pass.json",
            "en.lproj//x",
            "a\\b",
            "./icon.png",
            "dir/",
        ];
        for path in rejected {
            let mut writer = ArchiveWriter::new();
            assert!(
                matches!(writer.add_entry(path, b"x"), Err(Error::InvalidEntryPath(_))),
                "path {path:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_output_is_reproducible() {
        let build = |level| {
            let mut writer = ArchiveWriter::with_compression(level);
            writer.add_entry("pass.json", br#"{"formatVersion":1}"#).unwrap();
            writer.add_entry("en.lproj/pass.strings", b"\"a\" = \"b\";\n").unwrap();
            writer.finalize().unwrap()
        };
        assert_eq!(build(CompressionLevel::DEFAULT), build(CompressionLevel::DEFAULT));
        assert_eq!(build(CompressionLevel::NONE), build(CompressionLevel::NONE));
    }

    #[test]
    fn test_finalize_produces_zip_signature() {
        let mut writer = ArchiveWriter::with_compression(CompressionLevel::NONE);
        writer.add_entry("a.txt", b"a").unwrap();
        let bytes = writer.finalize().unwrap();
        assert_eq!(&bytes[..4], b"PK\x03\x04");
        // End of central directory record.
        assert!(bytes.windows(4).any(|w| w == b"PK\x05\x06"));
    }
}
