//! Error types for pass construction and reading.
//!
//! This module defines the [`enum@Error`] enum covering every failure in the
//! pipeline: archive layout, certificate loading, CMS signing, record
//! decoding and signature verification.
//!
//! # See Also
//!
//! - [`crate::Result`] - Convenience type alias using this error

use thiserror::Error;

/// Error type for pass operations.
///
/// All public functions in this crate return [`crate::Result<T>`], which uses this error type.
/// Match on variants to handle specific failure cases.
///
/// # Examples
///
/// ```no_run
/// use pkpass::{Error, PassReader};
///
/// let reader = PassReader::open_file("Event.pkpass")?;
/// match reader.strings("de") {
///     Ok(table) => println!("{} keys", table.keys.len()),
///     Err(e) if e.is_not_found() => println!("no German localization"),
///     Err(e) => return Err(e),
/// }
/// # Ok::<(), pkpass::Error>(())
/// ```
#[derive(Debug, Error)]
pub enum Error {
    /// I/O operation failed.
    ///
    /// Only raised by the file-based convenience helpers; the core pipeline
    /// works on in-memory buffers.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive operation failed.
    ///
    /// Raised by the underlying archive codec while writing or reading entries.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// An entry with this path was already added to the archive.
    #[error("Duplicate archive entry: {0}")]
    DuplicateEntry(String),

    /// No entry with this path exists in the archive.
    ///
    /// Distinguishable from a corrupt container through [`Error::is_not_found`].
    #[error("Archive entry not found: {0}")]
    EntryNotFound(String),

    /// The entry path is empty, absolute, or escapes the archive root.
    #[error("Invalid archive entry path: {0:?}")]
    InvalidEntryPath(String),

    /// The archive's central directory or an entry's data is unreadable.
    #[error("Corrupt archive: {0}")]
    CorruptArchive(String),

    /// Invalid or malformed certificate or private key.
    ///
    /// The provided PEM/DER/PKCS#12 input could not be parsed. See
    /// [`crate::SigningCredentials`] for valid formats.
    #[error("Invalid certificate: {0}")]
    Certificate(String),

    /// Signature generation failed.
    ///
    /// Covers a private key that does not belong to the signing certificate,
    /// an RSA modulus too small for a SHA-256 digest, and RSA primitive failures.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// The pass record or a string table does not match the expected schema.
    ///
    /// `path` names the offending field, e.g. `boardingPass.transitType`.
    #[error("Invalid pass record at {path}: {message}")]
    RecordDecode {
        /// Location of the offending value.
        path: String,
        /// Decoder message.
        message: String,
    },

    /// The manifest could not be serialized or parsed.
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// Malformed DER, or a value that cannot be represented in DER.
    #[error("DER error: {0}")]
    Der(String),

    /// The signature or manifest does not match the container contents.
    #[error("Verification failed: {0}")]
    Verification(String),
}

impl Error {
    /// Returns `true` if this error means "the entry does not exist" rather
    /// than "the container is broken".
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::EntryNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinguishable() {
        assert!(Error::EntryNotFound("icon.png".into()).is_not_found());
        assert!(!Error::CorruptArchive("bad header".into()).is_not_found());
        assert!(!Error::DuplicateEntry("icon.png".into()).is_not_found());
    }

    #[test]
    fn test_record_decode_display_names_path() {
        let err = Error::RecordDecode {
            path: "barcodes[0].format".into(),
            message: "unknown variant".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid pass record at barcodes[0].format: unknown variant"
        );
    }
}
