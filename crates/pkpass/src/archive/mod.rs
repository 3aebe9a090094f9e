//! Container (ZIP) writing and reading.
//!
//! - [`ArchiveWriter`] - append-only in-memory archive construction
//! - [`ArchiveReader`] - central-directory index with on-demand extraction

pub mod reader;
pub mod writer;

pub use reader::{ArchiveReader, DirectoryEntry};
pub use writer::{validate_entry_path, ArchiveWriter, CompressionLevel};
