//! Build, sign and read PassKit `.pkpass` containers.
//!
//! A pass is a ZIP archive holding `pass.json`, images, per-locale string
//! tables, a `manifest.json` of SHA-1 digests over every other entry, and a
//! detached CMS `signature` over the manifest. The signature is assembled
//! directly from DER in [`crypto::cms`].
//!
//! - [`PassGenerator`] - add entries, sign, get the container bytes
//! - [`PassReader`] - open a container, decode the record, fetch assets, verify

pub mod archive;
pub mod asn1;
pub mod crypto;
pub mod error;
pub mod generator;
pub mod image;
pub mod localization;
pub mod manifest;
pub mod pass;
pub mod reader;

pub use archive::{ArchiveReader, ArchiveWriter, CompressionLevel};
pub use crypto::{Certificate, SignatureInfo, SigningCredentials};
pub use error::Error;
pub use generator::PassGenerator;
pub use image::{Image, ImageKind, Scale};
pub use localization::{Localization, LocalizedKey};
pub use manifest::Manifest;
pub use pass::{Pass, Personalization};
pub use reader::PassReader;

/// Archive path of the pass record.
pub const PASS_FILE: &str = "pass.json";

/// Archive path of the rewards signup form.
pub const PERSONALIZATION_FILE: &str = "personalization.json";

/// Archive path of the digest manifest.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Archive path of the detached signature.
pub const SIGNATURE_FILE: &str = "signature";

pub type Result<T> = std::result::Result<T, Error>;
