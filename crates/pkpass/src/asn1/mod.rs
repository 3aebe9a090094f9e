//! ASN.1 building blocks for the CMS signer.
//!
//! - [`der`] - definite-length DER writer with canonical `SET OF` ordering
//! - [`reader`] - strict DER reader for certificates and signatures
//! - [`oid`] - the fixed object identifiers the signature uses
//! - [`time`] - calendar decomposition and `UTCTime`/`GeneralizedTime`

pub mod der;
pub mod oid;
pub mod reader;
pub mod time;

pub use der::DerWriter;
pub use oid::Oid;
pub use reader::{DerReader, Tlv};
pub use time::{to_components, Time, UtcComponents};
