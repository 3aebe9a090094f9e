//! `manifest.json` generation.
//!
//! The manifest maps every container entry path to the lowercase hex SHA-1
//! of its bytes. It is serialized as JSON with keys in ascending order,
//! two-space indentation and `" : "` between key and value, with `/`
//! escaped as `\/`. This reproduces the layout Apple's own tooling writes.

use crate::{Error, Result};
use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::io;

/// Builder for `manifest.json`.
///
/// # Examples
///
/// ```
/// use pkpass::Manifest;
///
/// let mut manifest = Manifest::new();
/// manifest.add("hi", b"hi");
/// manifest.add("bye", b"bye");
///
/// let json = String::from_utf8(manifest.finalize()?).unwrap();
/// assert!(json.find("\"bye\"").unwrap() < json.find("\"hi\"").unwrap());
/// # Ok::<(), pkpass::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: BTreeMap<String, String>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hashes `bytes` and records the digest under `name`.
    ///
    /// Entry paths are unique within a container, so a repeated `name`
    /// only happens when the caller bypasses the archive writer; the later
    /// digest wins.
    pub fn add(&mut self, name: impl Into<String>, bytes: &[u8]) {
        let name = name.into();
        let digest = sha1_hex(bytes);
        log::debug!("manifest: {name} -> {digest}");
        self.entries.insert(name, digest);
    }

    /// Hex digest recorded for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Iterates `(path, hex digest)` pairs in ascending path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serializes the manifest.
    ///
    /// The output depends only on the recorded `(path, digest)` pairs, so
    /// repeated calls return identical bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Manifest`] if JSON serialization fails.
    pub fn finalize(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(64 + self.entries.len() * 72);
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut out, ManifestFormatter::default());
        self.entries
            .serialize(&mut serializer)
            .map_err(|e| Error::Manifest(e.to_string()))?;
        Ok(out)
    }

    /// Parses a stored `manifest.json`.
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let entries: BTreeMap<String, String> = serde_json::from_slice(data)
            .map_err(|e| Error::Manifest(format!("Failed to parse manifest: {e}")))?;
        Ok(Self { entries })
    }

    /// Checks `bytes` against the digest recorded for `name`.
    pub fn matches(&self, name: &str, bytes: &[u8]) -> bool {
        self.get(name)
            .is_some_and(|digest| digest.eq_ignore_ascii_case(&sha1_hex(bytes)))
    }
}

/// Lowercase hex SHA-1 of `bytes`.
pub fn sha1_hex(bytes: &[u8]) -> String {
    hex::encode(Sha1::digest(bytes))
}

/// Pretty printer with `" : "` separators and escaped solidus.
#[derive(Default)]
struct ManifestFormatter {
    pretty: PrettyFormatter<'static>,
}

impl Formatter for ManifestFormatter {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b" : ")
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut rest = fragment;
        while let Some(idx) = rest.find('/') {
            writer.write_all(rest[..idx].as_bytes())?;
            writer.write_all(b"\\/")?;
            rest = &rest[idx + 1..];
        }
        writer.write_all(rest.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha1_fixtures() {
        assert_eq!(sha1_hex(b"hi"), "c22b5f9178342609428d6f51b2c5af4c0bde6a42");
        assert_eq!(sha1_hex(b"bye"), "78c9a53e2f28b543ea62c8266acfdf36d5c63e61");
    }

    #[test]
    fn test_two_entry_layout() {
        let mut manifest = Manifest::new();
        manifest.add("hi", b"hi");
        manifest.add("bye", b"bye");

        let json = String::from_utf8(manifest.finalize().unwrap()).unwrap();
        assert_eq!(
            json,
            concat!(
                "{\n",
                "  \"bye\" : \"78c9a53e2f28b543ea62c8266acfdf36d5c63e61\",\n",
                "  \"hi\" : \"c22b5f9178342609428d6f51b2c5af4c0bde6a42\"\n",
                "}"
            )
        );
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let mut manifest = Manifest::new();
        manifest.add("pass.json", b"{}");
        manifest.add("icon.png", b"icon");
        assert_eq!(manifest.finalize().unwrap(), manifest.finalize().unwrap());
    }

    #[test]
    fn test_slash_is_escaped_and_parses_back() {
        let mut manifest = Manifest::new();
        manifest.add("en.lproj/strip@2x.png", b"strip@2x");

        let bytes = manifest.finalize().unwrap();
        let json = std::str::from_utf8(&bytes).unwrap();
        let line = "\"en.lproj\\/strip@2x.png\" : \"7f43a4b8b7b4436fb4271e51b9d8c55334f26c59\"";
        assert!(json.contains(line));

        let parsed = Manifest::from_slice(&bytes).unwrap();
        assert_eq!(parsed, manifest);
    }

    #[test]
    fn test_matches() {
        let mut manifest = Manifest::new();
        manifest.add("background.png", b"background");
        assert!(manifest.matches("background.png", b"background"));
        assert!(!manifest.matches("background.png", b"tampered"));
        assert!(!manifest.matches("logo.png", b"background"));
    }

    #[test]
    fn test_empty_manifest() {
        assert_eq!(Manifest::new().finalize().unwrap(), b"{}");
    }
}
