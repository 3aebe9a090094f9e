//! Write-side container assembly.
//!
//! [`PassGenerator`] feeds every entry into both the archive and the
//! manifest, then signs the manifest and closes the archive:
//!
//! ```text
//! add_pass / add_image / add_localization ...
//!   -> manifest_data()          sorted SHA-1 JSON
//!   -> cms::sign(manifest)      detached SignedData
//!   -> add_manifest, add_signature
//!   -> archive_data()           finished .pkpass bytes
//! ```
//!
//! [`PassGenerator::sign`] runs the last four steps in one call.

use crate::archive::{ArchiveWriter, CompressionLevel};
use crate::crypto::{cms, SigningCredentials};
use crate::image::Image;
use crate::localization::{validate_locale_code, Localization};
use crate::manifest::Manifest;
use crate::pass::{Pass, Personalization};
use crate::{Error, Result, MANIFEST_FILE, PASS_FILE, PERSONALIZATION_FILE, SIGNATURE_FILE};
use std::time::SystemTime;

/// Builds one signed pass.
///
/// # Example
///
/// ```no_run
/// use pkpass::{CompressionLevel, Image, PassGenerator, Scale, SigningCredentials};
///
/// let credentials = SigningCredentials::from_p12(
///     &std::fs::read("pass.p12")?,
///     "password",
///     Some(&std::fs::read("wwdr.pem")?),
/// )?;
///
/// let mut generator = PassGenerator::new().compression_level(CompressionLevel::MAX);
/// generator.add_pass_data(&std::fs::read("pass.json")?)?;
/// generator.add_image(Image::icon(Scale::X2), None, &std::fs::read("icon@2x.png")?)?;
/// let pkpass = generator.sign(&credentials)?;
/// std::fs::write("Event.pkpass", pkpass)?;
/// # Ok::<(), pkpass::Error>(())
/// ```
#[derive(Debug)]
pub struct PassGenerator {
    archive: ArchiveWriter,
    manifest: Manifest,
    signing_time: Option<SystemTime>,
    identity: Option<(String, String)>,
}

impl PassGenerator {
    /// Creates an empty generator with default compression.
    pub fn new() -> Self {
        Self {
            archive: ArchiveWriter::new(),
            manifest: Manifest::new(),
            signing_time: None,
            identity: None,
        }
    }

    /// Set ZIP compression level (0-9) for entries added afterwards.
    ///
    /// 0 = stored, 9 = maximum compression. Default is 6.
    #[must_use]
    pub fn compression_level(mut self, level: CompressionLevel) -> Self {
        self.archive.set_compression(level);
        self
    }

    /// Fix the signing time instead of using the clock at signing.
    ///
    /// Together with the fixed entry timestamps this makes the output
    /// byte-for-byte reproducible.
    #[must_use]
    pub fn signing_time(mut self, time: SystemTime) -> Self {
        self.signing_time = Some(time);
        self
    }

    /// Validates and encodes `pass`, storing it as `pass.json`.
    pub fn add_pass(&mut self, pass: &Pass) -> Result<()> {
        pass.validate()?;
        let data = pass.to_json()?;
        self.add_record(pass, &data)
    }

    /// Stores pre-encoded `pass.json` bytes after checking they decode.
    ///
    /// The bytes are stored unchanged.
    pub fn add_pass_data(&mut self, data: &[u8]) -> Result<()> {
        let pass = Pass::from_json(data)?;
        pass.validate()?;
        self.add_record(&pass, data)
    }

    fn add_record(&mut self, pass: &Pass, data: &[u8]) -> Result<()> {
        self.add(PASS_FILE, data)?;
        self.identity = Some((
            pass.pass_type_identifier.clone(),
            pass.team_identifier.clone(),
        ));
        Ok(())
    }

    /// Validates and stores `personalization.json`.
    ///
    /// The pass still needs a [`crate::ImageKind::PersonalizationLogo`] image
    /// and an `nfc` payload for Wallet to offer the signup form.
    pub fn add_personalization(&mut self, personalization: &Personalization) -> Result<()> {
        personalization.validate()?;
        let data = personalization.to_json()?;
        self.add(PERSONALIZATION_FILE, &data)
    }

    /// Stores pre-encoded `personalization.json` bytes after checking they
    /// decode.
    pub fn add_personalization_data(&mut self, data: &[u8]) -> Result<()> {
        Personalization::from_json(data)?.validate()?;
        self.add(PERSONALIZATION_FILE, data)
    }

    /// Stores an image, optionally inside a localization directory.
    pub fn add_image(&mut self, image: Image, locale: Option<&str>, data: &[u8]) -> Result<()> {
        if let Some(code) = locale {
            validate_locale_code(code)?;
        }
        self.add(&image.path(locale), data)
    }

    /// Stores raw `.strings` bytes as `<code>.lproj/pass.strings`.
    ///
    /// The table is parsed first so a malformed file is reported here
    /// rather than silently ignored on the device.
    pub fn add_strings(&mut self, code: &str, data: &[u8]) -> Result<()> {
        Localization::from_strings(code, data)?;
        self.add(&Localization::strings_path(code), data)
    }

    /// Encodes and stores a string table.
    pub fn add_localization(&mut self, localization: &Localization) -> Result<()> {
        validate_locale_code(&localization.code)?;
        let data = localization.to_strings();
        self.add(&Localization::strings_path(&localization.code), data.as_bytes())
    }

    /// Stores any other file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEntryPath`] for the reserved `manifest.json`
    /// and `signature` names.
    pub fn add_file(&mut self, path: &str, data: &[u8]) -> Result<()> {
        if path == MANIFEST_FILE || path == SIGNATURE_FILE {
            return Err(Error::InvalidEntryPath(path.to_string()));
        }
        self.add(path, data)
    }

    fn add(&mut self, path: &str, data: &[u8]) -> Result<()> {
        self.archive.add_entry(path, data)?;
        self.manifest.add(path, data);
        Ok(())
    }

    /// The manifest over every entry added so far.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Encoded `manifest.json` over every entry added so far.
    pub fn manifest_data(&self) -> Result<Vec<u8>> {
        self.manifest.finalize()
    }

    /// Stores the manifest bytes. Not recorded in the manifest itself.
    pub fn add_manifest(&mut self, data: &[u8]) -> Result<()> {
        self.archive.add_entry(MANIFEST_FILE, data)
    }

    /// Stores the detached signature. Not recorded in the manifest.
    pub fn add_signature(&mut self, data: &[u8]) -> Result<()> {
        self.archive.add_entry(SIGNATURE_FILE, data)
    }

    /// Closes the archive and returns its bytes.
    pub fn archive_data(self) -> Result<Vec<u8>> {
        self.archive.finalize()
    }

    /// Computes the manifest, signs it, stores both and returns the
    /// finished container.
    ///
    /// Uses the time set with [`PassGenerator::signing_time`], or the
    /// current time.
    ///
    /// # Errors
    ///
    /// - [`Error::EntryNotFound`] if no `pass.json` was added
    /// - [`Error::Signing`] if the RSA operation fails
    pub fn sign(self, credentials: &SigningCredentials) -> Result<Vec<u8>> {
        let time = self.signing_time.unwrap_or_else(SystemTime::now);
        self.sign_at(credentials, time)
    }

    /// Like [`PassGenerator::sign`] with an explicit signing time.
    pub fn sign_at(
        mut self,
        credentials: &SigningCredentials,
        time: SystemTime,
    ) -> Result<Vec<u8>> {
        if !self.archive.contains(PASS_FILE) {
            return Err(Error::EntryNotFound(PASS_FILE.to_string()));
        }
        self.check_identity(credentials);

        let manifest = self.manifest_data()?;
        let signature = cms::sign_at(&manifest, credentials, time)?;
        self.add_manifest(&manifest)?;
        self.add_signature(&signature)?;
        log::debug!(
            "generator: signed {} entries for {:?}",
            self.manifest.len(),
            credentials.certificate().common_name()
        );
        self.archive_data()
    }

    // Wallet refuses passes whose identifiers disagree with the certificate.
    fn check_identity(&self, credentials: &SigningCredentials) {
        let Some((pass_type, team)) = &self.identity else {
            return;
        };
        let certificate = credentials.certificate();
        if let Some(cert_team) = certificate.team_identifier() {
            if &cert_team != team {
                log::warn!(
                    "generator: teamIdentifier {team:?} differs from certificate team {cert_team:?}"
                );
            }
        }
        if let Some(name) = certificate.common_name() {
            if !name.ends_with(pass_type.as_str()) {
                log::warn!(
                    "generator: passTypeIdentifier {pass_type:?} differs from certificate {name:?}"
                );
            }
        }
    }
}

impl Default for PassGenerator {
    fn default() -> Self {
        Self::new()
    }
}
