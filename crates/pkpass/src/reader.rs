//! Read-side container access.

use crate::archive::ArchiveReader;
use crate::crypto::{parse_signature, SignatureInfo};
use crate::image::{Image, ImageKind, Scale};
use crate::localization::{self, Localization};
use crate::manifest::Manifest;
use crate::pass::{Pass, Personalization};
use crate::{Error, Result, MANIFEST_FILE, PASS_FILE, PERSONALIZATION_FILE, SIGNATURE_FILE};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

/// An opened `.pkpass` container.
///
/// Every accessor decompresses its entry on demand, so a reader can be
/// queried any number of times in any order.
///
/// # Examples
///
/// ```no_run
/// use pkpass::{ImageKind, PassReader, Scale};
///
/// let reader = PassReader::open_file("Event.pkpass")?;
/// let pass = reader.pass()?;
/// println!("{} from {}", pass.description, pass.organization_name);
///
/// match reader.asset(ImageKind::Thumbnail, Scale::X2, None) {
///     Ok(png) => println!("thumbnail: {} bytes", png.len()),
///     Err(e) if e.is_not_found() => println!("no thumbnail"),
///     Err(e) => return Err(e),
/// }
/// for locale in reader.localizations() {
///     println!("localized for {locale}");
/// }
/// # Ok::<(), pkpass::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct PassReader {
    archive: ArchiveReader,
}

impl PassReader {
    /// Indexes the container without decompressing anything.
    pub fn open(bytes: impl Into<Arc<[u8]>>) -> Result<Self> {
        Ok(Self {
            archive: ArchiveReader::open(bytes)?,
        })
    }

    /// Reads and opens a container file.
    pub fn open_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::open(bytes)
    }

    /// The underlying archive index.
    pub fn archive(&self) -> &ArchiveReader {
        &self.archive
    }

    /// Raw `pass.json` bytes.
    pub fn pass_data(&self) -> Result<Vec<u8>> {
        self.archive.extract(PASS_FILE)
    }

    /// Decodes `pass.json`.
    ///
    /// # Errors
    ///
    /// - [`Error::EntryNotFound`] if the container has no `pass.json`
    /// - [`Error::RecordDecode`] with the JSON path of the bad value
    pub fn pass(&self) -> Result<Pass> {
        Pass::from_json(&self.pass_data()?)
    }

    /// Decodes `personalization.json`, or `None` if the pass has none.
    pub fn personalization(&self) -> Result<Option<Personalization>> {
        self.archive
            .extract_optional(PERSONALIZATION_FILE)?
            .map(|data| Personalization::from_json(&data))
            .transpose()
    }

    /// Image bytes for `kind` at `scale`, from the root or a locale directory.
    ///
    /// A missing image is [`Error::EntryNotFound`] (see [`Error::is_not_found`]);
    /// an unreadable one is [`Error::CorruptArchive`].
    pub fn asset(&self, kind: ImageKind, scale: Scale, locale: Option<&str>) -> Result<Vec<u8>> {
        self.image(Image::new(kind, scale), locale)
    }

    pub fn image(&self, image: Image, locale: Option<&str>) -> Result<Vec<u8>> {
        self.archive.extract(&image.path(locale))
    }

    /// Images present at `locale` (or the root for `None`).
    pub fn images(&self, locale: Option<&str>) -> Vec<Image> {
        let prefix = locale.map(|code| format!("{}/", Localization::directory(code)));
        self.archive
            .entries()
            .filter_map(|entry| match &prefix {
                Some(prefix) => entry.path.strip_prefix(prefix.as_str()),
                None => Some(entry.path.as_str()).filter(|p| !p.contains('/')),
            })
            .filter_map(Image::from_filename)
            .collect()
    }

    /// Locale codes with a `<code>.lproj/` directory.
    pub fn localizations(&self) -> BTreeSet<String> {
        let suffix = format!(".{}", localization::EXTENSION);
        self.archive
            .list_directories_matching(&format!("*{suffix}"))
            .into_iter()
            .filter_map(|dir| dir.strip_suffix(&suffix).map(str::to_string))
            .filter(|code| !code.is_empty())
            .collect()
    }

    /// Decodes `<locale>.lproj/pass.strings`.
    pub fn strings(&self, locale: &str) -> Result<Localization> {
        let data = self.archive.extract(&Localization::strings_path(locale))?;
        Localization::from_strings(locale, &data)
    }

    /// Decodes `manifest.json`.
    pub fn manifest(&self) -> Result<Manifest> {
        Manifest::from_slice(&self.archive.extract(MANIFEST_FILE)?)
    }

    /// Decodes the `signature` entry without checking it.
    pub fn signature(&self) -> Result<SignatureInfo> {
        parse_signature(&self.archive.extract(SIGNATURE_FILE)?)
    }

    /// Checks the signature over `manifest.json` and the manifest against
    /// every other entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Verification`] naming the first mismatch: a bad
    /// signature, an entry missing from the manifest, a manifest entry
    /// missing from the archive, or a digest that differs.
    pub fn verify(&self) -> Result<SignatureInfo> {
        let manifest_data = self.archive.extract(MANIFEST_FILE)?;
        let info = self.signature()?;
        info.verify(&manifest_data)?;

        let manifest = Manifest::from_slice(&manifest_data)?;
        let mut unlisted = Vec::new();
        for entry in self.archive.entries() {
            if entry.path == MANIFEST_FILE || entry.path == SIGNATURE_FILE {
                continue;
            }
            if !manifest.contains(&entry.path) {
                unlisted.push(entry.path.clone());
                continue;
            }
            let data = self.archive.extract(&entry.path)?;
            if !manifest.matches(&entry.path, &data) {
                return Err(Error::Verification(format!(
                    "digest of {} does not match the manifest",
                    entry.path
                )));
            }
        }
        if !unlisted.is_empty() {
            return Err(Error::Verification(format!(
                "entries missing from the manifest: {}",
                unlisted.join(", ")
            )));
        }

        if let Some((name, _)) = manifest.iter().find(|(name, _)| !self.archive.contains(name)) {
            log::warn!("verify: manifest lists {name}, which is not in the archive");
            return Err(Error::Verification(format!(
                "manifest lists {name}, which is not in the archive"
            )));
        }

        log::debug!("verify: {} manifest entries match", manifest.len());
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveWriter;

    fn container(paths: &[&str]) -> PassReader {
        let mut writer = ArchiveWriter::new();
        for path in paths {
            writer.add_entry(path, path.as_bytes()).unwrap();
        }
        PassReader::open(writer.finalize().unwrap()).unwrap()
    }

    #[test]
    fn test_localizations_ignore_order() {
        let reader = container(&[
            "fr.lproj/pass.strings",
            "icon.png",
            "en.lproj/logo.png",
            "en.lproj/pass.strings",
            "fr.lproj/strip@2x.png",
        ]);
        let locales: Vec<_> = reader.localizations().into_iter().collect();
        assert_eq!(locales, ["en", "fr"]);
    }

    #[test]
    fn test_missing_asset_is_not_found() {
        let reader = container(&["icon.png"]);
        assert_eq!(reader.asset(ImageKind::Icon, Scale::X1, None).unwrap(), b"icon.png");

        let err = reader.asset(ImageKind::Logo, Scale::X1, None).unwrap_err();
        assert!(err.is_not_found());
        let err = reader.asset(ImageKind::Icon, Scale::X1, Some("de")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_images_by_directory() {
        let reader = container(&["icon.png", "icon@2x.png", "en.lproj/logo.png", "notes.txt"]);
        assert_eq!(reader.images(None), [Image::icon(Scale::X1), Image::icon(Scale::X2)]);
        assert_eq!(reader.images(Some("en")), [Image::logo(Scale::X1)]);
    }

    #[test]
    fn test_personalization_is_optional() {
        assert_eq!(container(&["icon.png"]).personalization().unwrap(), None);

        let mut writer = ArchiveWriter::new();
        let json = br#"{
            "description": "Join",
            "requiredPersonalizationFields": ["PKPassPersonalizationFieldPhoneNumber"]
        }"#;
        writer.add_entry(PERSONALIZATION_FILE, json).unwrap();
        let reader = PassReader::open(writer.finalize().unwrap()).unwrap();
        let personalization = reader.personalization().unwrap().unwrap();
        assert_eq!(personalization.description, "Join");
        assert_eq!(
            personalization.required_personalization_fields,
            [crate::pass::PersonalizationField::PhoneNumber]
        );
    }

    #[test]
    fn test_missing_pass_record() {
        let reader = container(&["icon.png"]);
        assert!(reader.pass().unwrap_err().is_not_found());
    }
}
