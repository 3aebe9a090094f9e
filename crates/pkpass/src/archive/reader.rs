//! Directory-indexed ZIP reading.
//!
//! [`ArchiveReader::open`] scans the central directory once and keeps an
//! index of entries; nothing is decompressed until [`ArchiveReader::extract`]
//! asks for a specific path. Extraction takes `&self`, so one reader serves
//! any number of lookups in any order.

use crate::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Read};
use std::sync::Arc;
use zip::result::ZipError;
use zip::{CompressionMethod, ZipArchive};

/// Central-directory metadata for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub path: String,
    /// Offset of the local file header from the start of the archive.
    pub header_offset: u64,
    pub compressed_size: u64,
    pub size: u64,
    pub compression: CompressionMethod,
    pub crc32: u32,
}

/// Read-only view of a ZIP archive held in memory.
#[derive(Clone)]
pub struct ArchiveReader {
    archive: ZipArchive<Cursor<Arc<[u8]>>>,
    directory: BTreeMap<String, DirectoryEntry>,
    data_len: u64,
}

impl ArchiveReader {
    /// Parses the central directory of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptArchive`] if `bytes` is not a readable ZIP
    /// archive.
    pub fn open(bytes: impl Into<Arc<[u8]>>) -> Result<Self> {
        let data: Arc<[u8]> = bytes.into();
        let data_len = data.len() as u64;
        let mut archive = ZipArchive::new(Cursor::new(data)).map_err(corrupt)?;

        let mut directory = BTreeMap::new();
        for i in 0..archive.len() {
            let file = archive.by_index_raw(i).map_err(corrupt)?;
            if file.is_dir() {
                continue;
            }
            let entry = DirectoryEntry {
                path: file.name().to_string(),
                header_offset: file.header_start(),
                compressed_size: file.compressed_size(),
                size: file.size(),
                compression: file.compression(),
                crc32: file.crc32(),
            };
            directory.insert(entry.path.clone(), entry);
        }
        log::debug!("archive: opened with {} entries", directory.len());

        Ok(Self {
            archive,
            directory,
            data_len,
        })
    }

    /// Decompresses the entry at `path`.
    ///
    /// # Errors
    ///
    /// - [`Error::EntryNotFound`] if no such entry exists
    /// - [`Error::CorruptArchive`] if the entry's data cannot be decoded
    pub fn extract(&self, path: &str) -> Result<Vec<u8>> {
        let entry = self
            .directory
            .get(path)
            .ok_or_else(|| Error::EntryNotFound(path.to_string()))?;

        let mut archive = self.archive.clone();
        let mut file = archive.by_name(path).map_err(|e| match e {
            ZipError::FileNotFound => Error::EntryNotFound(path.to_string()),
            other => corrupt(other),
        })?;

        // The declared size is only a hint and may be forged.
        let hint = entry.size.min(self.data_len);
        let mut bytes = Vec::with_capacity(usize::try_from(hint).unwrap_or(0));
        file.read_to_end(&mut bytes)
            .map_err(|e| Error::CorruptArchive(format!("{path}: {e}")))?;
        Ok(bytes)
    }

    /// Like [`ArchiveReader::extract`], but maps "not found" to `None`.
    pub fn extract_optional(&self, path: &str) -> Result<Option<Vec<u8>>> {
        match self.extract(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.directory.contains_key(path)
    }

    pub fn entry(&self, path: &str) -> Option<&DirectoryEntry> {
        self.directory.get(path)
    }

    /// All file entries in ascending path order.
    pub fn entries(&self) -> impl Iterator<Item = &DirectoryEntry> {
        self.directory.values()
    }

    pub fn len(&self) -> usize {
        self.directory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directory.is_empty()
    }

    /// Top-level directory names (derived from entry path prefixes) that
    /// match `pattern`. `*` matches any run of characters and `?` any
    /// single character.
    ///
    /// ```
    /// use pkpass::archive::{ArchiveReader, ArchiveWriter};
    ///
    /// let mut writer = ArchiveWriter::new();
    /// writer.add_entry("fr.lproj/pass.strings", b"")?;
    /// writer.add_entry("en.lproj/pass.strings", b"")?;
    /// writer.add_entry("icon.png", b"")?;
    /// let reader = ArchiveReader::open(writer.finalize()?)?;
    ///
    /// let dirs: Vec<_> = reader.list_directories_matching("*.lproj").into_iter().collect();
    /// assert_eq!(dirs, ["en.lproj", "fr.lproj"]);
    /// # Ok::<(), pkpass::Error>(())
    /// ```
    pub fn list_directories_matching(&self, pattern: &str) -> BTreeSet<String> {
        self.directory
            .keys()
            .filter_map(|path| path.split_once('/').map(|(dir, _)| dir))
            .filter(|dir| glob_match(pattern.as_bytes(), dir.as_bytes()))
            .map(str::to_string)
            .collect()
    }
}

impl std::fmt::Debug for ArchiveReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveReader")
            .field("entries", &self.directory.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn corrupt(e: ZipError) -> Error {
    Error::CorruptArchive(e.to_string())
}

/// Iterative wildcard matcher with single-star backtracking.
fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while t < text.len() {
        match pattern.get(p) {
            Some(b'*') => {
                star = Some((p, t));
                p += 1;
            }
            Some(&c) if c == b'?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match star {
                Some((sp, st)) => {
                    p = sp + 1;
                    t = st + 1;
                    star = Some((sp, st + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|&c| c == b'*')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{ArchiveWriter, CompressionLevel};

    fn sample(level: CompressionLevel) -> Vec<u8> {
        let mut writer = ArchiveWriter::with_compression(level);
        writer.add_entry("pass.json", b"{\"formatVersion\":1}").unwrap();
        writer.add_entry("icon.png", &[0x89, b'P', b'N', b'G']).unwrap();
        writer.add_entry("en.lproj/pass.strings", b"\"k\" = \"v\";").unwrap();
        writer.add_entry("fr.lproj/logo.png", b"logo").unwrap();
        writer.finalize().unwrap()
    }

    #[test]
    fn test_extract_round_trip() {
        for level in [CompressionLevel::NONE, CompressionLevel::DEFAULT, CompressionLevel::MAX] {
            let reader = ArchiveReader::open(sample(level)).unwrap();
            assert_eq!(reader.len(), 4);
            assert_eq!(reader.extract("icon.png").unwrap(), [0x89, b'P', b'N', b'G']);
            assert_eq!(reader.extract("fr.lproj/logo.png").unwrap(), b"logo");
        }
    }

    #[test]
    fn test_repeated_extraction() {
        let reader = ArchiveReader::open(sample(CompressionLevel::DEFAULT)).unwrap();
        for _ in 0..3 {
            assert_eq!(reader.extract("pass.json").unwrap(), b"{\"formatVersion\":1}");
            assert_eq!(reader.extract("icon.png").unwrap().len(), 4);
        }
    }

    #[test]
    fn test_missing_entry_is_not_found() {
        let reader = ArchiveReader::open(sample(CompressionLevel::DEFAULT)).unwrap();
        let err = reader.extract("strip.png").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(reader.extract_optional("strip.png").unwrap(), None);
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let err = ArchiveReader::open(b"definitely not a zip".to_vec()).unwrap_err();
        assert!(matches!(err, Error::CorruptArchive(_)));
    }

    // One stored entry whose central directory claims a zip64 size near
    // u64::MAX.
    fn forged_zip64_size(name: &str, data: &[u8], crc32: u32) -> Vec<u8> {
        let mut zip = Vec::new();
        zip.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
        for field in [20u16, 0, 0, 0, 0x21] {
            zip.extend_from_slice(&field.to_le_bytes());
        }
        zip.extend_from_slice(&crc32.to_le_bytes());
        zip.extend_from_slice(&(data.len() as u32).to_le_bytes());
        zip.extend_from_slice(&(data.len() as u32).to_le_bytes());
        zip.extend_from_slice(&(name.len() as u16).to_le_bytes());
        zip.extend_from_slice(&0u16.to_le_bytes());
        zip.extend_from_slice(name.as_bytes());
        zip.extend_from_slice(data);

        let cd_offset = zip.len() as u32;
        zip.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
        for field in [45u16, 45, 0, 0, 0, 0x21] {
            zip.extend_from_slice(&field.to_le_bytes());
        }
        zip.extend_from_slice(&crc32.to_le_bytes());
        zip.extend_from_slice(&(data.len() as u32).to_le_bytes());
        zip.extend_from_slice(&u32::MAX.to_le_bytes());
        for field in [name.len() as u16, 12, 0, 0, 0] {
            zip.extend_from_slice(&field.to_le_bytes());
        }
        zip.extend_from_slice(&0u32.to_le_bytes());
        zip.extend_from_slice(&0u32.to_le_bytes());
        zip.extend_from_slice(name.as_bytes());
        zip.extend_from_slice(&0x0001u16.to_le_bytes());
        zip.extend_from_slice(&8u16.to_le_bytes());
        zip.extend_from_slice(&(u64::MAX - 16).to_le_bytes());
        let cd_size = zip.len() as u32 - cd_offset;

        zip.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
        for field in [0u16, 0, 1, 1] {
            zip.extend_from_slice(&field.to_le_bytes());
        }
        zip.extend_from_slice(&cd_size.to_le_bytes());
        zip.extend_from_slice(&cd_offset.to_le_bytes());
        zip.extend_from_slice(&0u16.to_le_bytes());
        zip
    }

    #[test]
    fn test_forged_entry_size_does_not_panic() {
        let mut writer = ArchiveWriter::with_compression(CompressionLevel::NONE);
        writer.add_entry("a.png", b"png-bytes").unwrap();
        let honest = ArchiveReader::open(writer.finalize().unwrap()).unwrap();
        let crc32 = honest.entry("a.png").unwrap().crc32;

        let reader = match ArchiveReader::open(forged_zip64_size("a.png", b"png-bytes", crc32)) {
            Ok(reader) => reader,
            Err(Error::CorruptArchive(_)) => return,
            Err(other) => panic!("unexpected error: {other}"),
        };
        match reader.extract("a.png") {
            Ok(bytes) => assert_eq!(bytes, b"png-bytes"),
            Err(Error::CorruptArchive(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_directory_metadata() {
        let reader = ArchiveReader::open(sample(CompressionLevel::NONE)).unwrap();
        let entry = reader.entry("fr.lproj/logo.png").unwrap();
        assert_eq!(entry.size, 4);
        assert_eq!(entry.compressed_size, 4);
        assert_eq!(entry.compression, CompressionMethod::Stored);

        let first = reader.entry("pass.json").unwrap();
        assert_eq!(first.header_offset, 0);
    }

    #[test]
    fn test_list_directories_matching() {
        let reader = ArchiveReader::open(sample(CompressionLevel::DEFAULT)).unwrap();
        let dirs = reader.list_directories_matching("*.lproj");
        assert_eq!(dirs.into_iter().collect::<Vec<_>>(), ["en.lproj", "fr.lproj"]);
        assert!(reader.list_directories_matching("*.bundle").is_empty());
        assert_eq!(reader.list_directories_matching("e?.lproj").len(), 1);
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match(b"*.lproj", b"en.lproj"));
        assert!(glob_match(b"*", b""));
        assert!(glob_match(b"a*b*c", b"axxbyyc"));
        assert!(!glob_match(b"*.lproj", b"en.lproj.bak"));
        assert!(!glob_match(b"?", b""));
    }
}
