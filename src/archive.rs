//! Archive walker: routes the text entries of one extension package to the
//! detector or the permission extractor.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::detector::Detector;
use crate::error::{Result, ScanError};
use crate::manifest;
use crate::table::FrequencyTable;

/// Default upper bound on a single entry's declared uncompressed size.
pub const DEFAULT_MAX_ENTRY_SIZE: u64 = 16 * 1024 * 1024;

const MANIFEST_NAME: &str = "manifest.json";
const MACOS_METADATA_DIR: &str = "__MACOSX/";
const RESOURCE_FORK_PREFIX: &str = "._";

/// How an archive entry is handled, decided from its name alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// macOS metadata (`__MACOSX/` tree or `._` resource forks).
    Metadata,
    /// `manifest.json`, routed to permission extraction.
    Manifest,
    /// `.js` or `.json`, routed to the detector.
    Script,
    Ignored,
}

impl EntryKind {
    pub fn classify(name: &str) -> Self {
        let base = name.rsplit('/').next().unwrap_or(name);
        if name.starts_with(MACOS_METADATA_DIR)
            || name.starts_with(RESOURCE_FORK_PREFIX)
            || base.starts_with(RESOURCE_FORK_PREFIX)
        {
            return Self::Metadata;
        }
        if base == MANIFEST_NAME {
            return Self::Manifest;
        }
        if name.ends_with(".js") || name.ends_with(".json") {
            return Self::Script;
        }
        Self::Ignored
    }
}

/// What one archive walk produced besides table increments.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArchiveSummary {
    pub path: PathBuf,
    /// Hex SHA-256 of the archive file.
    pub sha256: String,
    /// Entries passed to the detector or the permission extractor.
    pub files_analyzed: Vec<String>,
    /// Entries that were unreadable or exceeded the size limit.
    pub entries_skipped: usize,
    /// Raw permission blocks, one per manifest that had one.
    pub permissions: Vec<String>,
    pub sensitive_permissions: Vec<String>,
    pub hits: u64,
}

pub struct ArchiveWalker<'a> {
    detector: Detector<'a>,
    max_entry_size: u64,
}

impl<'a> ArchiveWalker<'a> {
    pub fn new(detector: Detector<'a>) -> Self {
        Self {
            detector,
            max_entry_size: DEFAULT_MAX_ENTRY_SIZE,
        }
    }

    pub fn with_max_entry_size(mut self, max_entry_size: u64) -> Self {
        self.max_entry_size = max_entry_size;
        self
    }

    /// Walk every entry of the archive at `path`, counting hits into `table`.
    ///
    /// Fails only when the archive itself cannot be opened; unreadable
    /// entries are skipped.
    pub fn walk(&self, path: &Path, table: &mut FrequencyTable) -> Result<ArchiveSummary> {
        let open_err = |message: String| ScanError::ArchiveOpen {
            path: path.display().to_string(),
            message,
        };

        let mut file = File::open(path).map_err(|e| open_err(e.to_string()))?;
        let mut hasher = Sha256::new();
        io::copy(&mut file, &mut hasher).map_err(|e| open_err(e.to_string()))?;
        let sha256 = hex::encode(hasher.finalize());
        file.seek(SeekFrom::Start(0)).map_err(|e| open_err(e.to_string()))?;
        let mut archive = zip::ZipArchive::new(file).map_err(|e| open_err(e.to_string()))?;

        tracing::debug!(path = %path.display(), entries = archive.len(), "opened archive");

        let mut summary = ArchiveSummary {
            path: path.to_path_buf(),
            sha256,
            ..Default::default()
        };

        for i in 0..archive.len() {
            let (name, text) = match self.read_entry(&mut archive, i) {
                Ok(Some(entry)) => entry,
                Ok(None) => continue,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping entry");
                    summary.entries_skipped += 1;
                    continue;
                }
            };

            match EntryKind::classify(&name) {
                EntryKind::Manifest => {
                    if let Some(block) = manifest::extract_permissions(&text) {
                        for flagged in manifest::flag_sensitive(block) {
                            if !summary.sensitive_permissions.contains(&flagged) {
                                summary.sensitive_permissions.push(flagged);
                            }
                        }
                        summary.permissions.push(block.to_string());
                    }
                }
                _ => summary.hits += self.detector.detect(&text, table),
            }
            tracing::debug!(entry = %name, "analyzed file");
            summary.files_analyzed.push(name);
        }

        Ok(summary)
    }

    /// Read entry `index` as text. `Ok(None)` means the entry is not one we scan.
    fn read_entry<R: Read + Seek>(
        &self,
        archive: &mut zip::ZipArchive<R>,
        index: usize,
    ) -> Result<Option<(String, String)>> {
        let entry_err = |entry: String, message: String| ScanError::EntryRead { entry, message };

        let entry = archive
            .by_index(index)
            .map_err(|e| entry_err(format!("#{index}"), e.to_string()))?;
        let name = entry.name().to_string();

        if entry.is_dir() {
            return Ok(None);
        }
        if matches!(
            EntryKind::classify(&name),
            EntryKind::Metadata | EntryKind::Ignored
        ) {
            return Ok(None);
        }

        let declared = entry.size();
        if declared > self.max_entry_size {
            tracing::warn!(
                entry = %name,
                size = declared,
                limit = self.max_entry_size,
                "entry exceeds size limit"
            );
            return Err(entry_err(
                name,
                format!("declared size {declared} exceeds limit {}", self.max_entry_size),
            ));
        }

        let mut buf = Vec::with_capacity(declared as usize);
        entry
            .take(declared)
            .read_to_end(&mut buf)
            .map_err(|e| entry_err(name.clone(), e.to_string()))?;

        let text = String::from_utf8_lossy(&buf).into_owned();
        Ok(Some((name, text)))
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::write_zip;
    use super::*;
    use crate::catalogue::{Catalogue, CatalogueSet};

    #[test]
    fn classifies_entry_names() {
        assert_eq!(EntryKind::classify("manifest.json"), EntryKind::Manifest);
        assert_eq!(EntryKind::classify("ext/manifest.json"), EntryKind::Manifest);
        assert_eq!(EntryKind::classify("background.js"), EntryKind::Script);
        assert_eq!(EntryKind::classify("_locales/en/messages.json"), EntryKind::Script);
        assert_eq!(EntryKind::classify("__MACOSX/background.js"), EntryKind::Metadata);
        assert_eq!(EntryKind::classify("._background.js"), EntryKind::Metadata);
        assert_eq!(EntryKind::classify("js/._popup.js"), EntryKind::Metadata);
        assert_eq!(EntryKind::classify("icon.png"), EntryKind::Ignored);
        assert_eq!(EntryKind::classify("popup.js.map"), EntryKind::Ignored);
        assert_eq!(EntryKind::classify("popup.html"), EntryKind::Ignored);
    }

    #[test]
    fn walks_scripts_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ext.zip");
        write_zip(
            &path,
            &[
                ("manifest.json", r#"{"permissions": ["storage"]}"#),
                ("background.js", "fetch('/x'); fetch('/y');"),
                ("icon.png", "fetch fetch fetch"),
            ],
        );

        let catalogue = Catalogue::builtin(CatalogueSet::Full);
        let walker = ArchiveWalker::new(Detector::new(&catalogue));
        let mut table = FrequencyTable::new();
        let summary = walker.walk(&path, &mut table).unwrap();

        assert_eq!(table.count("fetch"), 2);
        assert_eq!(summary.permissions, vec![r#"["storage"]"#.to_string()]);
        assert_eq!(summary.files_analyzed, vec!["manifest.json", "background.js"]);
        assert_eq!(summary.hits, 2);
        assert_eq!(summary.sha256.len(), 64);
    }

    #[test]
    fn sha256_covers_whole_archive_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ext.zip");
        write_zip(&path, &[("a.js", "fetch(a);"), ("b.js", "setTimeout(f);")]);

        let catalogue = Catalogue::builtin(CatalogueSet::Full);
        let mut table = FrequencyTable::new();
        let summary = ArchiveWalker::new(Detector::new(&catalogue))
            .walk(&path, &mut table)
            .unwrap();

        let expected = hex::encode(Sha256::digest(std::fs::read(&path).unwrap()));
        assert_eq!(summary.sha256, expected);
        // Hashing must leave the file readable from the start.
        assert_eq!(table.count("fetch"), 1);
        assert_eq!(table.count("setTimeout"), 1);
    }

    #[test]
    fn walks_multiple_manifests() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ext.zip");
        write_zip(
            &path,
            &[
                ("manifest.json", r#"{"permissions": ["cookies", "storage"]}"#),
                ("sub/", ""),
                ("sub/manifest.json", r#"{"permissions": ["history", "cookies"]}"#),
                ("sub/no_perms/manifest.json", r#"{"name": "x"}"#),
            ],
        );

        let catalogue = Catalogue::builtin(CatalogueSet::Full);
        let mut table = FrequencyTable::new();
        let summary = ArchiveWalker::new(Detector::new(&catalogue))
            .walk(&path, &mut table)
            .unwrap();

        assert_eq!(
            summary.permissions,
            vec![
                r#"["cookies", "storage"]"#.to_string(),
                r#"["history", "cookies"]"#.to_string(),
            ]
        );
        assert_eq!(summary.sensitive_permissions, vec!["cookies", "history"]);
        assert_eq!(summary.files_analyzed.len(), 3);
        assert!(table.is_empty());
    }

    #[test]
    fn manifest_text_is_not_counted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ext.zip");
        write_zip(
            &path,
            &[(
                "manifest.json",
                r#"{"description": "uses fetch", "permissions": ["cookies"]}"#,
            )],
        );

        let catalogue = Catalogue::builtin(CatalogueSet::Full);
        let mut table = FrequencyTable::new();
        let summary = ArchiveWalker::new(Detector::new(&catalogue))
            .walk(&path, &mut table)
            .unwrap();
        assert!(table.is_empty());
        assert_eq!(summary.sensitive_permissions, vec!["cookies"]);
    }

    #[test]
    fn skips_macos_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ext.zip");
        write_zip(
            &path,
            &[
                ("__MACOSX/", ""),
                ("__MACOSX/background.js", "fetch(a); fetch(b);"),
                ("._content.js", "fetch(c);"),
                ("content.js", "setTimeout(f, 10);"),
            ],
        );

        let catalogue = Catalogue::builtin(CatalogueSet::Full);
        let mut table = FrequencyTable::new();
        let summary = ArchiveWalker::new(Detector::new(&catalogue))
            .walk(&path, &mut table)
            .unwrap();
        assert_eq!(table.count("fetch"), 0);
        assert_eq!(table.count("setTimeout"), 1);
        assert_eq!(summary.files_analyzed, vec!["content.js"]);
    }

    #[test]
    fn oversized_entry_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ext.zip");
        write_zip(
            &path,
            &[
                ("big.js", "fetch(a); fetch(b); fetch(c); fetch(d);"),
                ("small.js", "fetch(e);"),
            ],
        );

        let catalogue = Catalogue::builtin(CatalogueSet::Full);
        let mut table = FrequencyTable::new();
        let summary = ArchiveWalker::new(Detector::new(&catalogue))
            .with_max_entry_size(16)
            .walk(&path, &mut table)
            .unwrap();
        assert_eq!(table.count("fetch"), 1);
        assert_eq!(summary.entries_skipped, 1);
    }

    #[test]
    fn missing_archive_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let catalogue = Catalogue::builtin(CatalogueSet::Full);
        let mut table = FrequencyTable::new();
        let err = ArchiveWalker::new(Detector::new(&catalogue))
            .walk(&dir.path().join("absent.zip"), &mut table)
            .unwrap_err();
        assert!(matches!(err, ScanError::ArchiveOpen { .. }));
    }

    #[test]
    fn corrupt_archive_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.zip");
        std::fs::write(&path, b"this is not a zip file").unwrap();

        let catalogue = Catalogue::builtin(CatalogueSet::Full);
        let mut table = FrequencyTable::new();
        let err = ArchiveWalker::new(Detector::new(&catalogue))
            .walk(&path, &mut table)
            .unwrap_err();
        assert!(matches!(err, ScanError::ArchiveOpen { .. }));
        assert!(table.is_empty());
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ext.zip");
        {
            use std::io::Write;
            let file = std::fs::File::create(&path).unwrap();
            let mut zip = zip::ZipWriter::new(file);
            zip.start_file("lib.js", zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"\xff\xfe fetch(x) \xff").unwrap();
            zip.finish().unwrap();
        }

        let catalogue = Catalogue::builtin(CatalogueSet::Full);
        let mut table = FrequencyTable::new();
        ArchiveWalker::new(Detector::new(&catalogue))
            .walk(&path, &mut table)
            .unwrap();
        assert_eq!(table.count("fetch"), 1);
    }
}
