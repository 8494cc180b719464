use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{GeoError, Result};
use crate::model::Language;

/// Which GeoLite2 extract a file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Continent and country rows
    Countries,
    /// Region, province and city rows
    Cities,
}

impl SourceKind {
    fn prefix(self) -> &'static str {
        match self {
            SourceKind::Countries => "GeoLite2-Country-Locations-",
            SourceKind::Cities => "GeoLite2-City-Locations-",
        }
    }

    /// Uncompressed file name for a language, e.g. `GeoLite2-City-Locations-en.csv`
    pub fn file_name(self, language: &Language) -> String {
        format!("{}{}.csv", self.prefix(), language)
    }
}

/// Compression of a source file, detected from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Bzip2,
    Gzip,
    Zip,
    None,
}

impl Compression {
    /// Lookup order when several variants of a file are present
    pub const PREFERRED: [Compression; 4] = [
        Compression::Bzip2,
        Compression::Gzip,
        Compression::Zip,
        Compression::None,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            Compression::Bzip2 => ".bz2",
            Compression::Gzip => ".gz",
            Compression::Zip => ".zip",
            Compression::None => "",
        }
    }

    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("bz2") => Compression::Bzip2,
            Some("gz") => Compression::Gzip,
            Some("zip") => Compression::Zip,
            _ => Compression::None,
        }
    }
}

/// A located source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub compression: Compression,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let compression = Compression::from_path(&path);
        Self { path, compression }
    }
}

/// Finds the per-language source files under a data directory
#[derive(Debug, Clone)]
pub struct SourceDir {
    root: PathBuf,
}

impl SourceDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find the file for a language, trying each supported compression
    pub fn locate(&self, kind: SourceKind, language: &Language) -> Option<SourceFile> {
        let base = kind.file_name(language);
        Compression::PREFERRED.iter().find_map(|compression| {
            let path = self.root.join(format!("{}{}", base, compression.suffix()));
            path.is_file().then(|| SourceFile {
                path,
                compression: *compression,
            })
        })
    }

    /// Like `locate`, but a missing file is an error
    pub fn require(&self, kind: SourceKind, language: &Language) -> Result<SourceFile> {
        self.locate(kind, language).ok_or_else(|| {
            GeoError::Config(format!(
                "missing source file {} (any of .bz2/.gz/.zip/plain) in {:?}",
                kind.file_name(language),
                self.root
            ))
        })
    }

    /// Languages that have both a countries and a cities file
    pub fn available_languages(&self) -> Result<Vec<Language>> {
        let entries = fs::read_dir(&self.root).map_err(|source| GeoError::Io {
            path: self.root.clone(),
            source,
        })?;

        let mut found = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|source| GeoError::Io {
                path: self.root.clone(),
                source,
            })?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let Some(rest) = name.strip_prefix(SourceKind::Countries.prefix()) else {
                continue;
            };
            let Some((code, _)) = rest.split_once(".csv") else {
                continue;
            };
            if let Ok(language) = code.parse::<Language>() {
                found.insert(language);
            }
        }

        Ok(found
            .into_iter()
            .filter(|lang| self.locate(SourceKind::Cities, lang).is_some())
            .collect())
    }
}
