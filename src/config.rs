use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::error::{GeoError, Result};
use crate::model::Language;
use crate::ui::DEFAULT_INTERVAL;

/// Languages imported when nothing else is configured
pub const DEFAULT_LANGUAGES: &[&str] = &["en", "es"];

const DATABASE_FILE: &str = "geodata.sqlite";

/// Optional JSON config file; every field may be omitted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub data_dir: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub languages: Option<Vec<Language>>,
    pub progress_interval_secs: Option<u64>,
    pub prune: Option<bool>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| GeoError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Fully resolved settings for one import run
#[derive(Debug, Clone, PartialEq)]
pub struct ImportConfig {
    /// Directory holding the GeoLite2 location files
    pub data_dir: PathBuf,
    pub database: PathBuf,
    /// Configured languages, in preference order
    pub languages: Vec<Language>,
    pub progress_interval: Duration,
    /// Remove regions and provinces without cities after the import
    pub prune: bool,
}

impl ImportConfig {
    pub fn new(data_dir: impl Into<PathBuf>, database: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            database: database.into(),
            languages: DEFAULT_LANGUAGES
                .iter()
                .filter_map(|code| code.parse().ok())
                .collect(),
            progress_interval: DEFAULT_INTERVAL,
            prune: true,
        }
    }

    /// Defaults rooted in the platform data directory
    pub fn from_project_dirs() -> Result<Self> {
        let dirs = ProjectDirs::from("", "", "geodata-import").ok_or_else(|| {
            GeoError::Config("could not determine the platform data directory".into())
        })?;
        let root = dirs.data_dir();
        Ok(Self::new(root.join("data"), root.join(DATABASE_FILE)))
    }

    pub fn with_languages(mut self, languages: Vec<Language>) -> Self {
        self.languages = dedup(languages);
        self
    }

    /// Overlay values present in a config file
    pub fn apply(&mut self, file: ConfigFile) {
        if let Some(dir) = file.data_dir {
            self.data_dir = dir;
        }
        if let Some(db) = file.database {
            self.database = db;
        }
        if let Some(languages) = file.languages {
            self.languages = dedup(languages);
        }
        if let Some(secs) = file.progress_interval_secs {
            self.progress_interval = Duration::from_secs(secs);
        }
        if let Some(prune) = file.prune {
            self.prune = prune;
        }
    }

    /// Configured languages that also have source files, in configured order
    pub fn effective_languages(&self, available: &[Language]) -> Result<Vec<Language>> {
        let mut effective = Vec::new();
        for language in &self.languages {
            if available.contains(language) {
                effective.push(language.clone());
            } else {
                warn!(
                    %language,
                    data_dir = ?self.data_dir,
                    "no source files for configured language"
                );
            }
        }

        if effective.is_empty() {
            return Err(GeoError::Config(format!(
                "none of the configured languages {:?} have source files in {:?}",
                self.languages.iter().map(Language::as_str).collect::<Vec<_>>(),
                self.data_dir
            )));
        }
        Ok(effective)
    }
}

fn dedup(languages: Vec<Language>) -> Vec<Language> {
    let mut seen = Vec::with_capacity(languages.len());
    for language in languages {
        if !seen.contains(&language) {
            seen.push(language);
        }
    }
    seen
}
