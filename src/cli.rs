use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{ConfigFile, ImportConfig};
use crate::model::Language;

#[derive(Parser, Debug)]
#[command(name = "geodata-import")]
#[command(version, about = "Import GeoLite2 location data into a localized SQLite hierarchy")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Where to read from and write to; unset values come from the config file
/// or the platform data directory
#[derive(Args, Debug, Clone, Default)]
pub struct Locations {
    /// JSON config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory containing GeoLite2-*-Locations-<lang>.csv[.bz2|.gz|.zip]
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// SQLite database path
    #[arg(long)]
    pub database: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import all levels (continents to cities) and prune empty regions
    Import {
        #[command(flatten)]
        locations: Locations,

        /// Languages to import (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        languages: Option<Vec<Language>>,

        /// Keep regions and provinces that have no cities
        #[arg(long)]
        no_prune: bool,

        /// Do not print progress
        #[arg(short, long)]
        quiet: bool,
    },

    /// Remove regions and provinces without cities from an existing database
    Prune {
        #[command(flatten)]
        locations: Locations,

        /// Do not print progress
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show entity and name counts of a database
    Stats {
        #[command(flatten)]
        locations: Locations,
    },

    /// List languages that have source files in the data directory
    Languages {
        #[command(flatten)]
        locations: Locations,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

impl Locations {
    /// Defaults, then config file, then command-line flags
    pub fn resolve(&self) -> Result<ImportConfig> {
        let mut config = ImportConfig::from_project_dirs()?;
        if let Some(path) = &self.config {
            let file = ConfigFile::load(path)
                .with_context(|| format!("Failed to load config {:?}", path))?;
            config.apply(file);
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(db) = &self.database {
            config.database = db.clone();
        }
        Ok(config)
    }
}
