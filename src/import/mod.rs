//! Level-by-level import of the geodata hierarchy.
//!
//! Each level runs the same pipeline: parse every language file, merge the
//! rows into aggregates, fill missing translations, link the aggregates to
//! storage and finally write their names. Levels run parent-first so every
//! child finds its parent in `Links`.

pub mod link;
pub mod merge;
pub mod names;
pub mod prune;

pub use link::{Link, Linked, Links};
pub use merge::{Aggregate, Merger};
pub use names::{persist_name, NameOutcome};
pub use prune::{prune_empty, PruneSummary};

use anyhow::{Context, Result};
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::ImportConfig;
use crate::error::GeoError;
use crate::model::{EntityRef, Language, Level};
use crate::parser::{
    parse_file, CityRecord, ContinentRecord, CountryRecord, ProvinceRecord, RegionRecord,
};
use crate::source::SourceDir;
use crate::store::GeoStore;
use crate::ui::{Phase, Progress, Ui};

/// Counters for one hierarchy level
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelSummary {
    pub rows_dropped: u64,
    pub aggregates: u64,
    pub created: u64,
    pub reused: u64,
    /// Aggregates skipped because a parent was never linked
    pub unresolved: u64,
    /// Names copied from another language
    pub names_filled: u64,
    pub names_created: u64,
    pub names_updated: u64,
    pub names_unchanged: u64,
    pub names_missing: u64,
}

impl LevelSummary {
    fn count_name(&mut self, outcome: NameOutcome) {
        match outcome {
            NameOutcome::Created => self.names_created += 1,
            NameOutcome::Updated => self.names_updated += 1,
            NameOutcome::Unchanged => self.names_unchanged += 1,
            NameOutcome::Missing => self.names_missing += 1,
        }
    }
}

/// Outcome of a complete import run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub languages: Vec<Language>,
    pub levels: Vec<(Level, LevelSummary)>,
    pub pruned: Option<PruneSummary>,
}

impl ImportSummary {
    pub fn level(&self, level: Level) -> Option<&LevelSummary> {
        self.levels
            .iter()
            .find(|(l, _)| *l == level)
            .map(|(_, summary)| summary)
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let languages: Vec<&str> = self.languages.iter().map(Language::as_str).collect();
        writeln!(f, "Languages: {}", languages.join(", "))?;
        writeln!(
            f,
            "{:<10} {:>9} {:>9} {:>9} {:>10} {:>9} {:>9} {:>9}",
            "level", "entities", "created", "reused", "unresolved", "filled", "names+", "names~"
        )?;
        for (level, s) in &self.levels {
            writeln!(
                f,
                "{:<10} {:>9} {:>9} {:>9} {:>10} {:>9} {:>9} {:>9}",
                level.plural(),
                s.aggregates,
                s.created,
                s.reused,
                s.unresolved,
                s.names_filled,
                s.names_created,
                s.names_updated
            )?;
        }
        if let Some(pruned) = &self.pruned {
            write!(
                f,
                "Pruned {} regions and {} provinces without cities",
                pruned.regions, pruned.provinces
            )?;
        }
        Ok(())
    }
}

pub struct Importer<'a, S: GeoStore, U: Ui> {
    store: &'a mut S,
    ui: &'a mut U,
    source: SourceDir,
    languages: Vec<Language>,
    interval: Duration,
    prune: bool,
    links: Links,
}

impl<'a, S: GeoStore, U: Ui> Importer<'a, S, U> {
    /// Resolve the languages to import against the files in the data directory
    pub fn new(store: &'a mut S, ui: &'a mut U, config: &ImportConfig) -> Result<Self> {
        let source = SourceDir::new(&config.data_dir);
        let available = source
            .available_languages()
            .context("scanning source directory")?;
        let languages = config.effective_languages(&available)?;

        Ok(Self {
            store,
            ui,
            source,
            languages,
            interval: config.progress_interval,
            prune: config.prune,
            links: Links::default(),
        })
    }

    /// Import every level parent-first, then prune empty regions/provinces
    pub fn run(mut self) -> Result<ImportSummary> {
        info!(languages = ?self.languages, data_dir = ?self.source.root(), "starting import");

        let mut summary = ImportSummary {
            languages: self.languages.clone(),
            ..Default::default()
        };
        summary
            .levels
            .push((Level::Continent, self.import_level::<ContinentRecord>()?));
        summary
            .levels
            .push((Level::Country, self.import_level::<CountryRecord>()?));
        summary
            .levels
            .push((Level::Region, self.import_level::<RegionRecord>()?));
        summary
            .levels
            .push((Level::Province, self.import_level::<ProvinceRecord>()?));
        summary
            .levels
            .push((Level::City, self.import_level::<CityRecord>()?));

        if self.prune {
            let pruned = prune_empty(self.store, self.ui, self.interval)
                .context("removing regions and provinces without cities")?;
            info!(regions = pruned.regions, provinces = pruned.provinces, "pruned");
            summary.pruned = Some(pruned);
        }

        self.ui.set_phase(Phase::Complete);
        Ok(summary)
    }

    fn import_level<R: Link>(&mut self) -> Result<LevelSummary> {
        let level = R::LEVEL;
        let phase = level.plural().to_lowercase();
        self.ui.set_phase(Phase::Importing(level));
        let mut summary = LevelSummary::default();

        // Merge every language before anything is written
        let mut merger = Merger::<R>::new();
        for language in &self.languages {
            let file = self.source.require(R::SOURCE, language)?;
            let (records, dropped) = parse_file::<R>(&file)
                .with_context(|| format!("importing {}: reading {:?}", phase, file.path))?;
            summary.rows_dropped += dropped;

            let mut progress = Progress::start(
                self.ui,
                format!("    > Prepare data {}", language),
                records.len() as u64,
                self.interval,
            );
            for record in records {
                merger.add(language, record);
                progress.tick(self.ui);
            }
            progress.finish(self.ui);
        }

        summary.names_filled = merger.fill_missing(&self.languages);
        self.ui.log(format!(
            "    > Populate missing: {} names copied from another language",
            summary.names_filled
        ));

        let aggregates = merger.into_aggregates();
        summary.aggregates = aggregates.len() as u64;

        self.store
            .begin()
            .with_context(|| format!("importing {}: starting transaction", phase))?;

        let linked = self
            .link_all::<R>(aggregates, &mut summary)
            .with_context(|| format!("importing {}: linking", phase))?;

        for language in &self.languages {
            let mut progress = Progress::start(
                self.ui,
                format!("    > Fill {}", language),
                linked.len() as u64,
                self.interval,
            );
            for (aggregate, entity) in &linked {
                let outcome = persist_name(self.store, *entity, language, aggregate.name(language))
                    .with_context(|| format!("importing {}: writing {} names", phase, language))?;
                summary.count_name(outcome);
                progress.tick(self.ui);
            }
            progress.finish(self.ui);
        }

        self.store
            .commit()
            .with_context(|| format!("importing {}: committing", phase))?;

        info!(
            %level,
            aggregates = summary.aggregates,
            created = summary.created,
            reused = summary.reused,
            unresolved = summary.unresolved,
            "level imported"
        );
        Ok(summary)
    }

    /// Get-or-create every aggregate; rows with an unknown parent are skipped
    fn link_all<R: Link>(
        &mut self,
        aggregates: Vec<Aggregate<R>>,
        summary: &mut LevelSummary,
    ) -> crate::error::Result<Vec<(Aggregate<R>, EntityRef)>> {
        let mut linked = Vec::with_capacity(aggregates.len());
        let mut progress = Progress::start(
            self.ui,
            "    > Link",
            aggregates.len() as u64,
            self.interval,
        );

        for aggregate in aggregates {
            match aggregate.record.link(self.store, &mut self.links) {
                Ok(handle) => {
                    if handle.was_created() {
                        summary.created += 1;
                    } else {
                        summary.reused += 1;
                    }
                    let id = handle.id();
                    R::register(&mut self.links, aggregate.record.key(), id);
                    linked.push((aggregate, R::entity(id)));
                }
                Err(err @ GeoError::UnresolvedParent { .. }) => {
                    warn!("skipping row: {}", err);
                    summary.unresolved += 1;
                }
                Err(err) => return Err(err),
            }
            progress.tick(self.ui);
        }
        progress.finish(self.ui);

        Ok(linked)
    }
}
