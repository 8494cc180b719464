use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::model::Language;
use crate::parser::LevelRecord;

/// One entity merged across every language file of its level.
///
/// `record` is the first row seen for the key. Later rows only set names; a
/// later row in the same language replaces the earlier name.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate<R> {
    pub record: R,
    pub names: BTreeMap<Language, String>,
}

impl<R> Aggregate<R> {
    pub fn name(&self, language: &Language) -> Option<&str> {
        self.names
            .get(language)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }
}

/// Accumulates per-language records into aggregates keyed by natural key
#[derive(Debug)]
pub struct Merger<R: LevelRecord> {
    aggregates: BTreeMap<R::Key, Aggregate<R>>,
}

impl<R: LevelRecord> Default for Merger<R> {
    fn default() -> Self {
        Self {
            aggregates: BTreeMap::new(),
        }
    }
}

impl<R: LevelRecord> Merger<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one parsed row read from `language`'s file
    pub fn add(&mut self, language: &Language, record: R) {
        match self.aggregates.entry(record.key()) {
            Entry::Occupied(mut entry) => {
                entry
                    .get_mut()
                    .names
                    .insert(language.clone(), record.name().to_string());
            }
            Entry::Vacant(entry) => {
                let mut names = BTreeMap::new();
                names.insert(language.clone(), record.name().to_string());
                entry.insert(Aggregate { record, names });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.aggregates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aggregates.is_empty()
    }

    pub fn get(&self, key: &R::Key) -> Option<&Aggregate<R>> {
        self.aggregates.get(key)
    }

    /// Give every aggregate a name in every language, copying from the first
    /// language (in `languages` order) that has one. Returns how many names
    /// were filled.
    pub fn fill_missing(&mut self, languages: &[Language]) -> u64 {
        let mut filled = 0;
        for aggregate in self.aggregates.values_mut() {
            for language in languages {
                if aggregate.name(language).is_some() {
                    continue;
                }
                let fallback = languages
                    .iter()
                    .filter(|other| *other != language)
                    .find_map(|other| aggregate.name(other))
                    .map(str::to_string);
                if let Some(name) = fallback {
                    aggregate.names.insert(language.clone(), name);
                    filled += 1;
                }
            }
        }
        filled
    }

    /// Aggregates in natural-key order
    pub fn into_aggregates(self) -> Vec<Aggregate<R>> {
        self.aggregates.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RegionKey;
    use crate::parser::{ContinentRecord, RegionRecord};

    fn lang(code: &str) -> Language {
        code.parse().unwrap()
    }

    fn region(geo_id: i64, code: &str, name: &str) -> RegionRecord {
        RegionRecord {
            geo_id,
            country: "ES".into(),
            code: code.into(),
            name: name.into(),
        }
    }

    #[test]
    fn test_merge_languages_into_one_aggregate() {
        let (en, es) = (lang("en"), lang("es"));
        let mut merger = Merger::new();
        merger.add(
            &en,
            ContinentRecord {
                code: "EU".into(),
                name: "Europe".into(),
            },
        );
        merger.add(
            &es,
            ContinentRecord {
                code: "EU".into(),
                name: "Europa".into(),
            },
        );

        assert_eq!(merger.len(), 1);
        let eu = merger.get(&"EU".to_string()).unwrap();
        assert_eq!(eu.name(&en), Some("Europe"));
        assert_eq!(eu.name(&es), Some("Europa"));
    }

    #[test]
    fn test_first_record_last_name_wins() {
        let (en, es) = (lang("en"), lang("es"));
        let mut merger = Merger::new();
        merger.add(&en, region(100, "CT", "Catalonia"));
        merger.add(&en, region(200, "CT", "Catalunya"));
        merger.add(&es, region(300, "CT", "Cataluña"));

        let key = RegionKey {
            country: "ES".into(),
            region: "CT".into(),
        };
        let ct = merger.get(&key).unwrap();
        assert_eq!(ct.record.geo_id, 100);
        assert_eq!(ct.name(&en), Some("Catalunya"));
        assert_eq!(ct.name(&es), Some("Cataluña"));
    }

    #[test]
    fn test_fill_missing_copies_available_name() {
        let (en, es) = (lang("en"), lang("es"));
        let mut merger = Merger::new();
        merger.add(&en, region(1, "CT", "Catalonia"));
        merger.add(&es, region(2, "MD", "Madrid"));
        merger.add(&en, region(2, "MD", "Madrid Region"));

        let filled = merger.fill_missing(&[en.clone(), es.clone()]);
        assert_eq!(filled, 1);

        let aggregates = merger.into_aggregates();
        assert_eq!(aggregates[0].name(&es), Some("Catalonia"));
        assert_eq!(aggregates[1].name(&en), Some("Madrid Region"));
        assert_eq!(aggregates[1].name(&es), Some("Madrid"));
    }

    #[test]
    fn test_fill_missing_prefers_configured_order() {
        let (de, en, fr) = (lang("de"), lang("en"), lang("fr"));
        let mut merger = Merger::new();
        merger.add(&fr, region(1, "CT", "Catalogne"));
        merger.add(&en, region(1, "CT", "Catalonia"));

        merger.fill_missing(&[de.clone(), en.clone(), fr.clone()]);
        let ct = &merger.into_aggregates()[0];
        assert_eq!(ct.name(&de), Some("Catalonia"));
    }

    #[test]
    fn test_fill_missing_ignores_unconfigured_and_empty() {
        let (en, es, ru) = (lang("en"), lang("es"), lang("ru"));
        let mut merger = Merger::new();
        merger.add(&ru, region(1, "CT", "Каталония"));
        merger.add(&en, region(1, "CT", "Catalonia"));
        merger.add(&en, region(3, "AN", "Andalusia"));

        // Names only in a language outside the configured set are not copied
        let mut only_ru = Merger::new();
        only_ru.add(&ru, region(9, "XX", "Только"));
        assert_eq!(only_ru.fill_missing(&[en.clone(), es.clone()]), 0);
        assert_eq!(only_ru.into_aggregates()[0].name(&es), None);

        assert_eq!(merger.fill_missing(&[es.clone(), en.clone()]), 2);
    }
}
