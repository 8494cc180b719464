use tracing::debug;

use crate::error::Result;
use crate::model::{EntityRef, Language, Lookup};
use crate::schema::NAME_MAX_LEN;
use crate::store::GeoStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameOutcome {
    Created,
    Updated,
    Unchanged,
    /// No language had a name for the entity
    Missing,
}

/// Upsert the localized name of `entity` in `language`
pub fn persist_name<S: GeoStore>(
    store: &mut S,
    entity: EntityRef,
    language: &Language,
    name: Option<&str>,
) -> Result<NameOutcome> {
    let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
        debug!(level = %entity.level, id = entity.id, %language, "no name in any language");
        return Ok(NameOutcome::Missing);
    };
    let name = bounded(name);

    match store.find_name(entity, language)? {
        Lookup::Found(mut existing) => {
            if existing.name == name {
                Ok(NameOutcome::Unchanged)
            } else {
                existing.name = name.to_string();
                store.save_name(&existing)?;
                Ok(NameOutcome::Updated)
            }
        }
        Lookup::NotFound => {
            store.create_name(entity, language, name)?;
            Ok(NameOutcome::Created)
        }
    }
}

/// Cut a name down to `NAME_MAX_LEN` characters
fn bounded(name: &str) -> &str {
    match name.char_indices().nth(NAME_MAX_LEN) {
        Some((idx, _)) => {
            debug!(full_name = name, "name truncated to {} characters", NAME_MAX_LEN);
            name[..idx].trim_end()
        }
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContinentId;
    use crate::store::SqliteStore;

    fn setup() -> (SqliteStore, EntityRef) {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let id: ContinentId = store.create_continent("EU").unwrap();
        (store, id.entity())
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let (mut store, eu) = setup();
        let en: Language = "en".parse().unwrap();

        assert_eq!(
            persist_name(&mut store, eu, &en, Some("Europe")).unwrap(),
            NameOutcome::Created
        );
        assert_eq!(
            persist_name(&mut store, eu, &en, Some("Europe")).unwrap(),
            NameOutcome::Unchanged
        );
        assert_eq!(
            persist_name(&mut store, eu, &en, Some("Old World")).unwrap(),
            NameOutcome::Updated
        );
        assert_eq!(store.count_names(eu.level).unwrap(), 1);
    }

    #[test]
    fn test_missing_name_writes_nothing() {
        let (mut store, eu) = setup();
        let en: Language = "en".parse().unwrap();
        assert_eq!(
            persist_name(&mut store, eu, &en, None).unwrap(),
            NameOutcome::Missing
        );
        assert_eq!(
            persist_name(&mut store, eu, &en, Some("  ")).unwrap(),
            NameOutcome::Missing
        );
        assert_eq!(store.count_names(eu.level).unwrap(), 0);
    }

    #[test]
    fn test_bounded() {
        let long = "ä".repeat(150);
        assert_eq!(bounded(&long).chars().count(), NAME_MAX_LEN);
        assert_eq!(bounded("Barcelona"), "Barcelona");
    }
}
