use std::collections::HashMap;

use crate::error::{GeoError, Result};
use crate::model::{
    CityId, ContinentId, CountryId, EntityRef, Level, Lookup, ProvinceId, ProvinceKey, RegionId,
    RegionKey, TimeZoneId,
};
use crate::parser::{
    CityRecord, ContinentRecord, CountryRecord, LevelRecord, ProvinceRecord, RegionRecord,
};
use crate::store::{GeoStore, NewCity, NewCountry, NewProvince, NewRegion};

/// Whether an entity handle was found in storage or freshly created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linked<T> {
    Reused(T),
    Created(T),
}

impl<T: Copy> Linked<T> {
    pub fn id(&self) -> T {
        match self {
            Linked::Reused(id) | Linked::Created(id) => *id,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Linked::Created(_))
    }
}

/// Existing entities keep their stored fields; only their identity is used
fn get_or_create<T>(lookup: Lookup<T>, create: impl FnOnce() -> Result<T>) -> Result<Linked<T>> {
    match lookup {
        Lookup::Found(id) => Ok(Linked::Reused(id)),
        Lookup::NotFound => create().map(Linked::Created),
    }
}

/// Handles of already linked entities, by natural key.
///
/// Filled level by level; a level only reads the tables of levels above it.
#[derive(Debug, Default)]
pub struct Links {
    pub continents: HashMap<String, ContinentId>,
    pub countries: HashMap<String, CountryId>,
    pub regions: HashMap<RegionKey, RegionId>,
    pub provinces: HashMap<ProvinceKey, ProvinceId>,
    pub time_zones: HashMap<String, TimeZoneId>,
}

impl Links {
    fn continent(&self, child: &CountryRecord) -> Result<ContinentId> {
        self.continents
            .get(&child.continent)
            .copied()
            .ok_or_else(|| {
                unresolved(Level::Country, &child.code, Level::Continent, &child.continent)
            })
    }

    fn country(&self, level: Level, key: &dyn std::fmt::Display, code: &str) -> Result<CountryId> {
        self.countries
            .get(code)
            .copied()
            .ok_or_else(|| unresolved(level, key, Level::Country, &code))
    }

    fn region(
        &self,
        level: Level,
        key: &dyn std::fmt::Display,
        region: &RegionKey,
    ) -> Result<RegionId> {
        self.regions
            .get(region)
            .copied()
            .ok_or_else(|| unresolved(level, key, Level::Region, region))
    }

    fn province(&self, key: &dyn std::fmt::Display, province: &ProvinceKey) -> Result<ProvinceId> {
        self.provinces
            .get(province)
            .copied()
            .ok_or_else(|| unresolved(Level::City, key, Level::Province, province))
    }

    fn time_zone<S: GeoStore>(&mut self, store: &mut S, name: &str) -> Result<TimeZoneId> {
        if let Some(id) = self.time_zones.get(name) {
            return Ok(*id);
        }
        let lookup = store.find_time_zone(name)?;
        let id = get_or_create(lookup, || store.create_time_zone(name))?.id();
        self.time_zones.insert(name.to_string(), id);
        Ok(id)
    }
}

fn unresolved(
    level: Level,
    key: &dyn std::fmt::Display,
    parent_level: Level,
    parent_key: &dyn std::fmt::Display,
) -> GeoError {
    GeoError::UnresolvedParent {
        level,
        key: key.to_string(),
        parent_level,
        parent_key: parent_key.to_string(),
    }
}

/// Get-or-create reconciliation of one aggregate against storage
pub trait Link: LevelRecord {
    type Id: Copy;

    /// Fails with `GeoError::UnresolvedParent` when a parent was never linked
    fn link<S: GeoStore>(&self, store: &mut S, links: &mut Links) -> Result<Linked<Self::Id>>;

    /// Make the handle available to the next level
    fn register(links: &mut Links, key: Self::Key, id: Self::Id);

    fn entity(id: Self::Id) -> EntityRef;
}

impl Link for ContinentRecord {
    type Id = ContinentId;

    fn link<S: GeoStore>(&self, store: &mut S, _links: &mut Links) -> Result<Linked<ContinentId>> {
        let lookup = store.find_continent(&self.code)?;
        get_or_create(lookup, || store.create_continent(&self.code))
    }

    fn register(links: &mut Links, key: String, id: ContinentId) {
        links.continents.insert(key, id);
    }

    fn entity(id: ContinentId) -> EntityRef {
        id.entity()
    }
}

impl Link for CountryRecord {
    type Id = CountryId;

    fn link<S: GeoStore>(&self, store: &mut S, links: &mut Links) -> Result<Linked<CountryId>> {
        let lookup = store.find_country(&self.code)?;
        get_or_create(lookup, || {
            let continent = links.continent(self)?;
            store.create_country(&NewCountry {
                geo_id: self.geo_id,
                code: &self.code,
                continent,
            })
        })
    }

    fn register(links: &mut Links, key: String, id: CountryId) {
        links.countries.insert(key, id);
    }

    fn entity(id: CountryId) -> EntityRef {
        id.entity()
    }
}

impl Link for RegionRecord {
    type Id = RegionId;

    fn link<S: GeoStore>(&self, store: &mut S, links: &mut Links) -> Result<Linked<RegionId>> {
        let key = self.key();
        let country = links.country(Level::Region, &key, &self.country)?;
        let lookup = store.find_region(country, &self.code)?;
        get_or_create(lookup, || {
            store.create_region(&NewRegion {
                geo_id: self.geo_id,
                country,
                code: &self.code,
            })
        })
    }

    fn register(links: &mut Links, key: RegionKey, id: RegionId) {
        links.regions.insert(key, id);
    }

    fn entity(id: RegionId) -> EntityRef {
        id.entity()
    }
}

impl Link for ProvinceRecord {
    type Id = ProvinceId;

    fn link<S: GeoStore>(&self, store: &mut S, links: &mut Links) -> Result<Linked<ProvinceId>> {
        let key = self.key();
        let region = links.region(Level::Province, &key, &key.region_key())?;
        let lookup = store.find_province(region, &self.code)?;
        get_or_create(lookup, || {
            store.create_province(&NewProvince {
                geo_id: self.geo_id,
                region,
                code: &self.code,
            })
        })
    }

    fn register(links: &mut Links, key: ProvinceKey, id: ProvinceId) {
        links.provinces.insert(key, id);
    }

    fn entity(id: ProvinceId) -> EntityRef {
        id.entity()
    }
}

impl Link for CityRecord {
    type Id = CityId;

    fn link<S: GeoStore>(&self, store: &mut S, links: &mut Links) -> Result<Linked<CityId>> {
        if let Lookup::Found(id) = store.find_city(self.geo_id)? {
            return Ok(Linked::Reused(id));
        }

        let key = self.geo_id;
        let country = links.country(Level::City, &key, &self.country)?;
        let region = self
            .region_key()
            .map(|region| links.region(Level::City, &key, &region))
            .transpose()?;
        let province = self
            .province_key()
            .map(|province| links.province(&key, &province))
            .transpose()?;
        let time_zone = links.time_zone(store, &self.time_zone)?;

        store
            .create_city(&NewCity {
                geo_id: self.geo_id,
                country,
                region,
                province,
                time_zone,
            })
            .map(Linked::Created)
    }

    // Nothing links below cities
    fn register(_links: &mut Links, _key: i64, _id: CityId) {}

    fn entity(id: CityId) -> EntityRef {
        id.entity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    fn country(code: &str, continent: &str) -> CountryRecord {
        CountryRecord {
            geo_id: 2510769,
            continent: continent.into(),
            code: code.into(),
            name: "Spain".into(),
        }
    }

    fn city(region: Option<&str>, province: Option<&str>) -> CityRecord {
        CityRecord {
            geo_id: 3128760,
            country: "ES".into(),
            region: region.map(Into::into),
            province: province.map(Into::into),
            name: "Barcelona".into(),
            time_zone: "Europe/Madrid".into(),
        }
    }

    fn linked_spain(store: &mut SqliteStore) -> Links {
        let mut links = Links::default();
        let eu = ContinentRecord {
            code: "EU".into(),
            name: "Europe".into(),
        };
        let id = eu.link(store, &mut links).unwrap().id();
        ContinentRecord::register(&mut links, eu.key(), id);
        let es = country("ES", "EU");
        let id = es.link(store, &mut links).unwrap().id();
        CountryRecord::register(&mut links, es.key(), id);
        links
    }

    #[test]
    fn test_get_or_create_reuses_existing() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut links = Links::default();
        let eu = ContinentRecord {
            code: "EU".into(),
            name: "Europe".into(),
        };
        let first = eu.link(&mut store, &mut links).unwrap();
        let second = eu.link(&mut store, &mut links).unwrap();
        assert!(first.was_created());
        assert_eq!(second, Linked::Reused(first.id()));
    }

    #[test]
    fn test_unresolved_parent() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut links = Links::default();
        let err = country("ES", "EU").link(&mut store, &mut links).unwrap_err();
        match err {
            GeoError::UnresolvedParent {
                level,
                key,
                parent_level,
                parent_key,
            } => {
                assert_eq!(level, Level::Country);
                assert_eq!(key, "ES");
                assert_eq!(parent_level, Level::Continent);
                assert_eq!(parent_key, "EU");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_city_links_region_and_time_zone() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut links = linked_spain(&mut store);

        let ct = RegionRecord {
            geo_id: 3336901,
            country: "ES".into(),
            code: "CT".into(),
            name: "Catalonia".into(),
        };
        let id = ct.link(&mut store, &mut links).unwrap().id();
        RegionRecord::register(&mut links, ct.key(), id);

        let linked = city(Some("CT"), None).link(&mut store, &mut links).unwrap();
        assert_eq!(linked, Linked::Created(CityId(3128760)));
        assert_eq!(store.count_cities(id.entity()).unwrap(), 1);
        assert_eq!(store.count_time_zones().unwrap(), 1);
        assert!(links.time_zones.contains_key("Europe/Madrid"));
    }

    #[test]
    fn test_city_with_unlinked_province_is_rejected() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut links = linked_spain(&mut store);
        links.regions.insert(
            RegionKey {
                country: "ES".into(),
                region: "CT".into(),
            },
            RegionId(1),
        );

        let err = city(Some("CT"), Some("B"))
            .link(&mut store, &mut links)
            .unwrap_err();
        assert!(matches!(
            err,
            GeoError::UnresolvedParent {
                parent_level: Level::Province,
                ..
            }
        ));
        assert_eq!(store.count_entities(Level::City).unwrap(), 0);
    }
}
