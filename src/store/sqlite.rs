use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::{debug, warn};

use super::schema_gen::{generate_create_table, generate_indexes};
use super::{GeoStore, NewCity, NewCountry, NewProvince, NewRegion};
use crate::error::{GeoError, Result};
use crate::model::{
    CityId, ContinentId, CountryId, EntityRef, Language, Level, LocalizedName, Lookup,
    ProvinceId, RegionId, TimeZoneId,
};
use crate::schema::{TableSchema, ALL_TABLES};

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a database and make sure the schema exists.
    ///
    /// Existing data is kept: imports reconcile against it.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| GeoError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;",
        )?;

        let store = Self { conn };
        store.create_tables(ALL_TABLES)?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let store = Self { conn };
        store.create_tables(ALL_TABLES)?;
        Ok(store)
    }

    /// Create all tables for the given schemas
    pub fn create_tables(&self, schemas: &[&TableSchema]) -> Result<()> {
        for schema in schemas {
            self.conn.execute(&generate_create_table(schema), [])?;
            for index_sql in generate_indexes(schema) {
                self.conn.execute(&index_sql, [])?;
            }
        }
        debug!(tables = schemas.len(), "schema ready");
        Ok(())
    }

    pub fn count_time_zones(&self) -> Result<u64> {
        self.count_rows("time_zones")
    }

    /// Run `PRAGMA optimize` after a large import
    pub fn finalize(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA optimize;")?;
        Ok(())
    }

    fn count_rows(&self, table: &str) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Regions and provinces borrow the geo id of their first city row. After a
    /// dataset refresh moves that city, the id can belong to another
    /// subdivision already; `None` lets SQLite assign a fresh one.
    fn free_geo_id(&self, level: Level, geo_id: i64, code: &str) -> Result<Option<i64>> {
        let sql = format!("SELECT id FROM {} WHERE id = ?1", level.table());
        if self.find_id(&sql, [geo_id])?.is_none() {
            return Ok(Some(geo_id));
        }
        warn!(%level, geo_id, code, "geo id already in use, assigning a new id");
        Ok(None)
    }

    fn find_id(&self, sql: &str, params: impl rusqlite::Params) -> Result<Option<i64>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let id = stmt.query_row(params, |row| row.get(0)).optional()?;
        Ok(id)
    }
}

impl GeoStore for SqliteStore {
    fn begin(&mut self) -> Result<()> {
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn find_continent(&self, code: &str) -> Result<Lookup<ContinentId>> {
        let id = self.find_id("SELECT id FROM continents WHERE code = ?1", [code])?;
        Ok(id.map(ContinentId).into())
    }

    fn create_continent(&mut self, code: &str) -> Result<ContinentId> {
        self.conn
            .prepare_cached("INSERT INTO continents (code) VALUES (?1)")?
            .execute([code])?;
        Ok(ContinentId(self.conn.last_insert_rowid()))
    }

    fn find_country(&self, code: &str) -> Result<Lookup<CountryId>> {
        let id = self.find_id("SELECT id FROM countries WHERE code = ?1", [code])?;
        Ok(id.map(CountryId).into())
    }

    fn create_country(&mut self, new: &NewCountry<'_>) -> Result<CountryId> {
        self.conn
            .prepare_cached("INSERT INTO countries (id, code, continent_id) VALUES (?1, ?2, ?3)")?
            .execute(params![new.geo_id, new.code, new.continent.0])?;
        Ok(CountryId(new.geo_id))
    }

    fn find_region(&self, country: CountryId, code: &str) -> Result<Lookup<RegionId>> {
        let id = self.find_id(
            "SELECT id FROM regions WHERE country_id = ?1 AND code = ?2",
            params![country.0, code],
        )?;
        Ok(id.map(RegionId).into())
    }

    fn create_region(&mut self, new: &NewRegion<'_>) -> Result<RegionId> {
        let id = self.free_geo_id(Level::Region, new.geo_id, new.code)?;
        self.conn
            .prepare_cached("INSERT INTO regions (id, country_id, code) VALUES (?1, ?2, ?3)")?
            .execute(params![id, new.country.0, new.code])?;
        Ok(RegionId(self.conn.last_insert_rowid()))
    }

    fn find_province(&self, region: RegionId, code: &str) -> Result<Lookup<ProvinceId>> {
        let id = self.find_id(
            "SELECT id FROM provinces WHERE region_id = ?1 AND code = ?2",
            params![region.0, code],
        )?;
        Ok(id.map(ProvinceId).into())
    }

    fn create_province(&mut self, new: &NewProvince<'_>) -> Result<ProvinceId> {
        let id = self.free_geo_id(Level::Province, new.geo_id, new.code)?;
        self.conn
            .prepare_cached("INSERT INTO provinces (id, region_id, code) VALUES (?1, ?2, ?3)")?
            .execute(params![id, new.region.0, new.code])?;
        Ok(ProvinceId(self.conn.last_insert_rowid()))
    }

    fn find_time_zone(&self, name: &str) -> Result<Lookup<TimeZoneId>> {
        let id = self.find_id("SELECT id FROM time_zones WHERE name = ?1", [name])?;
        Ok(id.map(TimeZoneId).into())
    }

    fn create_time_zone(&mut self, name: &str) -> Result<TimeZoneId> {
        self.conn
            .prepare_cached("INSERT INTO time_zones (name) VALUES (?1)")?
            .execute([name])?;
        Ok(TimeZoneId(self.conn.last_insert_rowid()))
    }

    fn find_city(&self, geo_id: i64) -> Result<Lookup<CityId>> {
        let id = self.find_id("SELECT id FROM cities WHERE id = ?1", [geo_id])?;
        Ok(id.map(CityId).into())
    }

    fn create_city(&mut self, new: &NewCity) -> Result<CityId> {
        self.conn
            .prepare_cached(
                "INSERT INTO cities (id, country_id, region_id, province_id, time_zone_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?
            .execute(params![
                new.geo_id,
                new.country.0,
                new.region.map(|r| r.0),
                new.province.map(|p| p.0),
                new.time_zone.0,
            ])?;
        Ok(CityId(new.geo_id))
    }

    fn find_name(&self, entity: EntityRef, language: &Language) -> Result<Lookup<LocalizedName>> {
        let sql = format!(
            "SELECT id, name FROM {} WHERE {} = ?1 AND lang = ?2",
            entity.level.names_table(),
            entity.level.fk_column()
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let found = stmt
            .query_row(params![entity.id, language.as_str()], |row| {
                Ok(LocalizedName {
                    id: row.get(0)?,
                    entity,
                    language: language.clone(),
                    name: row.get(1)?,
                })
            })
            .optional()?;
        Ok(found.into())
    }

    fn create_name(
        &mut self,
        entity: EntityRef,
        language: &Language,
        name: &str,
    ) -> Result<LocalizedName> {
        let sql = format!(
            "INSERT INTO {} ({}, lang, name) VALUES (?1, ?2, ?3)",
            entity.level.names_table(),
            entity.level.fk_column()
        );
        self.conn
            .prepare_cached(&sql)?
            .execute(params![entity.id, language.as_str(), name])?;
        Ok(LocalizedName {
            id: self.conn.last_insert_rowid(),
            entity,
            language: language.clone(),
            name: name.to_string(),
        })
    }

    fn save_name(&mut self, name: &LocalizedName) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET name = ?1 WHERE id = ?2",
            name.entity.level.names_table()
        );
        self.conn
            .prepare_cached(&sql)?
            .execute(params![name.name, name.id])?;
        Ok(())
    }

    fn entity_ids(&self, level: Level) -> Result<Vec<i64>> {
        let sql = format!("SELECT id FROM {} ORDER BY id", level.table());
        let mut stmt = self.conn.prepare(&sql)?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(ids)
    }

    fn count_cities(&self, entity: EntityRef) -> Result<u64> {
        let sql = match entity.level {
            Level::Continent => {
                "SELECT COUNT(*) FROM cities
                 JOIN countries ON countries.id = cities.country_id
                 WHERE countries.continent_id = ?1"
            }
            Level::Country => "SELECT COUNT(*) FROM cities WHERE country_id = ?1",
            Level::Region => "SELECT COUNT(*) FROM cities WHERE region_id = ?1",
            Level::Province => "SELECT COUNT(*) FROM cities WHERE province_id = ?1",
            Level::City => "SELECT COUNT(*) FROM cities WHERE id = ?1",
        };
        let count: i64 = self
            .conn
            .prepare_cached(sql)?
            .query_row([entity.id], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn delete(&mut self, entity: EntityRef) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", entity.level.table());
        self.conn.prepare_cached(&sql)?.execute([entity.id])?;
        Ok(())
    }

    fn count_entities(&self, level: Level) -> Result<u64> {
        self.count_rows(level.table())
    }

    fn count_names(&self, level: Level) -> Result<u64> {
        self.count_rows(level.names_table())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lang(code: &str) -> Language {
        code.parse().unwrap()
    }

    fn seed_country(store: &mut SqliteStore) -> CountryId {
        let eu = store.create_continent("EU").unwrap();
        store
            .create_country(&NewCountry {
                geo_id: 2510769,
                code: "ES",
                continent: eu,
            })
            .unwrap()
    }

    #[test]
    fn test_lookup_by_natural_key() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.find_continent("EU").unwrap(), Lookup::NotFound);

        let es = seed_country(&mut store);
        assert_eq!(es, CountryId(2510769));
        assert_eq!(store.find_country("ES").unwrap(), Lookup::Found(es));

        let ct = store
            .create_region(&NewRegion {
                geo_id: 3128760,
                country: es,
                code: "CT",
            })
            .unwrap();
        assert_eq!(store.find_region(es, "CT").unwrap(), Lookup::Found(ct));
        assert_eq!(store.find_region(es, "MD").unwrap(), Lookup::NotFound);
    }

    #[test]
    fn test_region_code_unique_within_country() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let es = seed_country(&mut store);
        store
            .create_region(&NewRegion {
                geo_id: 1,
                country: es,
                code: "CT",
            })
            .unwrap();
        let duplicate = store.create_region(&NewRegion {
            geo_id: 2,
            country: es,
            code: "CT",
        });
        assert!(matches!(duplicate, Err(GeoError::Storage(_))));
    }

    #[test]
    fn test_taken_geo_id_gets_fresh_id() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let eu = store.create_continent("EU").unwrap();
        let fr = store
            .create_country(&NewCountry {
                geo_id: 3017382,
                code: "FR",
                continent: eu,
            })
            .unwrap();
        let alsace = store
            .create_region(&NewRegion {
                geo_id: 100,
                country: fr,
                code: "A",
            })
            .unwrap();
        let grand_est = store
            .create_region(&NewRegion {
                geo_id: 100,
                country: fr,
                code: "GES",
            })
            .unwrap();

        assert_eq!(alsace, RegionId(100));
        assert_ne!(grand_est, alsace);
        assert_eq!(store.find_region(fr, "GES").unwrap(), Lookup::Found(grand_est));

        let province = store
            .create_province(&NewProvince {
                geo_id: 100,
                region: grand_est,
                code: "67",
            })
            .unwrap();
        assert_eq!(province, ProvinceId(100));
        let moved = store
            .create_province(&NewProvince {
                geo_id: 100,
                region: grand_est,
                code: "68",
            })
            .unwrap();
        assert_ne!(moved, province);
    }

    #[test]
    fn test_names_upsert_and_cascade() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let es = seed_country(&mut store);
        let ct = store
            .create_region(&NewRegion {
                geo_id: 1,
                country: es,
                code: "CT",
            })
            .unwrap();

        let en = lang("en");
        let mut name = store.create_name(ct.entity(), &en, "Catalonia").unwrap();
        name.name = "Catalunya".to_string();
        store.save_name(&name).unwrap();

        match store.find_name(ct.entity(), &en).unwrap() {
            Lookup::Found(found) => assert_eq!(found.name, "Catalunya"),
            Lookup::NotFound => panic!("name should exist"),
        }
        assert_eq!(store.find_name(ct.entity(), &lang("es")).unwrap(), Lookup::NotFound);

        store.delete(ct.entity()).unwrap();
        assert_eq!(store.count_names(Level::Region).unwrap(), 0);
        assert_eq!(store.count_entities(Level::Region).unwrap(), 0);
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let es = seed_country(&mut store);
        assert!(store.create_name(es.entity(), &lang("en"), "").is_err());
    }

    #[test]
    fn test_count_cities() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let es = seed_country(&mut store);
        let ct = store
            .create_region(&NewRegion {
                geo_id: 1,
                country: es,
                code: "CT",
            })
            .unwrap();
        let tz = store.create_time_zone("Europe/Madrid").unwrap();
        store
            .create_city(&NewCity {
                geo_id: 3128760,
                country: es,
                region: Some(ct),
                province: None,
                time_zone: tz,
            })
            .unwrap();

        assert_eq!(store.count_cities(ct.entity()).unwrap(), 1);
        assert_eq!(store.count_cities(es.entity()).unwrap(), 1);
        let eu = store.find_continent("EU").unwrap().into_option().unwrap();
        assert_eq!(store.count_cities(eu.entity()).unwrap(), 1);
        assert_eq!(store.entity_ids(Level::City).unwrap(), vec![3128760]);
    }
}
