//! Storage contract the importer reconciles against, plus the SQLite backend.

pub mod schema_gen;
pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::model::{
    CityId, ContinentId, CountryId, EntityRef, Language, Level, LocalizedName, Lookup,
    ProvinceId, RegionId, TimeZoneId,
};

#[derive(Debug, Clone, PartialEq)]
pub struct NewCountry<'a> {
    pub geo_id: i64,
    pub code: &'a str,
    pub continent: ContinentId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRegion<'a> {
    pub geo_id: i64,
    pub country: CountryId,
    pub code: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProvince<'a> {
    pub geo_id: i64,
    pub region: RegionId,
    pub code: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCity {
    pub geo_id: i64,
    pub country: CountryId,
    pub region: Option<RegionId>,
    pub province: Option<ProvinceId>,
    pub time_zone: TimeZoneId,
}

/// Get-or-create contract for every entity of the hierarchy.
///
/// Lookups are by natural key and never fail on absence; they return
/// `Lookup::NotFound` instead. Creation assumes the caller already checked.
pub trait GeoStore {
    /// Start a unit of work; everything until `commit` is applied atomically
    fn begin(&mut self) -> Result<()>;
    fn commit(&mut self) -> Result<()>;

    fn find_continent(&self, code: &str) -> Result<Lookup<ContinentId>>;
    fn create_continent(&mut self, code: &str) -> Result<ContinentId>;

    fn find_country(&self, code: &str) -> Result<Lookup<CountryId>>;
    fn create_country(&mut self, new: &NewCountry<'_>) -> Result<CountryId>;

    fn find_region(&self, country: CountryId, code: &str) -> Result<Lookup<RegionId>>;
    fn create_region(&mut self, new: &NewRegion<'_>) -> Result<RegionId>;

    fn find_province(&self, region: RegionId, code: &str) -> Result<Lookup<ProvinceId>>;
    fn create_province(&mut self, new: &NewProvince<'_>) -> Result<ProvinceId>;

    fn find_time_zone(&self, name: &str) -> Result<Lookup<TimeZoneId>>;
    fn create_time_zone(&mut self, name: &str) -> Result<TimeZoneId>;

    fn find_city(&self, geo_id: i64) -> Result<Lookup<CityId>>;
    fn create_city(&mut self, new: &NewCity) -> Result<CityId>;

    fn find_name(&self, entity: EntityRef, language: &Language) -> Result<Lookup<LocalizedName>>;
    fn create_name(
        &mut self,
        entity: EntityRef,
        language: &Language,
        name: &str,
    ) -> Result<LocalizedName>;
    fn save_name(&mut self, name: &LocalizedName) -> Result<()>;

    /// Ids of every persisted entity at a level
    fn entity_ids(&self, level: Level) -> Result<Vec<i64>>;
    /// Number of cities attached at or below an entity
    fn count_cities(&self, entity: EntityRef) -> Result<u64>;
    /// Delete an entity; its names and descendants go with it
    fn delete(&mut self, entity: EntityRef) -> Result<()>;

    fn count_entities(&self, level: Level) -> Result<u64>;
    fn count_names(&self, level: Level) -> Result<u64>;
}
