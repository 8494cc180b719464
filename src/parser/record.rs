use std::fmt::Display;

use crate::model::{Level, ProvinceKey, RegionKey};
use crate::source::{Row, SourceKind};

// Column positions in GeoLite2-Country-Locations-*.csv
mod country_cols {
    pub const GEONAME_ID: usize = 0;
    pub const CONTINENT_CODE: usize = 2;
    pub const CONTINENT_NAME: usize = 3;
    pub const COUNTRY_ISO_CODE: usize = 4;
    pub const COUNTRY_NAME: usize = 5;
}

// Column positions in GeoLite2-City-Locations-*.csv
mod city_cols {
    pub const GEONAME_ID: usize = 0;
    pub const COUNTRY_ISO_CODE: usize = 4;
    pub const SUBDIVISION_1_CODE: usize = 6;
    pub const SUBDIVISION_1_NAME: usize = 7;
    pub const SUBDIVISION_2_CODE: usize = 8;
    pub const SUBDIVISION_2_NAME: usize = 9;
    pub const CITY_NAME: usize = 10;
    pub const TIME_ZONE: usize = 12;
}

/// A typed row for one hierarchy level.
///
/// `parse` returns `None` for rows that do not describe an entity at this
/// level (missing code, missing name, unparsable id); that is not an error.
pub trait LevelRecord: Sized {
    const LEVEL: Level;
    const SOURCE: SourceKind;

    /// Natural key identifying the entity across language files
    type Key: Ord + Clone + Display;

    fn parse(row: &Row) -> Option<Self>;
    fn key(&self) -> Self::Key;
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContinentRecord {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountryRecord {
    pub geo_id: i64,
    pub continent: String,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionRecord {
    pub geo_id: i64,
    pub country: String,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProvinceRecord {
    pub geo_id: i64,
    pub country: String,
    pub region: String,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CityRecord {
    pub geo_id: i64,
    pub country: String,
    pub region: Option<String>,
    pub province: Option<String>,
    pub name: String,
    pub time_zone: String,
}

impl CityRecord {
    pub fn region_key(&self) -> Option<RegionKey> {
        self.region.as_ref().map(|region| RegionKey {
            country: self.country.clone(),
            region: region.clone(),
        })
    }

    pub fn province_key(&self) -> Option<ProvinceKey> {
        match (&self.region, &self.province) {
            (Some(region), Some(province)) => Some(ProvinceKey {
                country: self.country.clone(),
                region: region.clone(),
                province: province.clone(),
            }),
            _ => None,
        }
    }
}

impl LevelRecord for ContinentRecord {
    const LEVEL: Level = Level::Continent;
    const SOURCE: SourceKind = SourceKind::Countries;
    type Key = String;

    fn parse(row: &Row) -> Option<Self> {
        Some(Self {
            code: code(row, country_cols::CONTINENT_CODE)?,
            name: clean_name(&row.field(country_cols::CONTINENT_NAME))?,
        })
    }

    fn key(&self) -> String {
        self.code.clone()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl LevelRecord for CountryRecord {
    const LEVEL: Level = Level::Country;
    const SOURCE: SourceKind = SourceKind::Countries;
    type Key = String;

    fn parse(row: &Row) -> Option<Self> {
        Some(Self {
            geo_id: geo_id(row, country_cols::GEONAME_ID)?,
            continent: code(row, country_cols::CONTINENT_CODE)?,
            code: code(row, country_cols::COUNTRY_ISO_CODE)?,
            name: clean_name(&row.field(country_cols::COUNTRY_NAME))?,
        })
    }

    fn key(&self) -> String {
        self.code.clone()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl LevelRecord for RegionRecord {
    const LEVEL: Level = Level::Region;
    const SOURCE: SourceKind = SourceKind::Cities;
    type Key = RegionKey;

    fn parse(row: &Row) -> Option<Self> {
        Some(Self {
            geo_id: geo_id(row, city_cols::GEONAME_ID)?,
            country: code(row, city_cols::COUNTRY_ISO_CODE)?,
            code: code(row, city_cols::SUBDIVISION_1_CODE)?,
            name: clean_name(&row.field(city_cols::SUBDIVISION_1_NAME))?,
        })
    }

    fn key(&self) -> RegionKey {
        RegionKey {
            country: self.country.clone(),
            region: self.code.clone(),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl LevelRecord for ProvinceRecord {
    const LEVEL: Level = Level::Province;
    const SOURCE: SourceKind = SourceKind::Cities;
    type Key = ProvinceKey;

    fn parse(row: &Row) -> Option<Self> {
        Some(Self {
            geo_id: geo_id(row, city_cols::GEONAME_ID)?,
            country: code(row, city_cols::COUNTRY_ISO_CODE)?,
            region: code(row, city_cols::SUBDIVISION_1_CODE)?,
            code: code(row, city_cols::SUBDIVISION_2_CODE)?,
            name: clean_name(&row.field(city_cols::SUBDIVISION_2_NAME))?,
        })
    }

    fn key(&self) -> ProvinceKey {
        ProvinceKey {
            country: self.country.clone(),
            region: self.region.clone(),
            province: self.code.clone(),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl LevelRecord for CityRecord {
    const LEVEL: Level = Level::City;
    const SOURCE: SourceKind = SourceKind::Cities;
    type Key = i64;

    fn parse(row: &Row) -> Option<Self> {
        let region = code(row, city_cols::SUBDIVISION_1_CODE);
        // A province only exists under a region
        let province = region
            .as_ref()
            .and_then(|_| code(row, city_cols::SUBDIVISION_2_CODE));

        Some(Self {
            geo_id: geo_id(row, city_cols::GEONAME_ID)?,
            country: code(row, city_cols::COUNTRY_ISO_CODE)?,
            region,
            province,
            name: clean_name(&row.field(city_cols::CITY_NAME))?,
            time_zone: clean_name(&row.field(city_cols::TIME_ZONE))?,
        })
    }

    fn key(&self) -> i64 {
        self.geo_id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Strip one layer of literal double quotes left inside a field, then trim.
/// Returns `None` when nothing is left.
pub fn clean_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
        .trim();
    (!unquoted.is_empty()).then(|| unquoted.to_string())
}

fn code(row: &Row, idx: usize) -> Option<String> {
    let value = row.field(idx);
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn geo_id(row: &Row, idx: usize) -> Option<i64> {
    row.field(idx).trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn country_row(fields: [&str; 7]) -> Row {
        Row::from_fields(&fields)
    }

    fn city_row(fields: [&str; 14]) -> Row {
        Row::from_fields(&fields)
    }

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("Europe").as_deref(), Some("Europe"));
        assert_eq!(clean_name("\"Europe\"").as_deref(), Some("Europe"));
        assert_eq!(clean_name("  \"Côte d'Ivoire\" ").as_deref(), Some("Côte d'Ivoire"));
        assert_eq!(clean_name("\"\"").as_deref(), None);
        assert_eq!(clean_name("   ").as_deref(), None);
        // Only one layer is removed
        assert_eq!(clean_name("\"\"X\"\"").as_deref(), Some("\"X\""));
    }

    #[test]
    fn test_parse_continent_and_country() {
        let row = country_row(["2510769", "es", "EU", "Europa", "ES", "España", "1"]);
        assert_eq!(
            ContinentRecord::parse(&row),
            Some(ContinentRecord {
                code: "EU".into(),
                name: "Europa".into()
            })
        );
        let country = CountryRecord::parse(&row).unwrap();
        assert_eq!(country.geo_id, 2510769);
        assert_eq!(country.continent, "EU");
        assert_eq!(country.key(), "ES");
        assert_eq!(country.name(), "España");
    }

    #[test]
    fn test_continent_only_row_is_not_a_country() {
        let row = country_row(["6255148", "en", "EU", "Europe", "", "", "0"]);
        assert!(ContinentRecord::parse(&row).is_some());
        assert!(CountryRecord::parse(&row).is_none());
    }

    #[test]
    fn test_parse_region_and_province() {
        let row = city_row([
            "3128760", "en", "EU", "Europe", "ES", "Spain", "CT", "Catalonia", "B", "Barcelona",
            "Barcelona", "", "Europe/Madrid", "1",
        ]);
        let region = RegionRecord::parse(&row).unwrap();
        assert_eq!(region.key().to_string(), "ES_CT");
        let province = ProvinceRecord::parse(&row).unwrap();
        assert_eq!(province.key().to_string(), "ES_CT_B");
        assert_eq!(province.name, "Barcelona");
    }

    #[test]
    fn test_country_level_city_row_has_no_region() {
        let row = city_row([
            "3117735", "en", "EU", "Europe", "ES", "Spain", "", "", "", "", "Madrid", "",
            "Europe/Madrid", "1",
        ]);
        assert!(RegionRecord::parse(&row).is_none());
        assert!(ProvinceRecord::parse(&row).is_none());

        let city = CityRecord::parse(&row).unwrap();
        assert_eq!(city.region_key(), None);
        assert_eq!(city.province_key(), None);
        assert_eq!(city.time_zone, "Europe/Madrid");
    }

    #[test]
    fn test_city_requires_name_timezone_and_country() {
        let no_name = city_row([
            "1", "en", "EU", "Europe", "ES", "Spain", "CT", "Catalonia", "", "", "", "",
            "Europe/Madrid", "1",
        ]);
        assert!(CityRecord::parse(&no_name).is_none());
        // ...but the same row still carries a region
        assert!(RegionRecord::parse(&no_name).is_some());

        let no_tz = city_row([
            "1", "en", "EU", "Europe", "ES", "Spain", "", "", "", "", "Madrid", "", "", "1",
        ]);
        assert!(CityRecord::parse(&no_tz).is_none());

        let no_country = city_row([
            "1", "en", "EU", "Europe", "", "", "", "", "", "", "Madrid", "", "Europe/Madrid", "1",
        ]);
        assert!(CityRecord::parse(&no_country).is_none());
    }

    #[test]
    fn test_bad_geo_id_drops_row() {
        let row = country_row(["abc", "en", "EU", "Europe", "ES", "Spain", "1"]);
        assert!(CountryRecord::parse(&row).is_none());
        // Continents ignore the geo id
        assert!(ContinentRecord::parse(&row).is_some());
    }

    #[test]
    fn test_province_without_region_is_ignored_by_city() {
        let row = city_row([
            "9", "en", "EU", "Europe", "IT", "Italy", "", "", "RM", "Rome", "Roma", "",
            "Europe/Rome", "1",
        ]);
        let city = CityRecord::parse(&row).unwrap();
        assert_eq!(city.province, None);
        assert!(ProvinceRecord::parse(&row).is_none());
    }
}
