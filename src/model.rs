//! Core domain types shared by the parser, importer and store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GeoError;

/// Hierarchy levels in strict parent-before-child order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    Continent,
    Country,
    Region,
    Province,
    City,
}

impl Level {
    pub const ALL: [Level; 5] = [
        Level::Continent,
        Level::Country,
        Level::Region,
        Level::Province,
        Level::City,
    ];

    /// Entity table name
    pub fn table(self) -> &'static str {
        crate::schema::level_table(self).name
    }

    /// Localized name table attached to this level
    pub fn names_table(self) -> &'static str {
        crate::schema::names_table(self).name
    }

    /// Column that references this level from children and name rows
    pub fn fk_column(self) -> &'static str {
        match self {
            Level::Continent => "continent_id",
            Level::Country => "country_id",
            Level::Region => "region_id",
            Level::Province => "province_id",
            Level::City => "city_id",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            Level::Continent => "Continents",
            Level::Country => "Countries",
            Level::Region => "Regions",
            Level::Province => "Provinces",
            Level::City => "Cities",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::Continent => "continent",
            Level::Country => "country",
            Level::Region => "region",
            Level::Province => "province",
            Level::City => "city",
        };
        f.write_str(s)
    }
}

/// A configured language code as it appears in source file names (`en`, `pt-BR`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Language(String);

impl Language {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Language {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        let valid = !code.is_empty()
            && code
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(code.to_string()))
        } else {
            Err(GeoError::Config(format!("invalid language code: {:?}", s)))
        }
    }
}

impl TryFrom<String> for Language {
    type Error = GeoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Language> for String {
    fn from(lang: Language) -> Self {
        lang.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a natural-key lookup against storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound => None,
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Lookup::Found(v),
            None => Lookup::NotFound,
        }
    }
}

macro_rules! entity_id {
    ($name:ident, $level:expr) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub i64);

        impl $name {
            pub fn entity(self) -> EntityRef {
                EntityRef {
                    level: $level,
                    id: self.0,
                }
            }
        }
    };
}

entity_id!(ContinentId, Level::Continent);
entity_id!(CountryId, Level::Country);
entity_id!(RegionId, Level::Region);
entity_id!(ProvinceId, Level::Province);
entity_id!(CityId, Level::City);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeZoneId(pub i64);

/// Level-generic handle to a persisted entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub level: Level,
    pub id: i64,
}

/// Persisted localized name row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedName {
    pub id: i64,
    pub entity: EntityRef,
    pub language: Language,
    pub name: String,
}

/// Natural key of a region: (country code, region code)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionKey {
    pub country: String,
    pub region: String,
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.country, self.region)
    }
}

/// Natural key of a province: (country code, region code, province code)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProvinceKey {
    pub country: String,
    pub region: String,
    pub province: String,
}

impl ProvinceKey {
    pub fn region_key(&self) -> RegionKey {
        RegionKey {
            country: self.country.clone(),
            region: self.region.clone(),
        }
    }
}

impl fmt::Display for ProvinceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.country, self.region, self.province)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parse() {
        assert_eq!("en".parse::<Language>().unwrap().as_str(), "en");
        assert_eq!(" pt-BR ".parse::<Language>().unwrap().as_str(), "pt-BR");
        assert!("".parse::<Language>().is_err());
        assert!("../etc".parse::<Language>().is_err());
    }

    #[test]
    fn test_composite_key_display() {
        let key = ProvinceKey {
            country: "ES".into(),
            region: "CT".into(),
            province: "B".into(),
        };
        assert_eq!(key.to_string(), "ES_CT_B");
        assert_eq!(key.region_key().to_string(), "ES_CT");
    }

    #[test]
    fn test_levels_ordered_parent_first() {
        let mut sorted = Level::ALL;
        sorted.sort();
        assert_eq!(sorted, Level::ALL);
        assert_eq!(Level::Region.names_table(), "region_names");
    }
}
