//! Table schema definitions for the geodata hierarchy

use super::types::*;
use crate::model::Level;

// =============================================================================
// Hierarchy
// =============================================================================

pub static CONTINENTS: TableSchema = TableSchema {
    name: "continents",
    columns: &[
        Column::required("id", ColumnType::AutoId),
        Column::required("code", ColumnType::Text),
    ],
    foreign_keys: &[],
    indexes: &[Index::unique(&["code"])],
};

pub static COUNTRIES: TableSchema = TableSchema {
    name: "countries",
    columns: &[
        Column::required("id", ColumnType::GeoId),
        Column::required("code", ColumnType::Text),
        Column::required("continent_id", ColumnType::Integer),
    ],
    foreign_keys: &[ForeignKey::new("continent_id", "continents")],
    indexes: &[Index::unique(&["code"]), Index::on(&["continent_id"])],
};

pub static REGIONS: TableSchema = TableSchema {
    name: "regions",
    columns: &[
        Column::required("id", ColumnType::GeoId),
        Column::required("country_id", ColumnType::Integer),
        Column::required("code", ColumnType::Text),
    ],
    foreign_keys: &[ForeignKey::new("country_id", "countries")],
    indexes: &[Index::unique(&["country_id", "code"])],
};

pub static PROVINCES: TableSchema = TableSchema {
    name: "provinces",
    columns: &[
        Column::required("id", ColumnType::GeoId),
        Column::required("region_id", ColumnType::Integer),
        Column::required("code", ColumnType::Text),
    ],
    foreign_keys: &[ForeignKey::new("region_id", "regions")],
    indexes: &[Index::unique(&["region_id", "code"])],
};

pub static TIME_ZONES: TableSchema = TableSchema {
    name: "time_zones",
    columns: &[
        Column::required("id", ColumnType::AutoId),
        Column::required("name", ColumnType::Text),
    ],
    foreign_keys: &[],
    indexes: &[Index::unique(&["name"])],
};

pub static CITIES: TableSchema = TableSchema {
    name: "cities",
    columns: &[
        Column::required("id", ColumnType::GeoId),
        Column::required("country_id", ColumnType::Integer),
        Column::new("region_id", ColumnType::Integer),
        Column::new("province_id", ColumnType::Integer),
        Column::required("time_zone_id", ColumnType::Integer),
    ],
    foreign_keys: &[
        ForeignKey::new("country_id", "countries"),
        ForeignKey::new("region_id", "regions"),
        ForeignKey::new("province_id", "provinces"),
        ForeignKey::new("time_zone_id", "time_zones"),
    ],
    indexes: &[
        Index::on(&["country_id"]),
        Index::on(&["region_id"]),
        Index::on(&["province_id"]),
        Index::on(&["time_zone_id"]),
    ],
};

// =============================================================================
// Localized names (one row per entity and language)
// =============================================================================

macro_rules! names_table {
    ($ident:ident, $table:expr, $fk:expr, $parent:expr) => {
        pub static $ident: TableSchema = TableSchema {
            name: $table,
            columns: &[
                Column::required("id", ColumnType::AutoId),
                Column::required($fk, ColumnType::Integer),
                Column::required("lang", ColumnType::Text),
                Column::required("name", ColumnType::Name),
            ],
            foreign_keys: &[ForeignKey::new($fk, $parent)],
            indexes: &[Index::unique(&[$fk, "lang"])],
        };
    };
}

names_table!(CONTINENT_NAMES, "continent_names", "continent_id", "continents");
names_table!(COUNTRY_NAMES, "country_names", "country_id", "countries");
names_table!(REGION_NAMES, "region_names", "region_id", "regions");
names_table!(PROVINCE_NAMES, "province_names", "province_id", "provinces");
names_table!(CITY_NAMES, "city_names", "city_id", "cities");

/// All tables in dependency order (parents before children)
pub static ALL_TABLES: &[&TableSchema] = &[
    &CONTINENTS,
    &COUNTRIES,
    &REGIONS,
    &PROVINCES,
    &TIME_ZONES,
    &CITIES,
    &CONTINENT_NAMES,
    &COUNTRY_NAMES,
    &REGION_NAMES,
    &PROVINCE_NAMES,
    &CITY_NAMES,
];

/// Entity table for a hierarchy level
pub fn level_table(level: Level) -> &'static TableSchema {
    match level {
        Level::Continent => &CONTINENTS,
        Level::Country => &COUNTRIES,
        Level::Region => &REGIONS,
        Level::Province => &PROVINCES,
        Level::City => &CITIES,
    }
}

/// Localized name table for a hierarchy level
pub fn names_table(level: Level) -> &'static TableSchema {
    match level {
        Level::Continent => &CONTINENT_NAMES,
        Level::Country => &COUNTRY_NAMES,
        Level::Region => &REGION_NAMES,
        Level::Province => &PROVINCE_NAMES,
        Level::City => &CITY_NAMES,
    }
}
