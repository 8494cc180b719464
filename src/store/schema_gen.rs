use crate::schema::{ColumnType, TableSchema, NAME_MAX_LEN};

/// Generate CREATE TABLE SQL for a table schema
pub fn generate_create_table(schema: &TableSchema) -> String {
    let mut sql = format!("CREATE TABLE IF NOT EXISTS {} (\n", schema.name);
    let mut columns = Vec::new();

    for col in schema.columns {
        let definition = match col.col_type {
            ColumnType::AutoId => format!("    {} INTEGER PRIMARY KEY AUTOINCREMENT", col.name),
            ColumnType::GeoId => format!("    {} INTEGER PRIMARY KEY", col.name),
            _ => {
                let sql_type = match col.col_type {
                    ColumnType::Integer => "INTEGER",
                    ColumnType::Text | ColumnType::Name => "TEXT",
                    ColumnType::AutoId | ColumnType::GeoId => unreachable!(),
                };
                let null_constraint = if !col.nullable { " NOT NULL" } else { "" };
                let check = if col.col_type == ColumnType::Name {
                    format!(
                        " CHECK (length({}) BETWEEN 1 AND {})",
                        col.name, NAME_MAX_LEN
                    )
                } else {
                    String::new()
                };
                format!("    {} {}{}{}", col.name, sql_type, null_constraint, check)
            }
        };
        columns.push(definition);
    }

    for fk in schema.foreign_keys {
        columns.push(format!(
            "    FOREIGN KEY ({}) REFERENCES {}({}) ON DELETE CASCADE",
            fk.column, fk.references_table, fk.references_column
        ));
    }

    sql.push_str(&columns.join(",\n"));
    sql.push_str("\n)");

    sql
}

/// Generate CREATE INDEX statements for declared indexes
pub fn generate_indexes(schema: &TableSchema) -> Vec<String> {
    schema
        .indexes
        .iter()
        .map(|index| {
            let kind = if index.unique { "UNIQUE INDEX" } else { "INDEX" };
            format!(
                "CREATE {} IF NOT EXISTS idx_{}_{} ON {}({})",
                kind,
                schema.name,
                index.columns.join("_"),
                schema.name,
                index.columns.join(", ")
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::{CITIES, CONTINENTS, REGIONS, REGION_NAMES};

    #[test]
    fn test_generate_create_table() {
        let sql = generate_create_table(&CITIES);
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS cities"));
        assert!(sql.contains("id INTEGER PRIMARY KEY"));
        assert!(sql.contains("country_id INTEGER NOT NULL"));
        assert!(sql.contains("    region_id INTEGER,"));
        assert!(sql.contains(
            "FOREIGN KEY (time_zone_id) REFERENCES time_zones(id) ON DELETE CASCADE"
        ));

        let sql = generate_create_table(&CONTINENTS);
        assert!(sql.contains("id INTEGER PRIMARY KEY AUTOINCREMENT"));
    }

    #[test]
    fn test_name_column_is_bounded() {
        let sql = generate_create_table(&REGION_NAMES);
        assert!(sql.contains("name TEXT NOT NULL CHECK (length(name) BETWEEN 1 AND 100)"));
    }

    #[test]
    fn test_generate_indexes() {
        let indexes = generate_indexes(&REGIONS);
        assert_eq!(
            indexes,
            vec![
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_regions_country_id_code \
                 ON regions(country_id, code)"
            ]
        );
    }
}
