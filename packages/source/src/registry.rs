//! Embedded export schemas.
//!
//! Each `.toml` file in `packages/source/schemas/` is baked into the binary
//! via [`include_str!`]. Supporting another system means adding a file here.

use crate::SourceError;
use crate::schema::{SourceSchema, parse_schema_toml};

/// TOML schemas embedded at compile time.
const SCHEMA_TOMLS: &[(&str, &str)] = &[
    ("bluebikes", include_str!("../schemas/bluebikes.toml")),
    (
        "bluebikes_legacy",
        include_str!("../schemas/bluebikes_legacy.toml"),
    ),
];

/// Returns every embedded schema.
///
/// # Panics
///
/// Panics if an embedded TOML file is malformed. The files ship with the
/// crate and are covered by tests.
#[must_use]
pub fn all_schemas() -> Vec<SourceSchema> {
    SCHEMA_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_schema_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Looks up an embedded schema by id.
///
/// # Errors
///
/// Returns [`SourceError::UnknownSchema`] if no embedded schema has that id.
pub fn find_schema(id: &str) -> Result<SourceSchema, SourceError> {
    all_schemas()
        .into_iter()
        .find(|s| s.id == id)
        .ok_or_else(|| SourceError::UnknownSchema { id: id.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_all_schemas() {
        assert_eq!(all_schemas().len(), SCHEMA_TOMLS.len());
    }

    #[test]
    fn file_names_match_ids() {
        for ((name, _), schema) in SCHEMA_TOMLS.iter().zip(all_schemas()) {
            assert_eq!(*name, schema.id);
        }
    }

    #[test]
    fn schema_ids_are_unique() {
        let schemas = all_schemas();
        let mut ids: Vec<&str> = schemas.iter().map(|s| s.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), SCHEMA_TOMLS.len());
    }

    #[test]
    fn finds_by_id() {
        assert_eq!(find_schema("bluebikes").unwrap().id, "bluebikes");
        assert!(matches!(
            find_schema("citibike"),
            Err(SourceError::UnknownSchema { id }) if id == "citibike"
        ));
    }
}
