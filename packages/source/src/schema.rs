//! Config-driven export schemas.
//!
//! A [`SourceSchema`] names the columns a particular bike share export uses
//! for each canonical station and trip field. One generic mapper handles
//! every export, so adding a system means adding a TOML file, not code.

use bike_map_trip_models::{RawTrip, Station};
use serde::Deserialize;
use thiserror::Error;

use crate::SourceError;
use crate::parsing::{valid_lng_lat, value_as_f64, value_as_id};

// ── Top-level schema ─────────────────────────────────────────────────────

/// How one bike share system lays out its station list and trip export.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSchema {
    /// Unique identifier (e.g., `"bluebikes"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Optional longer description shown by `bike_map schemas`.
    #[serde(default)]
    pub description: Option<String>,
    /// Station list layout.
    pub stations: StationSchema,
    /// Trip export layout.
    pub trips: TripSchema,
}

/// File format of a station list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationFormat {
    /// A JSON document containing an array of station objects.
    Json,
    /// A CSV file with a header row.
    Csv,
}

/// Station list layout.
#[derive(Debug, Clone, Deserialize)]
pub struct StationSchema {
    /// File format.
    pub format: StationFormat,
    /// Dot-separated path to the station array inside a JSON document
    /// (e.g., `"data.stations"`). The document itself must be the array
    /// when absent.
    #[serde(default)]
    pub records_path: Option<String>,
    /// Column names for each station field.
    pub fields: StationFields,
}

/// Column candidates for station fields.
#[derive(Debug, Clone, Deserialize)]
pub struct StationFields {
    /// Station identifier. Strings or integers.
    pub id: FieldNames,
    /// Display name. Falls back to the id when missing.
    #[serde(default)]
    pub name: FieldNames,
    /// Longitude in decimal degrees. Strings or numbers.
    pub longitude: FieldNames,
    /// Latitude in decimal degrees. Strings or numbers.
    pub latitude: FieldNames,
}

/// Trip export layout.
#[derive(Debug, Clone, Deserialize)]
pub struct TripSchema {
    /// Column names for each trip field.
    pub fields: TripFields,
}

/// Column candidates for trip fields.
#[derive(Debug, Clone, Deserialize)]
pub struct TripFields {
    /// Station the trip started at.
    pub start_station_id: FieldNames,
    /// Station the trip ended at.
    pub end_station_id: FieldNames,
    /// Start timestamp.
    pub started_at: FieldNames,
    /// End timestamp.
    pub ended_at: FieldNames,
}

// ── Field name candidates ────────────────────────────────────────────────

/// Column names tried in order; the first present, non-empty value wins.
///
/// Deserializes from either a single string or a list of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "OneOrMany")]
pub struct FieldNames(Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<OneOrMany> for FieldNames {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(name) => Self(vec![name]),
            OneOrMany::Many(names) => Self(names),
        }
    }
}

impl FieldNames {
    /// Candidate column names in priority order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// Whether no candidates are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First candidate column that parses as an identifier.
    fn id(&self, record: &serde_json::Value) -> Option<String> {
        self.0
            .iter()
            .filter_map(|f| record.get(f))
            .find_map(value_as_id)
    }

    /// First candidate column holding a non-empty string.
    fn text(&self, record: &serde_json::Value) -> Option<String> {
        self.0
            .iter()
            .filter_map(|f| record.get(f)?.as_str())
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(String::from)
    }

    /// First candidate column that parses as a number.
    fn f64(&self, record: &serde_json::Value) -> Option<f64> {
        self.0
            .iter()
            .filter_map(|f| record.get(f))
            .find_map(value_as_f64)
    }
}

// ── Record mapping ───────────────────────────────────────────────────────

/// Why a single record could not be mapped. The record is skipped; loading
/// continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    /// None of the candidate columns held a usable value.
    #[error("missing {field}")]
    MissingField {
        /// Canonical field name.
        field: &'static str,
    },

    /// Coordinates were missing, zero, or out of range.
    #[error("station {id} has no usable coordinates")]
    InvalidCoordinates {
        /// Id of the rejected station.
        id: String,
    },
}

impl StationSchema {
    /// Maps one raw record onto a [`Station`].
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] if the record has no id or no usable
    /// coordinates.
    pub fn station(&self, record: &serde_json::Value) -> Result<Station, RecordError> {
        let fields = &self.fields;
        let id = fields
            .id
            .id(record)
            .ok_or(RecordError::MissingField { field: "id" })?;

        let Some((longitude, latitude)) =
            valid_lng_lat(fields.longitude.f64(record), fields.latitude.f64(record))
        else {
            return Err(RecordError::InvalidCoordinates { id });
        };

        let name = fields.name.text(record).unwrap_or_else(|| id.clone());

        Ok(Station {
            id,
            name,
            longitude,
            latitude,
        })
    }

    /// Finds the station array inside a parsed JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Schema`] if `records_path` does not lead to an
    /// array.
    pub fn records<'a>(
        &self,
        document: &'a serde_json::Value,
    ) -> Result<&'a [serde_json::Value], SourceError> {
        let mut node = document;
        if let Some(path) = self.records_path.as_deref() {
            for segment in path.split('.').filter(|s| !s.is_empty()) {
                node = node.get(segment).ok_or_else(|| SourceError::Schema {
                    message: format!("records path '{path}' has no '{segment}' key"),
                })?;
            }
        }

        node.as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| SourceError::Schema {
                message: format!(
                    "records path '{}' is not an array",
                    self.records_path.as_deref().unwrap_or("")
                ),
            })
    }
}

impl TripSchema {
    /// Maps one raw record onto a [`RawTrip`]. Timestamps are left as text
    /// for the bucketer to parse.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::MissingField`] naming the first absent field.
    pub fn trip(&self, record: &serde_json::Value) -> Result<RawTrip, RecordError> {
        let fields = &self.fields;
        Ok(RawTrip {
            start_station_id: fields
                .start_station_id
                .id(record)
                .ok_or(RecordError::MissingField {
                    field: "start_station_id",
                })?,
            end_station_id: fields
                .end_station_id
                .id(record)
                .ok_or(RecordError::MissingField {
                    field: "end_station_id",
                })?,
            started_at: fields
                .started_at
                .text(record)
                .ok_or(RecordError::MissingField {
                    field: "started_at",
                })?,
            ended_at: fields
                .ended_at
                .text(record)
                .ok_or(RecordError::MissingField { field: "ended_at" })?,
        })
    }
}

/// Parses a [`SourceSchema`] from a TOML string.
///
/// # Errors
///
/// Returns [`SourceError::Schema`] if the TOML is malformed, missing
/// required fields, or leaves a required field without candidates.
pub fn parse_schema_toml(toml_str: &str) -> Result<SourceSchema, SourceError> {
    let schema: SourceSchema = toml::de::from_str(toml_str).map_err(|e| SourceError::Schema {
        message: e.to_string(),
    })?;

    let required = [
        ("stations.fields.id", &schema.stations.fields.id),
        ("stations.fields.longitude", &schema.stations.fields.longitude),
        ("stations.fields.latitude", &schema.stations.fields.latitude),
        (
            "trips.fields.start_station_id",
            &schema.trips.fields.start_station_id,
        ),
        (
            "trips.fields.end_station_id",
            &schema.trips.fields.end_station_id,
        ),
        ("trips.fields.started_at", &schema.trips.fields.started_at),
        ("trips.fields.ended_at", &schema.trips.fields.ended_at),
    ];
    if let Some((key, _)) = required.iter().find(|(_, names)| names.is_empty()) {
        return Err(SourceError::Schema {
            message: format!("{}: {key} lists no columns", schema.id),
        });
    }

    Ok(schema)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn gbfs() -> SourceSchema {
        parse_schema_toml(include_str!("../schemas/bluebikes.toml")).unwrap()
    }

    fn legacy() -> SourceSchema {
        parse_schema_toml(include_str!("../schemas/bluebikes_legacy.toml")).unwrap()
    }

    #[test]
    fn parses_embedded_schemas() {
        let schema = gbfs();
        assert_eq!(schema.id, "bluebikes");
        assert_eq!(schema.stations.format, StationFormat::Json);
        assert_eq!(schema.stations.records_path.as_deref(), Some("data.stations"));

        let schema = legacy();
        assert_eq!(schema.id, "bluebikes_legacy");
        assert_eq!(schema.stations.format, StationFormat::Csv);
        assert!(schema.stations.records_path.is_none());
    }

    #[test]
    fn accepts_bare_string_field() {
        let schema = parse_schema_toml(
            r#"
            id = "tiny"
            name = "Tiny"

            [stations]
            format = "csv"

            [stations.fields]
            id = "code"
            longitude = "x"
            latitude = "y"

            [trips.fields]
            start_station_id = "from"
            end_station_id = "to"
            started_at = "start"
            ended_at = "end"
            "#,
        )
        .unwrap();
        assert_eq!(schema.stations.fields.id.names(), ["code"]);
        assert!(schema.stations.fields.name.is_empty());
        assert!(schema.description.is_none());
    }

    #[test]
    fn rejects_schema_without_columns() {
        let err = parse_schema_toml(
            r#"
            id = "broken"
            name = "Broken"

            [stations]
            format = "json"

            [stations.fields]
            id = []
            longitude = "lon"
            latitude = "lat"

            [trips.fields]
            start_station_id = "a"
            end_station_id = "b"
            started_at = "c"
            ended_at = "d"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("stations.fields.id"));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            parse_schema_toml("id = "),
            Err(SourceError::Schema { .. })
        ));
    }

    #[test]
    fn maps_short_name_and_number_keyed_stations_alike() {
        let from_gbfs = gbfs()
            .stations
            .station(&json!({
                "station_id": "a3a4c8d2",
                "short_name": "M32006",
                "name": "MIT at Mass Ave / Amherst St",
                "lat": 42.358_1,
                "lon": -71.093_2
            }))
            .unwrap();
        let from_legacy = legacy()
            .stations
            .station(&json!({
                "Number": "M32006",
                "Name": "MIT at Mass Ave / Amherst St",
                "Latitude": "42.3581",
                "Longitude": "-71.0932"
            }))
            .unwrap();
        assert_eq!(from_gbfs, from_legacy);
        assert_eq!(from_gbfs.id, "M32006");
    }

    #[test]
    fn falls_back_through_candidates() {
        let station = gbfs()
            .stations
            .station(&json!({"short_name": "", "station_id": 67, "lat": 42.36, "lon": -71.09}))
            .unwrap();
        assert_eq!(station.id, "67");
        assert_eq!(station.name, "67");
    }

    #[test]
    fn rejects_station_without_coordinates() {
        let schema = gbfs();
        let err = schema
            .stations
            .station(&json!({"short_name": "X1", "lat": 0.0, "lon": -71.09}))
            .unwrap_err();
        assert_eq!(err, RecordError::InvalidCoordinates { id: "X1".to_string() });

        let err = schema
            .stations
            .station(&json!({"lat": 42.36, "lon": -71.09}))
            .unwrap_err();
        assert_eq!(err, RecordError::MissingField { field: "id" });
    }

    #[test]
    fn finds_records_by_path() {
        let schema = gbfs();
        let document = json!({"data": {"stations": [{"short_name": "A"}, {"short_name": "B"}]}});
        assert_eq!(schema.stations.records(&document).unwrap().len(), 2);

        let err = schema.stations.records(&json!({"data": {}})).unwrap_err();
        assert!(err.to_string().contains("stations"));

        let err = schema.stations.records(&json!({"data": {"stations": 4}})).unwrap_err();
        assert!(matches!(err, SourceError::Schema { .. }));
    }

    #[test]
    fn maps_trip_columns() {
        let trip = gbfs()
            .trips
            .trip(&json!({
                "ride_id": "F1A2",
                "started_at": "2024-03-01 08:00:00",
                "ended_at": "2024-03-01 08:12:00",
                "start_station_id": "M32006",
                "end_station_id": "A32000"
            }))
            .unwrap();
        assert_eq!(trip.start_station_id, "M32006");
        assert_eq!(trip.end_station_id, "A32000");
        assert_eq!(trip.started_at, "2024-03-01 08:00:00");

        let legacy_trip = legacy()
            .trips
            .trip(&json!({
                "starttime": "2019-07-01 00:00:27.8",
                "stoptime": "2019-07-01 00:07:03.2",
                "start station id": 67,
                "end station id": 80
            }))
            .unwrap();
        assert_eq!(legacy_trip.start_station_id, "67");
        assert_eq!(legacy_trip.end_station_id, "80");
    }

    #[test]
    fn reports_missing_trip_field() {
        let err = gbfs()
            .trips
            .trip(&json!({
                "started_at": "2024-03-01 08:00:00",
                "ended_at": "",
                "start_station_id": "M32006",
                "end_station_id": "A32000"
            }))
            .unwrap_err();
        assert_eq!(err, RecordError::MissingField { field: "ended_at" });
        assert_eq!(err.to_string(), "missing ended_at");
    }
}
