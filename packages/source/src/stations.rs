//! Station list loading.

use std::borrow::Borrow;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use bike_map_trip_models::Station;

use crate::SourceError;
use crate::csv_records::CsvRecords;
use crate::schema::{StationFormat, StationSchema};

/// Reads and maps a station list in the schema's format.
///
/// Records without an id or usable coordinates are skipped with a warning.
///
/// # Errors
///
/// Returns [`SourceError`] if the input cannot be read or parsed, or if the
/// JSON document does not contain an array at the schema's records path.
pub fn read_stations<R: Read>(
    reader: R,
    schema: &StationSchema,
) -> Result<Vec<Station>, SourceError> {
    let (stations, skipped) = match schema.format {
        StationFormat::Json => {
            let document: serde_json::Value = serde_json::from_reader(reader)?;
            map_records(schema, schema.records(&document)?.iter().map(Ok))?
        }
        StationFormat::Csv => map_records(schema, CsvRecords::new(reader)?)?,
    };

    log::info!("Loaded {} stations ({skipped} skipped)", stations.len());

    Ok(stations)
}

/// Opens `path` and reads it with [`read_stations`].
///
/// # Errors
///
/// Returns [`SourceError::Io`] if the file cannot be opened, plus any error
/// from [`read_stations`].
pub fn load_stations(path: &Path, schema: &StationSchema) -> Result<Vec<Station>, SourceError> {
    log::debug!("Reading stations from {}", path.display());
    let file = File::open(path)?;
    read_stations(BufReader::new(file), schema)
}

fn map_records<I, V>(
    schema: &StationSchema,
    records: I,
) -> Result<(Vec<Station>, u64), SourceError>
where
    I: IntoIterator<Item = Result<V, SourceError>>,
    V: Borrow<serde_json::Value>,
{
    let mut stations = Vec::new();
    let mut skipped = 0;

    for record in records {
        match schema.station(record?.borrow()) {
            Ok(station) => stations.push(station),
            Err(e) => {
                log::warn!("Skipping station: {e}");
                skipped += 1;
            }
        }
    }

    Ok((stations, skipped))
}
