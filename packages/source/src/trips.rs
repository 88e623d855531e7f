//! Trip export loading.
//!
//! Trip exports are CSV. Rows are mapped through the schema's trip fields
//! into [`RawTrip`]s; timestamp parsing is left to the bucketer so that
//! malformed timestamps are counted in one place.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use bike_map_trip_models::RawTrip;

use crate::SourceError;
use crate::csv_records::CsvRecords;
use crate::progress::ProgressCallback;
use crate::schema::TripSchema;

/// Rows between progress updates.
const PROGRESS_INTERVAL: u64 = 10_000;

/// Trips read from an export, plus how many rows were unusable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripBatch {
    /// Mapped trips in file order.
    pub trips: Vec<RawTrip>,
    /// Rows missing a station id or timestamp.
    pub skipped: u64,
}

/// Reads every row of a trip CSV through `schema`.
///
/// `progress` is driven in bytes; pass `total_bytes` when the input size is
/// known so it can show a percentage.
///
/// # Errors
///
/// Returns [`SourceError::Csv`] if the CSV is malformed. Rows that are
/// well-formed CSV but lack a mapped field are skipped, not errors.
pub fn read_trips<R: Read>(
    reader: R,
    schema: &TripSchema,
    total_bytes: Option<u64>,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<TripBatch, SourceError> {
    let mut rows = CsvRecords::new(reader)?;
    let mut batch = TripBatch::default();
    let mut seen: u64 = 0;

    if let Some(total) = total_bytes {
        progress.set_total(total);
    }
    progress.set_message("Reading trips".to_string());

    while let Some(row) = rows.next() {
        let row = row?;
        match schema.trip(&row) {
            Ok(trip) => batch.trips.push(trip),
            Err(e) => {
                log::trace!("Skipping trip row {}: {e}", seen + 1);
                batch.skipped += 1;
            }
        }

        seen += 1;
        if seen % PROGRESS_INTERVAL == 0 {
            progress.set_position(rows.byte_position());
        }
    }

    progress.set_position(rows.byte_position());
    progress.finish(format!("Read {} trips", batch.trips.len()));

    if batch.skipped > 0 {
        log::warn!("{} trip rows were missing required fields", batch.skipped);
    }
    log::info!(
        "Read {} trip rows ({} usable)",
        seen,
        batch.trips.len()
    );

    Ok(batch)
}

/// Opens `path` and reads it with [`read_trips`], sizing the progress bar
/// from the file length.
///
/// # Errors
///
/// Returns [`SourceError::Io`] if the file cannot be opened, plus any error
/// from [`read_trips`].
pub fn load_trips(
    path: &Path,
    schema: &TripSchema,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<TripBatch, SourceError> {
    log::debug!("Reading trips from {}", path.display());
    let file = File::open(path)?;
    let total = file.metadata().ok().map(|m| m.len());
    read_trips(BufReader::new(file), schema, total, progress)
}
