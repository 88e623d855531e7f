//! CSV rows as JSON objects.
//!
//! Every row becomes a `serde_json::Value::Object` keyed by the trimmed
//! header names, with every value a trimmed string. Schemas then address CSV
//! and JSON inputs the same way.

use std::io::Read;

use crate::SourceError;

/// Streams the rows of a headed CSV file as JSON objects.
#[derive(Debug)]
pub struct CsvRecords<R> {
    reader: csv::Reader<R>,
    headers: Vec<String>,
    record: csv::StringRecord,
}

impl<R: Read> CsvRecords<R> {
    /// Reads the header row.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Csv`] if the header cannot be read, or
    /// [`SourceError::Schema`] if the file has no header row.
    pub fn new(reader: R) -> Result<Self, SourceError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_owned())
            .collect();

        if headers.iter().all(String::is_empty) {
            return Err(SourceError::Schema {
                message: "CSV file contains no header row".to_owned(),
            });
        }

        log::trace!("CSV headers: {headers:?}");

        Ok(Self {
            reader,
            headers,
            record: csv::StringRecord::new(),
        })
    }

    /// The header names, in column order.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Bytes consumed so far, for progress reporting.
    #[must_use]
    pub fn byte_position(&self) -> u64 {
        self.reader.position().byte()
    }
}

impl<R: Read> Iterator for CsvRecords<R> {
    type Item = Result<serde_json::Value, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.record) {
            Ok(false) => None,
            Ok(true) => {
                let mut map = serde_json::Map::new();
                for (i, header) in self.headers.iter().enumerate() {
                    let value = self.record.get(i).unwrap_or("").to_owned();
                    map.insert(header.clone(), serde_json::Value::String(value));
                }
                Some(Ok(serde_json::Value::Object(map)))
            }
            Err(e) => Some(Err(e.into())),
        }
    }
}
