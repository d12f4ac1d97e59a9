use chrono::{DateTime, NaiveDateTime, Utc};
use csv::{ReaderBuilder, Trim};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{ImportError, Result};
use crate::import::{has_extension, SampleImporter};
use crate::models::HeartRateSample;

const FORMAT: &str = "CSV";

/// CSV importer with flexible column naming
///
/// Expects a `timestamp` and a `heart_rate` column (common aliases accepted).
/// Blank, `null`, non-numeric and zero heart-rate cells become missing samples.
pub struct CsvSampleImporter {
    column_mapping: HashMap<String, &'static str>,
}

impl CsvSampleImporter {
    pub fn new() -> Self {
        let mut column_mapping = HashMap::new();

        Self::add_mapping(
            &mut column_mapping,
            "timestamp",
            &["timestamp", "time", "datetime", "date_time", "recorded_at"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "heart_rate",
            &["heart_rate", "heartrate", "hr", "bpm"],
        );

        Self { column_mapping }
    }

    fn add_mapping(
        mapping: &mut HashMap<String, &'static str>,
        standard: &'static str,
        variations: &[&str],
    ) {
        for variation in variations {
            mapping.insert(variation.to_lowercase(), standard);
        }
    }

    fn normalize_column_name(&self, name: &str) -> Option<&'static str> {
        let normalized = name.trim().to_lowercase().replace([' ', '-'], "_");
        self.column_mapping.get(&normalized).copied()
    }

    /// Read samples from any CSV source
    pub fn read_samples<R: Read>(&self, source: R) -> Result<Vec<HeartRateSample>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(source);

        let headers = reader.headers().map_err(|e| parse_error(0, e))?.clone();
        let column = |standard: &str| {
            headers
                .iter()
                .position(|header| self.normalize_column_name(header) == Some(standard))
                .ok_or_else(|| ImportError::MissingColumn {
                    column: standard.to_string(),
                })
        };
        let timestamp_idx = column("timestamp")?;
        let heart_rate_idx = column("heart_rate")?;

        let mut samples = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let record_number = row + 1;
            let record = result.map_err(|e| parse_error(record_number, e))?;

            let timestamp_field = record.get(timestamp_idx).unwrap_or_default();
            let timestamp = parse_datetime(timestamp_field).ok_or_else(|| {
                parse_error(
                    record_number,
                    format!("unable to parse timestamp '{}'", timestamp_field),
                )
            })?;

            let heart_rate = parse_heart_rate(record.get(heart_rate_idx).unwrap_or_default());
            if heart_rate.is_none() {
                tracing::trace!(record = record_number, "Missing heart-rate reading");
            }

            samples.push(HeartRateSample {
                heart_rate,
                timestamp,
            });
        }

        Ok(samples)
    }
}

impl Default for CsvSampleImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleImporter for CsvSampleImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "csv")
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<HeartRateSample>> {
        let file = File::open(file_path)?;
        self.read_samples(file)
    }

    fn format_name(&self) -> &'static str {
        FORMAT
    }
}

fn parse_error(record: usize, reason: impl ToString) -> ImportError {
    ImportError::ParseError {
        format: FORMAT.to_string(),
        record,
        reason: reason.to_string(),
    }
}

/// `None` for anything that is not a positive bpm value
fn parse_heart_rate(field: &str) -> Option<u16> {
    match field.parse::<u16>() {
        Ok(0) | Err(_) => None,
        Ok(bpm) => Some(bpm),
    }
}

fn parse_datetime(date_str: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Some(dt.with_timezone(&Utc));
    }

    let formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
    ];

    for format in &formats {
        if let Ok(naive_dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return Some(DateTime::from_naive_utc_and_offset(naive_dt, Utc));
        }
    }

    // Seconds since epoch
    date_str
        .parse::<i64>()
        .ok()
        .and_then(|timestamp| DateTime::from_timestamp(timestamp, 0))
}
