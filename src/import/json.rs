use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::Result;
use crate::import::{has_extension, SampleImporter};
use crate::models::HeartRateSample;

/// JSON importer
///
/// Accepts either a bare array of samples or a workout record carrying a
/// `heartRateData` array.
pub struct JsonSampleImporter;

#[derive(Deserialize)]
#[serde(untagged)]
enum SampleDocument {
    Samples(Vec<HeartRateSample>),
    #[serde(rename_all = "camelCase")]
    Record { heart_rate_data: Vec<HeartRateSample> },
}

impl JsonSampleImporter {
    pub fn read_samples<R: Read>(&self, source: R) -> Result<Vec<HeartRateSample>> {
        let document: SampleDocument = serde_json::from_reader(source)?;
        Ok(match document {
            SampleDocument::Samples(samples) => samples,
            SampleDocument::Record { heart_rate_data } => heart_rate_data,
        })
    }
}

impl SampleImporter for JsonSampleImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "json")
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<HeartRateSample>> {
        let file = File::open(file_path)?;
        self.read_samples(BufReader::new(file))
    }

    fn format_name(&self) -> &'static str {
        "JSON"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_array() {
        let data = r#"[
            {"heartRate": 128, "timestamp": "2024-03-01T07:00:00Z"},
            {"heartRate": null, "timestamp": "2024-03-01T07:00:05Z"}
        ]"#;
        let samples = JsonSampleImporter.read_samples(data.as_bytes()).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].heart_rate, Some(128));
        assert!(!samples[1].is_valid());
    }

    #[test]
    fn test_record_document() {
        let data = r#"{
            "id": "abc",
            "heartRateData": [{"heartRate": 150, "timestamp": "2024-03-01T07:00:00Z"}]
        }"#;
        let samples = JsonSampleImporter.read_samples(data.as_bytes()).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].heart_rate, Some(150));
    }

    #[test]
    fn test_malformed_json() {
        assert!(JsonSampleImporter.read_samples("{not json".as_bytes()).is_err());
    }
}
