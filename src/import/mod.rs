use crate::error::{EffortError, ImportError, Result};
use crate::models::HeartRateSample;
use std::path::Path;

pub mod csv;
pub mod json;

/// Trait for loading heart-rate samples from different file formats
pub trait SampleImporter {
    /// Check if this importer can handle the given file
    fn can_import(&self, file_path: &Path) -> bool;

    /// Load the samples in recording order
    fn import_file(&self, file_path: &Path) -> Result<Vec<HeartRateSample>>;

    /// Get the format name for this importer
    fn format_name(&self) -> &'static str;
}

/// Picks an importer for a file by its extension
pub struct ImportManager {
    importers: Vec<Box<dyn SampleImporter>>,
}

impl ImportManager {
    pub fn new() -> Self {
        let importers: Vec<Box<dyn SampleImporter>> = vec![
            Box::new(csv::CsvSampleImporter::new()),
            Box::new(json::JsonSampleImporter),
        ];

        Self { importers }
    }

    /// Import a single file, auto-detecting the format
    pub fn import_file(&self, file_path: &Path) -> Result<Vec<HeartRateSample>> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound {
                path: file_path.to_path_buf(),
            }
            .into());
        }

        let importer = self
            .importers
            .iter()
            .find(|importer| importer.can_import(file_path))
            .ok_or_else(|| {
                EffortError::from(ImportError::UnsupportedFormat {
                    format: file_path
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .unwrap_or("<none>")
                        .to_string(),
                })
            })?;

        tracing::info!(
            file = %file_path.display(),
            format = importer.format_name(),
            "Importing heart-rate samples"
        );

        let samples = importer.import_file(file_path)?;
        let missing = samples.iter().filter(|s| !s.is_valid()).count();
        tracing::debug!(samples = samples.len(), missing, "Import finished");

        Ok(samples)
    }
}

impl Default for ImportManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Case-insensitive extension check shared by the importers
pub(crate) fn has_extension(file_path: &Path, expected: &str) -> bool {
    file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(expected))
        .unwrap_or(false)
}
