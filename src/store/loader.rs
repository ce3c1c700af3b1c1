//! Sample file loading and store snapshots
//!
//! Accepts either a JSON array of samples or JSON-lines (one sample per
//! line, blank lines and `#` comments skipped). Snapshots are written as a
//! pretty JSON array, so a snapshot is itself a valid samples file.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use super::{IngestReport, MetricSeriesStore};
use crate::types::MetricSample;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error ({}): {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error ({}, line {line}): {source}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A parsed sample with its 1-based source line (`None` inside a JSON array).
type LocatedSample = (Option<usize>, MetricSample);

/// Read samples from a JSON array or JSON-lines file.
///
/// Parse errors carry the 1-based line number of the offending record.
pub fn load_samples_file(path: &Path) -> Result<Vec<MetricSample>, StoreError> {
    Ok(read_located(path)?
        .into_iter()
        .map(|(_, sample)| sample)
        .collect())
}

fn read_located(path: &Path) -> Result<Vec<LocatedSample>, StoreError> {
    let contents = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_samples(&contents).map_err(|(line, source)| StoreError::Parse {
        path: path.to_path_buf(),
        line,
        source,
    })
}

fn parse_samples(contents: &str) -> Result<Vec<LocatedSample>, (usize, serde_json::Error)> {
    if contents.trim_start().starts_with('[') {
        let samples: Vec<MetricSample> =
            serde_json::from_str(contents).map_err(|e| (e.line(), e))?;
        return Ok(samples.into_iter().map(|s| (None, s)).collect());
    }

    let mut samples = Vec::new();
    for (i, line) in contents.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let sample = serde_json::from_str(trimmed).map_err(|e| (i + 1, e))?;
        samples.push((Some(i + 1), sample));
    }
    Ok(samples)
}

impl MetricSeriesStore {
    /// Build a store from a samples file, returning the ingestion report.
    ///
    /// Samples from a JSON-lines file are reported with their source line.
    pub fn from_samples_file(path: &Path) -> Result<(Self, IngestReport), StoreError> {
        let samples = read_located(path)?;
        let mut store = Self::new();
        let report = store.ingest_located(samples);
        info!(
            path = %path.display(),
            accepted = report.accepted,
            rejected = report.rejected.len(),
            "Loaded metric samples"
        );
        Ok((store, report))
    }

    /// Write every recorded sample to `path` as a JSON array.
    pub fn save_snapshot(&self, path: &Path) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.samples())?;
        std::fs::write(path, json).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), samples = self.len(), "Store snapshot saved");
        Ok(())
    }
}
