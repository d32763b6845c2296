use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{ConfigError, FeedConfig};
use crate::data::table::DatedTable;
use crate::feed::{FeedError, FeedTimeline};

/// Reads CSV and Parquet files into date-keyed tables.
pub struct DataIngestor {
    date_column: String,
}

impl DataIngestor {
    pub fn new(date_column: impl Into<String>) -> Self {
        Self {
            date_column: date_column.into(),
        }
    }

    pub fn date_column(&self) -> &str {
        &self.date_column
    }

    /// Read a file, picking the reader from its extension.
    pub fn read(&self, path: &Path) -> Result<DatedTable, LoadError> {
        let frame = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => self.ingest_csv(path)?,
            Some(ext) if ext.eq_ignore_ascii_case("parquet") => self.ingest_parquet(path)?,
            _ => return Err(LoadError::UnsupportedFormat(path.to_path_buf())),
        };

        if frame.height() == 0 {
            warn!("{} contains no rows", path.display());
        }
        Ok(DatedTable::from_frame(&frame, &self.date_column)?)
    }

    /// Ingest CSV file
    pub fn ingest_csv(&self, path: &Path) -> Result<DataFrame, LoadError> {
        LazyCsvReader::new(path)
            .with_has_header(true)
            .with_try_parse_dates(true)
            .finish()
            .and_then(|lf| lf.collect())
            .map_err(|e| LoadError::IngestFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Ingest Parquet file
    pub fn ingest_parquet(&self, path: &Path) -> Result<DataFrame, LoadError> {
        LazyFrame::scan_parquet(path, Default::default())
            .and_then(|lf| lf.collect())
            .map_err(|e| LoadError::IngestFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }
}

impl Default for DataIngestor {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_DATE_COLUMN)
    }
}

/// Build a timeline from a feed config and load every source it lists.
///
/// Relative source paths resolve against `base_dir`.
pub fn load_feed(config: &FeedConfig, base_dir: &Path) -> Result<FeedTimeline, LoadError> {
    config.validate()?;
    let mut timeline = FeedTimeline::new(config.feed.start_date, config.feed.end_date)?;
    let ingestor = DataIngestor::new(config.feed.date_column.clone());

    for source in &config.daily {
        let path = base_dir.join(&source.path);
        let table = ingestor.read(&path)?;
        let rows = timeline.ingest_daily(&table, &source.symbol)?;
        info!("loaded {} daily rows for {} from {}", rows, source.symbol, path.display());
    }

    for source in &config.quarterly {
        let path = base_dir.join(&source.path);
        let table = ingestor.read(&path)?;
        let rows = timeline.add_quarterly_feed(&table, &source.symbol)?;
        info!("loaded {} quarterly rows for {} from {}", rows, source.symbol, path.display());
    }

    if config.feed.trim {
        timeline.trim_daily();
    }
    Ok(timeline)
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("ingest of {path} failed: {reason}")]
    IngestFailed { path: PathBuf, reason: String },

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
