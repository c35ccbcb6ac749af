//! CSV bar source.

use bracket_core::error::DataError;
use bracket_core::types::Bar;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// CSV record format.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "Date", alias = "timestamp", alias = "Timestamp", alias = "time", alias = "Datetime")]
    date: String,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume", default)]
    volume: f64,
}

/// Bars must be strictly increasing in time.
pub fn validate_order(bars: &[Bar]) -> Result<(), DataError> {
    for (index, pair) in bars.windows(2).enumerate() {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(DataError::OutOfOrder {
                index: index + 1,
                previous: pair[0].timestamp,
                timestamp: pair[1].timestamp,
            });
        }
    }
    Ok(())
}

/// Historical bars from a CSV file with a header row.
pub struct CsvBarSource {
    path: PathBuf,
}

impl CsvBarSource {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::NoDataAvailable(path.display().to_string()));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all bars, rejecting files that are not in time order.
    pub fn load(&self) -> Result<Vec<Bar>, DataError> {
        let bars = self.read_file()?;
        validate_order(&bars)?;
        info!(path = %self.path.display(), bars = bars.len(), "Loaded bars");
        Ok(bars)
    }

    /// Load all bars and sort them by timestamp.
    pub fn load_sorted(&self) -> Result<Vec<Bar>, DataError> {
        let mut bars = self.read_file()?;
        bars.sort_by_key(|b| b.timestamp);
        bars.dedup_by_key(|b| b.timestamp);
        info!(path = %self.path.display(), bars = bars.len(), "Loaded bars (sorted)");
        Ok(bars)
    }

    fn read_file(&self) -> Result<Vec<Bar>, DataError> {
        let file = std::fs::File::open(&self.path)
            .map_err(|e| DataError::NoDataAvailable(format!("{}: {e}", self.path.display())))?;
        Self::parse(file)
    }

    /// Parse bars from any CSV reader, keeping row order.
    pub fn parse(reader: impl Read) -> Result<Vec<Bar>, DataError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut bars = Vec::new();
        for (row, result) in reader.deserialize().enumerate() {
            let record: CsvRecord =
                result.map_err(|e| DataError::ParseError(format!("row {}: {e}", row + 1)))?;
            let timestamp = parse_timestamp(&record.date)?;
            bars.push(Bar::new(
                timestamp,
                record.open,
                record.high,
                record.low,
                record.close,
                record.volume,
            ));
        }

        if bars.is_empty() {
            return Err(DataError::NoDataAvailable("no rows in CSV input".to_string()));
        }
        debug!(rows = bars.len(), "Parsed CSV bars");
        Ok(bars)
    }
}

/// Parse the date formats seen in exported price files into unix ms.
fn parse_timestamp(date_str: &str) -> Result<i64, DataError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Ok(dt.timestamp_millis());
    }

    const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }

    const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];
    for format in DATE_FORMATS {
        if let Some(dt) = NaiveDate::parse_from_str(date_str, format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }

    // Unix timestamp, milliseconds when it has more than 10 digits
    if let Ok(ts) = date_str.parse::<i64>() {
        return Ok(if ts > 10_000_000_000 { ts } else { ts * 1000 });
    }

    Err(DataError::ParseError(format!(
        "Could not parse date: {}",
        date_str
    )))
}
