//! Upload ingestion: turns raw file bytes into labelled price series.
//!
//! The parser is picked from the file extension only:
//! - `.csv`: header-driven, possibly multi-label (see [`parse_csv`])
//! - `.xls` / `.xlsx`: first worksheet, `date, price` columns (see
//!   [`parse_spreadsheet`])

mod cells;
mod delimited;
mod spreadsheet;

pub use delimited::parse_csv;
pub use cells::{date_from_serial, parse_date, parse_price};
pub use spreadsheet::parse_spreadsheet;

use log::debug;

use crate::core::SeriesSet;
use crate::error::{ForecastError, Result};

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Spreadsheet,
}

impl FileFormat {
    /// Detect the format from a file name, case-insensitively.
    pub fn from_filename(filename: &str) -> Result<Self> {
        let lower = filename.trim().to_lowercase();
        if lower.ends_with(".csv") {
            Ok(FileFormat::Csv)
        } else if lower.ends_with(".xls") || lower.ends_with(".xlsx") {
            Ok(FileFormat::Spreadsheet)
        } else {
            Err(ForecastError::UnsupportedFormat(filename.to_string()))
        }
    }
}

/// Parse an uploaded file. Every returned series is sorted by date.
pub fn parse_upload(bytes: &[u8], filename: &str) -> Result<SeriesSet> {
    let format = FileFormat::from_filename(filename)?;
    debug!("parsing {} ({} bytes) as {:?}", filename, bytes.len(), format);
    match format {
        FileFormat::Csv => parse_csv(bytes),
        FileFormat::Spreadsheet => parse_spreadsheet(bytes),
    }
}
