//! Excel workbooks (`.xls` / `.xlsx`).

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, DataType, Range, Reader};
use log::debug;

use super::cells::{date_from_serial, parse_date, parse_price, valid_price, Column};
use crate::core::{Observation, SeriesSet, DEFAULT_LABEL};
use crate::error::{ForecastError, Result};

/// Valid rows a workbook must yield.
const MIN_ROWS: usize = 2;

/// Leading used rows searched for a named header.
const HEADER_SCAN_ROWS: usize = 10;

/// Absolute sheet positions of the header row and the two data columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SheetLayout {
    header_row: u32,
    date_col: u32,
    price_col: u32,
}

impl SheetLayout {
    /// Header in row 1, dates in column A and prices in column B.
    const FIXED: SheetLayout = SheetLayout {
        header_row: 0,
        date_col: 0,
        price_col: 1,
    };

    /// Find a row naming a date and a price column; otherwise fall back to
    /// [`SheetLayout::FIXED`]. Positions are absolute, so blank leading
    /// rows or columns do not shift them.
    fn locate(range: &Range<DataType>) -> Self {
        let Some((top, left)) = range.start() else {
            return Self::FIXED;
        };
        for (offset, row) in range.rows().take(HEADER_SCAN_ROWS).enumerate() {
            let names: Vec<String> = row
                .iter()
                .map(|cell| match cell {
                    DataType::String(text) => text.trim().to_string(),
                    _ => String::new(),
                })
                .collect();
            let date = Column::DATE.find(&names).or_else(|| Column::PUBLISH_DATE.find(&names));
            let price = Column::PRICE.find(&names).or_else(|| Column::AVERAGE_PRICE.find(&names));
            if let (Some(date), Some(price)) = (date, price) {
                return Self {
                    header_row: top + offset as u32,
                    date_col: left + date as u32,
                    price_col: left + price as u32,
                };
            }
        }
        Self::FIXED
    }
}

/// Read the first worksheet as `date, price` rows under a header row.
///
/// The header is the first row naming a date and a price column (`日期`/
/// `价格` or their English or labelled-schema names); without one, row 1
/// is the header and columns A and B hold the data. Dates may be
/// date-formatted cells or text; prices may be numbers or text with
/// currency symbols. Every observation lands in the default series.
pub fn parse_spreadsheet(bytes: &[u8]) -> Result<SeriesSet> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ForecastError::Spreadsheet("workbook has no worksheets".to_string()))??;

    let Some((_, (bottom, _))) = range.start().zip(range.end()) else {
        return Err(ForecastError::MissingHeader);
    };
    if range.height() < 2 {
        return Err(ForecastError::NoValidRows);
    }
    let layout = SheetLayout::locate(&range);
    debug!("spreadsheet layout {:?}", layout);

    let mut set = SeriesSet::new();
    let mut accepted = 0usize;
    let mut skipped = 0usize;
    for row in layout.header_row + 1..=bottom {
        let date = range.get_value((row, layout.date_col)).and_then(cell_date);
        let price = range.get_value((row, layout.price_col)).and_then(cell_price);
        match date.zip(price) {
            Some((date, price)) => {
                set.push(DEFAULT_LABEL, Observation::new(date, price));
                accepted += 1;
            }
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("skipped {} unparsable spreadsheet rows", skipped);
    }
    if accepted < MIN_ROWS {
        return Err(ForecastError::InsufficientData {
            needed: MIN_ROWS,
            got: accepted,
        });
    }
    set.sort();
    Ok(set)
}

fn cell_date(cell: &DataType) -> Option<chrono::NaiveDate> {
    match cell {
        DataType::DateTime(serial) => date_from_serial(*serial),
        DataType::String(text) => parse_date(text),
        DataType::DateTimeIso(text) => parse_date(text.get(..10)?),
        _ => None,
    }
}

fn cell_price(cell: &DataType) -> Option<f64> {
    match cell {
        DataType::Float(v) => valid_price(*v),
        DataType::Int(v) => valid_price(*v as f64),
        DataType::String(text) => parse_price(text),
        _ => None,
    }
}
