//! Delimited-text (CSV) price files.

use csv::{ReaderBuilder, StringRecord, Trim};
use log::debug;

use super::cells::{parse_date, parse_price, Column};
use crate::core::{Observation, SeriesSet, DEFAULT_LABEL};
use crate::error::{ForecastError, Result};

const BOM: char = '\u{feff}';

/// Column positions of the recognised schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// `spec, average_price, publish_date`; the spec column is optional.
    Labelled {
        spec: Option<usize>,
        price: usize,
        date: usize,
    },
    /// `date, price`
    Plain { date: usize, price: usize },
}

impl Layout {
    fn detect(headers: &[String]) -> Result<Self> {
        let average = Column::AVERAGE_PRICE.find(headers);
        let publish = Column::PUBLISH_DATE.find(headers);
        if let (Some(price), Some(date)) = (average, publish) {
            return Ok(Layout::Labelled {
                spec: Column::SPEC.find(headers),
                price,
                date,
            });
        }
        let date = Column::DATE.find(headers);
        let price = Column::PRICE.find(headers);
        if let (Some(date), Some(price)) = (date, price) {
            return Ok(Layout::Plain { date, price });
        }

        // Name the missing column of whichever schema the header leans to.
        let missing = if average.is_some() {
            Column::PUBLISH_DATE
        } else if publish.is_some() {
            Column::AVERAGE_PRICE
        } else if date.is_some() {
            Column::PRICE
        } else {
            Column::DATE
        };
        Err(ForecastError::UnrecognizedHeader {
            missing: missing.describe(),
        })
    }

    /// `(label, date text, price text)` for a data row, if the row is long
    /// enough.
    fn fields<'r>(&self, record: &'r StringRecord) -> Option<(&'r str, &'r str, &'r str)> {
        match *self {
            Layout::Labelled { spec, price, date } => {
                let label = spec
                    .and_then(|i| record.get(i))
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .unwrap_or(DEFAULT_LABEL);
                Some((label, record.get(date)?, record.get(price)?))
            }
            Layout::Plain { date, price } => {
                Some((DEFAULT_LABEL, record.get(date)?, record.get(price)?))
            }
        }
    }
}

/// Parse UTF-8 delimited text into labelled series.
///
/// The header must contain either `规格/平均价/发布日期` (English
/// `spec/average_price/publish_date`) or `日期/价格` (`date/price`), in any
/// order; other columns are ignored. Invalid UTF-8 is replaced rather than
/// rejected. Rows with an unreadable date or a missing, unparsable or
/// negative price are skipped.
pub fn parse_csv(bytes: &[u8]) -> Result<SeriesSet> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(bytes);

    let mut records = reader
        .byte_records()
        .map(|record| record.map(StringRecord::from_byte_record_lossy));
    let header = loop {
        match records.next() {
            None => return Err(ForecastError::MissingHeader),
            Some(record) => {
                let record = record?;
                if record.iter().any(|cell| !cell.trim().is_empty()) {
                    break record;
                }
            }
        }
    };
    let headers: Vec<String> = header
        .iter()
        .map(|h| h.trim_start_matches(BOM).trim().to_string())
        .collect();
    let layout = Layout::detect(&headers)?;
    debug!("csv header {:?} -> {:?}", headers, layout);

    let mut set = SeriesSet::new();
    let mut skipped = 0usize;
    for record in records {
        let record = record?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        let parsed = layout.fields(&record).and_then(|(label, date, price)| {
            Some((label, Observation::new(parse_date(date)?, parse_price(price)?)))
        });
        match parsed {
            Some((label, observation)) => set.push(label, observation),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("skipped {} unparsable csv rows", skipped);
    }
    if set.is_empty() {
        return Err(ForecastError::NoValidRows);
    }
    set.sort();
    Ok(set)
}
