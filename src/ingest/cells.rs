//! Date and price parsing for individual cells.

use chrono::{NaiveDate, NaiveDateTime};

/// Date-only layouts, tried in order.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y"];

/// Date-time layouts; the time part is discarded.
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
];

/// Characters removed from price text before parsing.
const PRICE_NOISE: [char; 6] = ['¥', '$', '€', '£', ',', '，'];

/// A header column, recognised by its Chinese or English name.
#[derive(Debug, Clone, Copy)]
pub(super) struct Column {
    zh: &'static str,
    en: &'static str,
}

impl Column {
    pub(super) const SPEC: Column = Column { zh: "规格", en: "spec" };
    pub(super) const AVERAGE_PRICE: Column = Column {
        zh: "平均价",
        en: "average_price",
    };
    pub(super) const PUBLISH_DATE: Column = Column {
        zh: "发布日期",
        en: "publish_date",
    };
    pub(super) const DATE: Column = Column { zh: "日期", en: "date" };
    pub(super) const PRICE: Column = Column { zh: "价格", en: "price" };

    pub(super) fn describe(&self) -> String {
        format!("{} ({})", self.en, self.zh)
    }

    /// Index of the first header cell naming this column. Exact matches
    /// win over matches with interior spaces removed.
    pub(super) fn find(&self, headers: &[String]) -> Option<usize> {
        let hit = |h: &str| h == self.zh || h == self.en;
        headers
            .iter()
            .position(|h| hit(h))
            .or_else(|| headers.iter().position(|h| hit(&h.replace(' ', ""))))
    }
}

/// Day zero of the spreadsheet serial date system.
fn serial_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

/// Parse a calendar day from text.
///
/// Accepts `yyyy-MM-dd` and `yyyy/MM/dd` (optionally followed by
/// `HH:mm[:ss]`), then `MM/dd/yyyy` and `dd/MM/yyyy`. Ambiguous slash
/// dates resolve month-first.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Convert a spreadsheet serial day number to a date.
pub fn date_from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let days = serial.trunc() as i64;
    serial_epoch()?.checked_add_signed(chrono::Duration::try_days(days)?)
}

/// Parse a price, ignoring currency symbols, thousands separators and
/// whitespace. Negative and non-finite values are rejected.
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && !PRICE_NOISE.contains(c))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().and_then(valid_price)
}

/// Accept a numeric price cell.
pub fn valid_price(value: f64) -> Option<f64> {
    (value.is_finite() && value >= 0.0).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_supported_date_layouts() {
        assert_eq!(parse_date("2024-03-05"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date(" 2024/03/05 "), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date("2024-03-05 14:30:00"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date("2024/03/05 08:15"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date("03/05/2024"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date("25/12/2024"), Some(ymd(2024, 12, 25)));
    }

    #[test]
    fn rejects_garbage_dates() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2024-13-40"), None);
    }

    #[test]
    fn serial_dates() {
        assert_eq!(date_from_serial(45292.0), Some(ymd(2024, 1, 1)));
        assert_eq!(date_from_serial(45292.75), Some(ymd(2024, 1, 1)));
        assert_eq!(date_from_serial(-1.0), None);
    }

    #[test]
    fn prices_strip_currency_and_separators() {
        assert_eq!(parse_price("¥1,234.50"), Some(1234.5));
        assert_eq!(parse_price(" 3，200 "), Some(3200.0));
        assert_eq!(parse_price("$ 12"), Some(12.0));
        assert_eq!(parse_price("-5"), None);
        assert_eq!(parse_price("n/a"), None);
        assert_eq!(parse_price(""), None);
    }
}
