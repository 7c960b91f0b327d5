//! Dated price observations and labelled series.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Label used when an upload carries no variety column.
pub const DEFAULT_LABEL: &str = "default";

/// A single dated price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub price: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

/// Sort observations ascending by date. The sort is stable, so duplicate
/// dates keep their input order.
pub fn sort_by_date(observations: &mut [Observation]) {
    observations.sort_by_key(|o| o.date);
}

/// Price series keyed by variety label.
///
/// Labels iterate in lexicographic order; the first label is the primary
/// series of an upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesSet {
    series: BTreeMap<String, Vec<Observation>>,
}

impl SeriesSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observation to the series for `label`.
    pub fn push(&mut self, label: impl Into<String>, observation: Observation) {
        self.series.entry(label.into()).or_default().push(observation);
    }

    /// Sort every series ascending by date.
    pub fn sort(&mut self) {
        for observations in self.series.values_mut() {
            sort_by_date(observations);
        }
    }

    pub fn get(&self, label: &str) -> Option<&[Observation]> {
        self.series.get(label).map(|v| v.as_slice())
    }

    pub fn labels(&self) -> Vec<String> {
        self.series.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Observation])> {
        self.series.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of labelled series.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.values().all(|v| v.is_empty())
    }

    /// Total observations across all labels.
    pub fn total_records(&self) -> usize {
        self.series.values().map(|v| v.len()).sum()
    }

    /// The default-label series if present, else the first label.
    pub fn primary(&self) -> Option<(&str, &[Observation])> {
        if let Some((k, v)) = self.series.get_key_value(DEFAULT_LABEL) {
            return Some((k.as_str(), v.as_slice()));
        }
        self.iter().next()
    }
}
