//! Day-offset training series derived from observations.

use chrono::NaiveDate;

use super::observation::Observation;
use crate::error::{ForecastError, Result};

/// A training point: `x` is the day offset from the series' first date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingPoint {
    pub x: f64,
    pub y: f64,
}

/// Training data handed to a [`Forecaster`](crate::models::Forecaster).
///
/// Day offsets are relative to `origin` and only meaningful within one
/// series.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSeries {
    origin: NaiveDate,
    x: Vec<f64>,
    y: Vec<f64>,
}

impl TrainingSeries {
    /// Build from date-sorted observations.
    pub fn from_observations(observations: &[Observation]) -> Result<Self> {
        let first = observations.first().ok_or(ForecastError::EmptyData)?;
        let origin = first.date;
        let x = observations
            .iter()
            .map(|o| (o.date - origin).num_days() as f64)
            .collect();
        let y = observations.iter().map(|o| o.price).collect();
        Ok(Self { origin, x, y })
    }

    /// Build from evenly spaced values, one day apart.
    pub fn from_values(origin: NaiveDate, values: Vec<f64>) -> Self {
        let x = (0..values.len()).map(|i| i as f64).collect();
        Self {
            origin,
            x,
            y: values,
        }
    }

    /// First `len` points of this series.
    pub fn head(&self, len: usize) -> Self {
        let len = len.min(self.y.len());
        Self {
            origin: self.origin,
            x: self.x[..len].to_vec(),
            y: self.y[..len].to_vec(),
        }
    }

    pub fn origin(&self) -> NaiveDate {
        self.origin
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Prices, oldest first.
    pub fn values(&self) -> &[f64] {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    pub fn last_x(&self) -> f64 {
        self.x.last().copied().unwrap_or(0.0)
    }

    pub fn points(&self) -> impl Iterator<Item = TrainingPoint> + '_ {
        self.x
            .iter()
            .zip(self.y.iter())
            .map(|(&x, &y)| TrainingPoint { x, y })
    }

    /// Reject series shorter than `needed`.
    pub fn require(&self, needed: usize) -> Result<()> {
        if self.y.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: self.y.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_count_calendar_days() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let obs = vec![
            Observation::new(d(1), 10.0),
            Observation::new(d(3), 11.0),
            Observation::new(d(3), 12.0),
            Observation::new(d(10), 13.0),
        ];
        let series = TrainingSeries::from_observations(&obs).unwrap();
        assert_eq!(series.x(), &[0.0, 2.0, 2.0, 9.0]);
        assert_eq!(series.values(), &[10.0, 11.0, 12.0, 13.0]);
        assert_eq!(series.last_x(), 9.0);
        assert_eq!(series.origin(), d(1));
    }

    #[test]
    fn empty_observations_are_rejected() {
        assert_eq!(
            TrainingSeries::from_observations(&[]),
            Err(ForecastError::EmptyData)
        );
    }

    #[test]
    fn require_reports_shortfall() {
        let origin = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let series = TrainingSeries::from_values(origin, vec![1.0]);
        assert_eq!(
            series.require(2),
            Err(ForecastError::InsufficientData { needed: 2, got: 1 })
        );
        assert!(series.head(5).require(1).is_ok());
    }
}
