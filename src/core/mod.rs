//! Core data structures for price series forecasting.

mod forecast;
mod observation;
mod resample;
mod training;

pub use forecast::Forecast;
pub use observation::{sort_by_date, Observation, SeriesSet, DEFAULT_LABEL};
pub use resample::{aggregate_daily, fill_missing_days};
pub use training::{TrainingPoint, TrainingSeries};
