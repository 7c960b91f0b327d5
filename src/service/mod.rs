//! Forecast service: upload storage, request handling and wire records.

mod cache;
mod config;
mod orchestrator;
mod response;

pub use cache::{InMemoryUploadCache, UploadCache};
pub use config::ServiceConfig;
pub use orchestrator::ForecastService;
pub use response::{
    CalculationDetails, ModelMetrics, PredictRequest, PredictionResult, PredictionStep,
    PreprocessingDetails, PricePoint, SelectionDetails, SeriesPrediction, Trend, UploadSummary,
    FLAT_SLOPE,
};
