//! Error types for the harvest-forecast engine.

use thiserror::Error;

/// Result type alias for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Broad classification of a [`ForecastError`], used by callers to pick a
/// response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input from the caller; not retried.
    Validation,
    /// The referenced upload is unknown or has expired.
    NotFound,
    /// Fit state, numerical failure or misuse of the model API inside the
    /// engine.
    Internal,
}

/// Errors that can occur during ingestion and forecasting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),

    /// Upload file name has no supported extension.
    #[error("unsupported file format: {0} (expected .csv, .xls or .xlsx)")]
    UnsupportedFormat(String),

    /// The file has no header row.
    #[error("file is empty or has no header row")]
    MissingHeader,

    /// The header row matches neither recognized schema.
    #[error("unrecognized header: missing column {missing}")]
    UnrecognizedHeader { missing: String },

    /// Parsing finished without a single usable row.
    #[error("no valid rows found in file")]
    NoValidRows,

    /// Spreadsheet container could not be read.
    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    /// Delimited text could not be read.
    #[error("csv error: {0}")]
    Csv(String),

    /// Requested model type is not known.
    #[error("unsupported model type: {0}")]
    UnsupportedModel(String),

    /// Forecast horizon outside the accepted range.
    #[error("horizon must be between {min} and {max} (got {got})")]
    HorizonOutOfRange { got: usize, min: usize, max: usize },

    /// Upload id unknown or evicted.
    #[error("data not found or expired: {0}")]
    UploadNotFound(String),
}

impl ForecastError {
    /// Classify the error for the calling layer.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForecastError::UploadNotFound(_) => ErrorKind::NotFound,
            // Uploads report bad content through the ingest variants; these
            // only arise from calls between engine components.
            ForecastError::EmptyData
            | ForecastError::InvalidParameter(_)
            | ForecastError::FitRequired
            | ForecastError::ComputationError(_) => ErrorKind::Internal,
            _ => ErrorKind::Validation,
        }
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::Csv(err.to_string())
    }
}

impl From<calamine::Error> for ForecastError {
    fn from(err: calamine::Error) -> Self {
        ForecastError::Spreadsheet(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = ForecastError::EmptyData;
        assert_eq!(err.to_string(), "empty input data");

        let err = ForecastError::InsufficientData { needed: 2, got: 1 };
        assert_eq!(err.to_string(), "insufficient data: need at least 2, got 1");

        let err = ForecastError::HorizonOutOfRange {
            got: 200,
            min: 1,
            max: 90,
        };
        assert_eq!(
            err.to_string(),
            "horizon must be between 1 and 90 (got 200)"
        );

        let err = ForecastError::UnrecognizedHeader {
            missing: "price (价格)".to_string(),
        };
        assert!(err.to_string().contains("价格"));

        let err = ForecastError::UploadNotFound("abc".to_string());
        assert_eq!(err.to_string(), "data not found or expired: abc");
    }

    #[test]
    fn errors_are_classified() {
        assert_eq!(ForecastError::NoValidRows.kind(), ErrorKind::Validation);
        assert_eq!(
            ForecastError::UnsupportedFormat("a.txt".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            ForecastError::UploadNotFound("x".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(ForecastError::FitRequired.kind(), ErrorKind::Internal);
    }

    #[test]
    fn internal_faults_are_not_user_errors() {
        assert_eq!(ForecastError::EmptyData.kind(), ErrorKind::Internal);
        assert_eq!(
            ForecastError::InvalidParameter("alpha".into()).kind(),
            ErrorKind::Internal
        );
        let err = crate::utils::calculate_metrics(&[1.0, 2.0], &[1.0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(
            ForecastError::InsufficientData { needed: 2, got: 1 }.kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = ForecastError::MissingHeader;
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }
}
