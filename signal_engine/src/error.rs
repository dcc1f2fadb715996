use thiserror::Error;

/// Misuse of the indicator functions themselves. Degenerate data (flat
/// windows, short history) is not an error; it yields `None`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IndicatorError {
    #[error("Array length mismatch: high={high}, low={low}, close={close}")]
    LengthMismatch { high: usize, low: usize, close: usize },
}

/// Why one instrument produced no analysis. Never fatal for a batch.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    /// Too little history for the longest indicator window.
    #[error("insufficient data: need {required} bars, have {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// ATR is undefined or not positive, so no risk levels can exist.
    #[error("unclassifiable snapshot: {reason}")]
    Unclassifiable { reason: String },

    #[error(transparent)]
    Indicator(#[from] IndicatorError),
}
