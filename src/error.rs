use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("No such series for product '{product_id}' in market '{market}': {details}")]
    NoSuchSeries {
        product_id: String,
        market: String,
        details: String,
    },

    #[error("Insufficient history: need at least {required} distinct periods, got {actual}")]
    InsufficientHistory { required: usize, actual: usize },

    #[error("No baseline: the history contains no observations")]
    NoBaseline,

    #[error("Degenerate baseline: trailing mean revenue is exactly zero over {window} periods")]
    DegenerateBaseline { window: usize },

    #[error("Incomplete forecast: expected {expected} future periods, got {actual}")]
    IncompleteForecast { expected: usize, actual: usize },

    #[error("Invalid forecast horizon {0}: must be at least 1")]
    InvalidHorizon(usize),

    #[error("Invalid threshold {name} = {value}: must be finite and non-negative")]
    InvalidThreshold { name: String, value: f64 },

    #[error("Invalid model parameter: {0}")]
    InvalidParameter(String),

    #[error("Missing required column '{0}' in transaction data")]
    MissingColumn(String),

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ForecastError>;
