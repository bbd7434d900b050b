use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlotForgeError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    /// Degenerate working hours or invalid engine settings. Fatal before any generation runs.
    #[error("Configuration Error: {0}")]
    Configuration(String),

    /// Nothing to schedule with: no teachers, rooms or courses survived filtering.
    #[error("Insufficient Data: {0}")]
    InsufficientData(String),

    #[error("Data Validation Error: {0}")]
    Validation(String),
}

pub type SfResult<T> = Result<T, SlotForgeError>;
