// Input validation errors - rejected before any model work begins
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("period_unit must be 'week' or 'month', got '{0}'")]
    InvalidPeriodUnit(String),

    #[error("max_periods must be between 1 and {limit}, got {value}")]
    PeriodsOutOfRange { value: u32, limit: u32 },

    #[error("only image files can be uploaded (content type: {0})")]
    NotAnImage(String),

    #[error("file size must be at most {limit} bytes, got {size}")]
    FileTooLarge { size: usize, limit: usize },

    #[error("unsupported file extension; allowed: {0}")]
    UnsupportedExtension(String),

    #[error("missing form field '{0}'")]
    MissingField(&'static str),

    #[error("uploaded file is empty")]
    EmptyFile,

    #[error("invalid value for '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },
}
