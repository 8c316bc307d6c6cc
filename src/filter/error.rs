use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Invalid filters format")]
    InvalidFormat,

    #[error("Invalid id value: {0}")]
    InvalidId(String),

    #[error("Limit must be non-negative")]
    InvalidLimit,

    #[error("Offset must be non-negative")]
    InvalidOffset,
}
