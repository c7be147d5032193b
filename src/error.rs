//! Error types for mavstore
//!
//! Absence of a key is not an error: lookups return `Option`. The only
//! validated-input failure is an invalid capacity or configuration value.

use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Main error type for store operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// A capacity or configuration value is out of range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl StoreError {
    pub(crate) fn zero_capacity(what: &str) -> Self {
        StoreError::InvalidArgument(format!("{} must be > 0", what))
    }
}
