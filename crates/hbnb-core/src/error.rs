//! Error types for HBnB

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HbnbError>;

#[derive(Error, Debug)]
pub enum HbnbError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Corrupt store: {0}")]
    LoadCorruption(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Password hashing error: {0}")]
    Hashing(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl HbnbError {
    /// Wrap a payload decoding failure as a caller error
    pub fn invalid_payload(e: serde_json::Error) -> Self {
        HbnbError::Validation(e.to_string())
    }
}

impl From<serde_json::Error> for HbnbError {
    fn from(e: serde_json::Error) -> Self {
        HbnbError::Serialization(e.to_string())
    }
}
