//! Middleware error type

use std::error::Error as StdError;

use thiserror::Error;

/// Error passed along a continuation to abort the rest of a chain.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct MiddlewareError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl MiddlewareError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error, keeping it reachable through `source()`.
    pub fn from_source<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
