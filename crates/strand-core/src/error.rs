//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid navigation transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Host error: {0}")]
    Host(String),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}
