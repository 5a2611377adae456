//! DOM layer error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomError {
    #[error("Core error: {0}")]
    Core(#[from] strand_core::CoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Binding error: {0}")]
    Binding(String),
}
