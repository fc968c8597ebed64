// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GrainflowError {
    #[error("Out of capacity: {0}")]
    OutOfCapacity(String),

    #[error("Out of grains: {0}")]
    OutOfGrains(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Invalid grain state: {0}")]
    InvalidGrainState(String),

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Graph error: {0}")]
    GraphError(String),

    #[error("Timed out after {ticks} ticks waiting for {what}")]
    Timeout { what: String, ticks: u64 },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, GrainflowError>;

/// Return `err` unless `cond` holds.
pub(crate) fn check(cond: bool, err: impl FnOnce() -> GrainflowError) -> Result<()> {
    if cond { Ok(()) } else { Err(err()) }
}
