// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while loading parameters or running a simulation.
///
/// Configuration errors abort construction of a simulator. Variable and
/// distribution errors abort the call that hit them (a whole aggregate run,
/// never just one period). Copula unavailability is not an error at all, see
/// [`crate::sampling::copula::CopulaCapability`].
#[derive(Debug, Error)]
pub enum SimError {
    #[error("parameter document not found at {}", path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("parameter document {} is malformed: {reason}", path.display())]
    ConfigMalformed { path: PathBuf, reason: String },

    #[error("no distribution parameters for variable '{0}'")]
    UnknownVariable(String),

    #[error("unsupported distribution: {0}")]
    UnsupportedDistribution(String),

    #[error("invalid parameters for {family}: {reason}")]
    InvalidParameters { family: String, reason: String },

    #[error("invalid copula specification: {0}")]
    InvalidCopula(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
