use std::collections::TryReserveError;
use thiserror::Error;

/// Unified error type for exposition rendering.
#[derive(Error, Debug)]
pub enum ExpositionError {
    #[error("Buffer allocation failed: {0}")]
    Allocation(#[from] TryReserveError),

    #[error("Buffer capacity exceeded: {requested} bytes requested, max {max}")]
    CapacityExceeded { requested: usize, max: usize },

    #[error("Metric family enumeration failed after family #{family}: {source}")]
    Enumeration {
        family: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("Provider {provider} failed: {source}")]
    Provider {
        provider: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid metric: {0}")]
    InvalidMetric(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl ExpositionError {
    /// Pipeline stage the error belongs to, used as a log field.
    pub fn stage(&self) -> &'static str {
        match self {
            ExpositionError::Allocation(_) | ExpositionError::CapacityExceeded { .. } => "buffer",
            ExpositionError::Enumeration { .. } => "system_metrics",
            ExpositionError::Provider { .. } => "provider",
            ExpositionError::Io(_) => "flush",
            ExpositionError::InvalidMetric(_) => "model",
            ExpositionError::Config(_) => "config",
        }
    }
}
