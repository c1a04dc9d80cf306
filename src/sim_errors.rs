use thiserror::Error;

/// Error kinds raised while configuring or running a simulation.
///
/// The first three variants are the engine taxonomy; the remaining ones are only
/// produced by the I/O helpers ([`crate::export`], parameter file loading).
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Integration failure: {0}")]
    IntegrationFailure(String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Payload-free tag of a [`SimulationError`], cheap to copy into results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    InvalidParameter,
    ConfigurationError,
    IntegrationFailure,
    Io,
}

impl SimulationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SimulationError::InvalidParameter(_) => ErrorKind::InvalidParameter,
            SimulationError::ConfigurationError(_) => ErrorKind::ConfigurationError,
            SimulationError::IntegrationFailure(_) => ErrorKind::IntegrationFailure,
            SimulationError::IoError(_)
            | SimulationError::CsvError(_)
            | SimulationError::JsonError(_) => ErrorKind::Io,
        }
    }
}

impl PartialEq for SimulationError {
    fn eq(&self, other: &Self) -> bool {
        use SimulationError::*;
        match (self, other) {
            (InvalidParameter(a), InvalidParameter(b)) => a == b,
            (ConfigurationError(a), ConfigurationError(b)) => a == b,
            (IntegrationFailure(a), IntegrationFailure(b)) => a == b,

            // not comparable: same variant is enough
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,
            (JsonError(_), JsonError(_)) => true,

            _ => false,
        }
    }
}
