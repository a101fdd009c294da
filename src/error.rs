//! Error types.
//!
//! - `RiskError`: the typed taxonomy returned by every library stage. Callers
//!   (the presentation layer, the CLI) match on it to build their own messages.
//! - `AppError`: what the `jeonse` binary reports, carrying a process exit code.
//!
//! Exit codes:
//! - `2`: invalid input, configuration, or reference data
//! - `3`: the reference data has nothing for the requested parcel/area
//! - `4`: numerical failure

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::ParcelKey;

/// Result alias used throughout the library.
pub type RiskResult<T> = Result<T, RiskError>;

#[derive(Debug, Clone, Error)]
pub enum RiskError {
    #[error("invalid lot number '{raw}': cannot build a parcel key")]
    InvalidParcel { raw: String },

    #[error("no trade history for parcel {parcel}")]
    NoTradeHistory { parcel: ParcelKey },

    #[error("no location record for parcel {parcel}")]
    NoLocation { parcel: ParcelKey },

    #[error("no lease events with complete coordinates and Moran's I")]
    NoSpatialData,

    #[error("contract term must be > 0 years (got {term})")]
    InvalidTerm { term: f64 },

    #[error("volatility must be > 0 (got {sigma})")]
    InvalidVolatility { sigma: f64 },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid model artifact '{artifact}': {message}")]
    Artifact { artifact: String, message: String },

    #[error("failed to read '{}': {message}", path.display())]
    Data { path: PathBuf, message: String },

    #[error("non-finite value in {0}")]
    NonFinite(&'static str),
}

impl RiskError {
    pub fn artifact(artifact: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Artifact {
            artifact: artifact.into(),
            message: message.into(),
        }
    }

    pub fn data(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::Data {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Exit code used when this error terminates the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            RiskError::NoTradeHistory { .. } | RiskError::NoLocation { .. } | RiskError::NoSpatialData => 3,
            RiskError::NonFinite(_) => 4,
            RiskError::InvalidParcel { .. }
            | RiskError::InvalidTerm { .. }
            | RiskError::InvalidVolatility { .. }
            | RiskError::InvalidInput(_)
            | RiskError::Artifact { .. }
            | RiskError::Data { .. } => 2,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<RiskError> for AppError {
    fn from(err: RiskError) -> Self {
        Self::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_reference_data_maps_to_exit_code_3() {
        let parcel = ParcelKey::from_lot("366-50", "1150010300").unwrap();
        let app: AppError = RiskError::NoTradeHistory { parcel }.into();
        assert_eq!(app.exit_code(), 3);
        assert!(app.to_string().contains("115001030010366"));
    }

    #[test]
    fn invalid_term_maps_to_exit_code_2() {
        let app: AppError = RiskError::InvalidTerm { term: 0.0 }.into();
        assert_eq!(app.exit_code(), 2);
    }
}
