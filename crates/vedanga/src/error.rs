use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::cache::CacheError;
use crate::ephemeris::EphemerisError;

/// Errors surfaced by the analysis engines and the orchestrator.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("invalid input `{field}`: {message}")]
    InvalidInput { field: String, message: String },
    #[error("{engine} calculation failed: {message} [{context}]")]
    Calculation {
        engine: String,
        context: String,
        message: String,
    },
    #[error("ephemeris provider failed: {0}")]
    Ephemeris(#[from] EphemerisError),
    #[error("cache unavailable: {0}")]
    Cache(#[from] CacheError),
    #[error("analysis exceeded its deadline during the {stage} stage")]
    Timeout { stage: &'static str },
}

/// Structured, serializable form of an [`AnalysisError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: String,
    pub message: String,
    pub remediation: String,
}

impl AnalysisError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn calculation(
        engine: impl Into<String>,
        context: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Calculation {
            engine: engine.into(),
            context: context.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::Calculation { .. } => "CALCULATION_ERROR",
            Self::Ephemeris(_) => "EPHEMERIS_ERROR",
            Self::Cache(_) => "CACHE_ERROR",
            Self::Timeout { .. } => "TIMEOUT",
        }
    }

    pub fn remediation(&self) -> String {
        match self {
            Self::InvalidInput { field, .. } => {
                format!("correct `{field}` and resubmit the request")
            }
            Self::Calculation { engine, .. } => format!(
                "check that the ephemeris snapshot contains every body the {engine} engine needs"
            ),
            Self::Ephemeris(_) => {
                "retry once the ephemeris provider is reachable and returns finite values".to_string()
            }
            Self::Cache(_) => {
                "the analysis can be recomputed without the cache; check the cache backend".to_string()
            }
            Self::Timeout { .. } => {
                "retry with a longer deadline or fewer divisional charts".to_string()
            }
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code().to_string(),
            message: self.to_string(),
            remediation: self.remediation(),
        }
    }
}

impl From<&AnalysisError> for ErrorReport {
    fn from(error: &AnalysisError) -> Self {
        error.report()
    }
}
