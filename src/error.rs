//! Error taxonomy for document generation.
//!
//! Element-local errors (`Resolution`, `Filter`, `Annotation`) are captured by the
//! [`PipelineRunner`](crate::pipeline::PipelineRunner) and recorded against the
//! element that produced them. Fatal errors (`RegistryConflict`, `ScopeFault`)
//! abort the whole request. `ContractNotFound` is raised before any scope is
//! opened and is the only error that reaches the caller as an `Err`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Every failure the generation core can report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// A declared type-contract location does not exist.
    #[error("contract not found: {}", path.display())]
    ContractNotFound { path: PathBuf },

    /// A cross-reference could not be turned into type metadata.
    #[error("cannot resolve type reference '{reference}': {reason}")]
    Resolution { reference: String, reason: String },

    /// A filter rejected the annotation it was given.
    #[error("{filter} failed: {message}")]
    Filter { filter: String, message: String },

    /// The annotation tree itself is malformed for the requested role.
    #[error("malformed annotation: {message}")]
    Annotation { message: String },

    /// Two distinct types could not be given distinct reference names.
    #[error("reference name '{name}' is taken by '{existing}' and cannot be disambiguated for '{requested}'")]
    RegistryConflict {
        name: String,
        existing: String,
        requested: String,
    },

    /// Unexpected failure inside an isolation scope.
    #[error("generation scope fault: {message}")]
    ScopeFault { message: String },
}

impl GenerationError {
    pub fn resolution(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        GenerationError::Resolution {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    pub fn filter(filter: impl Into<String>, message: impl Into<String>) -> Self {
        GenerationError::Filter {
            filter: filter.into(),
            message: message.into(),
        }
    }

    pub fn annotation(message: impl Into<String>) -> Self {
        GenerationError::Annotation {
            message: message.into(),
        }
    }

    /// Fatal errors abort the request instead of being recorded per element.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GenerationError::RegistryConflict { .. } | GenerationError::ScopeFault { .. }
        )
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerationError::ContractNotFound { .. } => ErrorKind::Precondition,
            GenerationError::Resolution { .. } => ErrorKind::Resolution,
            GenerationError::Filter { .. } | GenerationError::Annotation { .. } => {
                ErrorKind::Filter
            }
            GenerationError::RegistryConflict { .. } => ErrorKind::RegistryConflict,
            GenerationError::ScopeFault { .. } => ErrorKind::ScopeFault,
        }
    }
}

/// Serializable classification of a [`GenerationError`], carried in results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Precondition,
    Resolution,
    Filter,
    RegistryConflict,
    ScopeFault,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Precondition => "PreconditionError",
            ErrorKind::Resolution => "ResolutionError",
            ErrorKind::Filter => "FilterError",
            ErrorKind::RegistryConflict => "RegistryConflictError",
            ErrorKind::ScopeFault => "ScopeFault",
        };
        write!(f, "{}", s)
    }
}
