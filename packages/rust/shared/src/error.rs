//! Error types for modelcharts.
//!
//! Library crates use [`ModelChartsError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` and prints [`ModelChartsError::kind`]
//! as the one-line diagnostic prefix.

use std::path::PathBuf;

use crate::types::{ChartKind, RejectionTally};

/// Top-level error type for all modelcharts operations.
///
/// Per-record validation failures (`MissingField`, `InvalidMagnitude`) are not
/// variants here: they are recovered inside the transformer and surface only
/// as a [`RejectionTally`]. Everything in this enum is fatal to the run.
#[derive(Debug, thiserror::Error)]
pub enum ModelChartsError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The same substring was mapped to two different labels in the rule list.
    #[error("classification rule {pattern:?} maps to both {first:?} and {second:?}")]
    ClassificationAmbiguity {
        pattern: String,
        first: String,
        second: String,
    },

    /// No record survived validation for a chart.
    #[error("no usable records for {chart} ({tally})")]
    EmptyResultSet {
        chart: ChartKind,
        tally: RejectionTally,
    },

    /// The rendering template's placeholder marker is missing or ambiguous.
    #[error("embedding error: {message}")]
    Embedding { message: String },

    /// Catalog database error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A document on disk does not match the chart document schema.
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ModelChartsError>;

impl ModelChartsError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an embedding error from any displayable message.
    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding {
            message: msg.into(),
        }
    }

    /// Create a storage error from any displayable message.
    pub fn storage(msg: impl std::fmt::Display) -> Self {
        Self::Storage(msg.to_string())
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable error-kind name printed by the CLI.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config { .. } => "ConfigError",
            Self::ClassificationAmbiguity { .. } => "ClassificationAmbiguity",
            Self::EmptyResultSet { .. } => "EmptyResultSet",
            Self::Embedding { .. } => "EmbeddingError",
            Self::Storage(_) | Self::Io { .. } => "IOFailure",
            Self::Validation { .. } => "ValidationError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ModelChartsError::config("missing database path");
        assert_eq!(err.to_string(), "config error: missing database path");

        let err = ModelChartsError::embedding("marker appears 2 times");
        assert!(err.to_string().contains("2 times"));
    }

    #[test]
    fn empty_result_set_includes_tally() {
        let err = ModelChartsError::EmptyResultSet {
            chart: ChartKind::ParametersVsDatapoints,
            tally: RejectionTally {
                missing_field: 2,
                invalid_magnitude: 5,
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("parameters-vs-datapoints"));
        assert!(msg.contains("7 rejected"));
        assert!(msg.contains("5 invalid magnitude"));
        assert_eq!(err.kind(), "EmptyResultSet");
    }

    #[test]
    fn storage_and_io_share_kind() {
        let io = ModelChartsError::io(
            "/tmp/x",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(io.kind(), "IOFailure");
        assert_eq!(ModelChartsError::storage("locked").kind(), "IOFailure");
    }
}
