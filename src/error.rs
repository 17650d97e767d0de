//! Error types for schema translation, document loading and endpoint collection.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors during translation.
///
/// Everything else the translator runs into (cycles, unknown types,
/// unsupported model properties) is reported through the warning sink
/// and translation carries on.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("unresolved $ref \"{pointer}\": target not found in document")]
    UnresolvedRef { pointer: String },

    #[error("unsupported $ref \"{pointer}\": only document-local references (#/...) are resolved")]
    ExternalRef { pointer: String },

    #[error("invalid model document: {source}")]
    InvalidModel {
        #[source]
        source: serde_json::Error,
    },
}

impl TranslateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Errors while loading a document at the ingestion boundary.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("pointer not found: {pointer}")]
    PointerNotFound { pointer: String },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors while collecting endpoint schemas from an OpenAPI document.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error("invalid paths object: expected object, got {actual}")]
    InvalidPaths { actual: String },

    #[error("invalid operation at {path}: {message}")]
    InvalidOperation { path: String, message: String },
}

impl CollectError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            CollectError::Translate(e) => e.exit_code(),
            _ => 2,
        }
    }
}
