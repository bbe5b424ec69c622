//! # Error Handling
//!
//! This module defines the centralized error type for `valgrade`. It uses the
//! `thiserror` library to build a single `Error` enum covering every failure
//! the library can report, each variant carrying enough context (path, chart,
//! version, file) to be printed directly to the user.
//!
//! ## Key Components
//!
//! - **`Error`**: The enum of all failure modes.
//! - **`PathFailure`**: One failed `set`/`delete` during merge application.
//!   Failures are collected and reported together through
//!   `Error::Reconciliation`.
//! - **`Result<T>`**: Alias for `std::result::Result<T, Error>`.
//!
//! The error classes map onto the stages of an upgrade run:
//!
//! - Document addressing: `PathNotFound`, `TypeMismatch`, `EmptyPath`.
//! - Chart retrieval: `Retrieval`, `Cache`.
//! - Document loading and saving: `Format`, `UnsupportedFormat`, `Read`,
//!   `Write`.
//! - Merge application: `Reconciliation`.
//! - Settings: `ConfigParse`.

use std::fmt;

use thiserror::Error;

/// Main error type for valgrade operations
#[derive(Error, Debug)]
pub enum Error {
    /// A path did not fully resolve in a document.
    #[error("Path not found: '{path}'")]
    PathNotFound { path: String },

    /// An intermediate path segment resolved to something other than a mapping.
    #[error("Type mismatch at '{at}' while resolving '{path}': expected a mapping, found {found}")]
    TypeMismatch {
        path: String,
        at: String,
        found: &'static str,
    },

    /// A document operation was given an empty path.
    #[error("Empty path: a document operation needs at least one key segment")]
    EmptyPath,

    /// A chart could not be retrieved from its repository.
    #[error("Failed to retrieve chart {chart}@{version} from {repository}: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Retrieval {
        repository: String,
        chart: String,
        version: String,
        message: String,
        /// Optional hint for how to resolve the retrieval issue
        hint: Option<String>,
    },

    /// A document could not be parsed or serialized.
    #[error("Format error: {message}")]
    Format { message: String },

    /// A file extension that maps to no supported document format.
    #[error("Unsupported file format '{extension}' for {path} (supported: .yaml, .yml, .json)")]
    UnsupportedFormat { path: String, extension: String },

    /// One or more delta entries could not be written into the document.
    #[error("Failed to apply {} change(s) to the values document:{}", failures.len(), format_failures(failures))]
    Reconciliation { failures: Vec<PathFailure> },

    /// The settings file could not be parsed or holds invalid values.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A file could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// A file could not be written.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    /// An error with the on-disk chart cache.
    #[error("Cache operation error: {message}")]
    Cache { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML error, wrapped from `serde_yaml::Error`.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// The document operation a [`PathFailure`] was attempting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Set,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Set => f.write_str("set"),
            Operation::Delete => f.write_str("delete"),
        }
    }
}

/// A single failed document operation collected by the merge applier.
#[derive(Debug)]
pub struct PathFailure {
    pub operation: Operation,
    pub path: String,
    pub error: Error,
}

impl fmt::Display for PathFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.operation, self.path, self.error)
    }
}

fn format_failures(failures: &[PathFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("\n  - {}", failure))
        .collect()
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
