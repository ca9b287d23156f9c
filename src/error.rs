//! Error types for iac-canon.
//!
//! This module defines the single error taxonomy used by the loader, the
//! canonicalization engine, and the reporters. Errors are returned as values
//! and propagated with the `?` operator; a failed conversion never yields a
//! partial document.
//!
//! # Error Categories
//!
//! - **Structural errors**: label paths colliding with non-object values,
//!   nesting deeper than the configured ceiling
//! - **Evaluation errors**: literals that cannot be coerced in context
//! - **Upstream errors**: parser/loader failures, passed through unexamined
//! - **IO errors**: file system operations
//! - **Config errors**: invalid configuration files or unknown dialects
//!
//! # Example
//!
//! ```rust
//! use iac_canon::error::{IacCanonError, Result};
//!
//! fn read_source(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .map_err(|e| IacCanonError::io(path, e, file!(), line!()))
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Macro to create errors with automatic source location tracking.
///
/// Fields accept both `field: value` and shorthand `field` syntax.
///
/// Usage:
/// ```ignore
/// return Err(err!(ConfigValue { key: "dialect".to_string(), message: "empty".to_string() }));
/// ```
#[macro_export]
macro_rules! err {
    ($variant:ident { $($field:ident $(: $value:expr)?),* $(,)? }) => {
        $crate::error::IacCanonError::$variant {
            $($field $(: $value)?,)*
            src_path: file!(),
            src_line: line!(),
        }
    };
}

/// A specialized Result type for iac-canon operations.
pub type Result<T> = std::result::Result<T, IacCanonError>;

/// The main error type for iac-canon.
#[derive(Error, Debug)]
pub enum IacCanonError {
    // =========================================================================
    // I/O and File System Errors
    // =========================================================================
    /// I/O error with path context.
    #[error("I/O error at '{path}' ({src_path}:{src_line}): {source}")]
    Io {
        /// The path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// File not found.
    #[error("File not found: {path} ({src_path}:{src_line})")]
    FileNotFound {
        /// The missing file path
        path: PathBuf,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Directory not found.
    #[error("Directory not found: {path} ({src_path}:{src_line})")]
    DirectoryNotFound {
        /// The missing directory path
        path: PathBuf,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Loader Errors
    // =========================================================================
    /// The dialect parser or loader rejected the document.
    #[error("Failed to load '{file}' \n\t({src_path}:{src_line}): {message}")]
    UpstreamLoad {
        /// The file being loaded
        file: PathBuf,
        /// Error message reported by the parser
        message: String,
        /// Line number (if available)
        line: Option<usize>,
        /// Column number (if available)
        column: Option<usize>,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Conversion Errors
    // =========================================================================
    /// A block label path runs into a value that is not an object.
    #[error("Unable to convert block '{path}' ({src_path}:{src_line}): {message}")]
    StructuralAmbiguity {
        /// Dotted block path (type followed by labels)
        path: String,
        /// Description of the collision
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// The syntax tree nests deeper than the configured ceiling.
    #[error("Nesting depth exceeds the limit of {limit} ({src_path}:{src_line})")]
    NestingTooDeep {
        /// The configured maximum depth
        limit: usize,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// An expression could not be evaluated in its context.
    #[error("Failed to evaluate expression '{expression}' ({src_path}:{src_line}): {message}")]
    ExpressionEvaluation {
        /// Source text of the offending expression
        expression: String,
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// No dialect is registered under the requested name and version.
    #[error("Unsupported IaC dialect '{name}' version '{version}' ({src_path}:{src_line})")]
    UnsupportedDialect {
        /// Dialect name (e.g., "terraform")
        name: String,
        /// Requested version, or "default"
        version: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Configuration parsing error.
    #[error("Failed to parse configuration ({src_path}:{src_line}): {message}")]
    ConfigParse {
        /// Error message
        message: String,
        /// The underlying error (if any)
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}' ({src_path}:{src_line}): {message}")]
    ConfigValue {
        /// The configuration key
        key: String,
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Report Errors
    // =========================================================================
    /// Report generation error.
    #[error("Failed to generate report ({src_path}:{src_line}): {message}")]
    ReportGeneration {
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Generic Errors
    // =========================================================================
    /// Multiple errors occurred.
    #[error("Multiple errors occurred ({count} total)")]
    Multiple {
        /// Number of errors
        count: usize,
        /// The individual errors
        errors: Vec<IacCanonError>,
    },
}

impl IacCanonError {
    /// Creates an `Io` error.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error, src_path: &'static str, src_line: u32) -> Self {
        Self::Io { path: path.into(), source, src_path, src_line }
    }

    /// Creates an `UpstreamLoad` error.
    #[must_use]
    pub fn upstream_load(file: PathBuf, message: String, src_path: &'static str, src_line: u32) -> Self {
        Self::UpstreamLoad { file, message, line: None, column: None, src_path, src_line }
    }

    /// Creates a `ConfigParse` error.
    #[must_use]
    pub fn config_parse(message: String, source: Option<Box<dyn std::error::Error + Send + Sync>>, src_path: &'static str, src_line: u32) -> Self {
        Self::ConfigParse { message, source, src_path, src_line }
    }

    /// Short category name used in reports.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::StructuralAmbiguity { .. } | Self::NestingTooDeep { .. } => "structural",
            Self::ExpressionEvaluation { .. } => "evaluation",
            Self::UpstreamLoad { .. } => "upstream",
            Self::Io { .. } | Self::FileNotFound { .. } | Self::DirectoryNotFound { .. } => "io",
            Self::UnsupportedDialect { .. } | Self::ConfigParse { .. } | Self::ConfigValue { .. } => "config",
            Self::ReportGeneration { .. } => "report",
            Self::Multiple { .. } => "multiple",
        }
    }

    /// Determines if the error only affects a single document, so scanning
    /// may continue with the remaining files.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Io { .. }
                | Self::FileNotFound { .. }
                | Self::UpstreamLoad { .. }
                | Self::StructuralAmbiguity { .. }
                | Self::NestingTooDeep { .. }
                | Self::ExpressionEvaluation { .. }
        )
    }

    /// Consolidates multiple errors into a single `IacCanonError::Multiple` if there's more than one.
    /// Otherwise, returns the single error or `Ok(())` if no errors.
    pub fn collect(errors: Vec<Self>) -> Result<()> {
        let mut iter = errors.into_iter();
        match (iter.next(), iter.next()) {
            (None, _) => Ok(()),
            (Some(only), None) => Err(only),
            (Some(first), Some(second)) => {
                let errors: Vec<Self> = [first, second].into_iter().chain(iter).collect();
                Err(Self::Multiple { count: errors.len(), errors })
            }
        }
    }
}

impl From<serde_json::Error> for IacCanonError {
    fn from(source: serde_json::Error) -> Self {
        Self::ReportGeneration {
            message: format!("JSON serialization error: {source}"),
            src_path: file!(),
            src_line: line!(),
        }
    }
}

/// A utility for collecting multiple errors during scanning.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    errors: Vec<IacCanonError>,
}

impl ErrorCollector {
    /// Create a new error collector.
    #[must_use]
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Add an error to the collection.
    pub fn add(&mut self, error: IacCanonError) {
        self.errors.push(error);
    }

    /// Get the number of collected errors.
    #[must_use]
    pub fn count(&self) -> usize {
        self.errors.len()
    }

    /// Check if there are any errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Convert to a Result, returning Multiple error if there are any errors.
    pub fn into_result(self) -> Result<()> {
        IacCanonError::collect(self.errors)
    }
}
