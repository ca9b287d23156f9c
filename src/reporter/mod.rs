//! Report generation module.
//!
//! This module renders a [`ScanResult`] in multiple formats:
//! - JSON: Canonical documents for policy evaluation
//! - YAML: The same structure as JSON
//! - Text: Human-readable CLI summary
//!
//! # Example
//!
//! ```rust,no_run
//! use iac_canon::reporter::Reporter;
//! use iac_canon::{Config, ReportFormat, ScanResult};
//!
//! let config = Config::default();
//! let reporter = Reporter::new(&config);
//!
//! let json = reporter.generate(&ScanResult::default(), ReportFormat::Json).unwrap();
//! ```

mod json;
mod text;
mod yaml;

use crate::config::Config;
use crate::error::Result;
use crate::types::{AllResourceConfigs, ReportFormat, ScanResult};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

pub use json::JsonReporter;
pub use text::TextReporter;
pub use yaml::YamlReporter;

/// Report generator that supports multiple output formats.
pub struct Reporter {
    config: Config,
}

impl Reporter {
    /// Create a new reporter with the given configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Generate a report in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if report generation fails.
    pub fn generate(&self, result: &ScanResult, format: ReportFormat) -> Result<String> {
        tracing::debug!(format = %format, documents = result.documents.len(), "Generating report");
        match format {
            ReportFormat::Json => JsonReporter::new(&self.config).generate(result),
            ReportFormat::Yaml => YamlReporter::new(&self.config).generate(result),
            ReportFormat::Text => TextReporter::new(&self.config).generate(result),
        }
    }
}

/// Trait for report generators.
pub trait ReportGenerator {
    /// Generate a report from scan results.
    ///
    /// # Errors
    ///
    /// Returns an error if generation fails.
    fn generate(&self, result: &ScanResult) -> Result<String>;
}

/// Structured report shared by the JSON and YAML writers.
///
/// Every map is ordered, so the same scan always serializes to the same
/// bytes.
#[derive(Debug, Serialize)]
pub struct CanonicalReport {
    /// Report metadata
    pub metadata: ReportMetadata,
    /// Canonical value per file path
    pub documents: BTreeMap<String, Value>,
    /// Managed resources grouped by type
    pub resources: AllResourceConfigs,
    /// Files that failed to convert
    pub failures: Vec<ReportFailure>,
}

impl From<&ScanResult> for CanonicalReport {
    fn from(result: &ScanResult) -> Self {
        Self {
            metadata: ReportMetadata {
                version: env!("CARGO_PKG_VERSION").to_string(),
                dialect: result.dialect.name.clone(),
                dialect_version: result.dialect.version.clone(),
                files_scanned: result.files_scanned.len(),
            },
            documents: result
                .documents
                .iter()
                .map(|document| (document.path.to_string_lossy().to_string(), document.value.clone()))
                .collect(),
            resources: result.resource_configs(),
            failures: result
                .failures
                .iter()
                .map(|failure| ReportFailure {
                    file: failure.file.to_string_lossy().to_string(),
                    category: failure.category.clone(),
                    message: failure.message.clone(),
                })
                .collect(),
        }
    }
}

/// Report metadata.
#[derive(Debug, Serialize)]
pub struct ReportMetadata {
    /// iac-canon version
    pub version: String,
    /// Dialect name
    pub dialect: String,
    /// Dialect version
    pub dialect_version: String,
    /// Number of files scanned
    pub files_scanned: usize,
}

/// A failed file as reported.
#[derive(Debug, Serialize)]
pub struct ReportFailure {
    /// File path
    pub file: String,
    /// Error category
    pub category: String,
    /// Error message
    pub message: String,
}
