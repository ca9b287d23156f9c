//! # iac-canon
//!
//! Canonicalizes Infrastructure-as-Code configuration into JSON values that a
//! policy engine can match rules against.
//!
//! iac-canon parses Terraform/HCL files into a dialect-neutral syntax tree and
//! converts each document into a deterministic canonical value:
//!
//! - **Block aggregation**: labeled blocks nest by label, repeated blocks
//!   collect into arrays
//! - **Template reconstruction**: interpolated strings keep their structure,
//!   including `%{if}` and `%{for}` directives
//! - **Verbatim markers**: anything that cannot be evaluated statically is
//!   kept as `${<source>}` instead of being computed or dropped
//! - **Multiple output formats**: JSON, YAML and a plain text summary
//!
//! ## Example
//!
//! ```rust,no_run
//! use iac_canon::{Config, ReportFormat, Scanner};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let scanner = Scanner::new(config)?;
//!
//!     // Convert every Terraform file under a directory
//!     let result = scanner.scan_path("./terraform").await?;
//!
//!     // Generate a report
//!     let report = result.generate_report(ReportFormat::Json)?;
//!     println!("{}", report);
//!
//!     Ok(())
//! }
//! ```

#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod parser;
pub mod reporter;
pub mod syntax;
pub mod types;

// Re-export commonly used types at crate root
pub use config::Config;
pub use error::{IacCanonError, Result};
pub use parser::{ConversionOptions, DialectRegistry, IacDialect, LoadedDocument};
pub use types::{
    AllResourceConfigs, CanonicalDocument, DialectInfo, FileFailure, ReportFormat, ResourceConfig,
    ScanResult,
};

use rayon::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Main scanner that discovers, loads and converts documents.
///
/// The `Scanner` is the primary entry point for using iac-canon as a library.
/// It handles:
/// - Resolving the configured dialect in the registry
/// - Discovering files under the scanned paths
/// - Converting documents in parallel, isolating per-file failures
///
/// # Example
///
/// ```rust,no_run
/// use iac_canon::{Config, Scanner};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let scanner = Scanner::new(Config::default())?;
///
///     let paths = vec!["./stack-a", "./stack-b"];
///     let result = scanner.scan_paths(&paths).await?;
///
///     println!("Converted {} documents", result.documents.len());
///     Ok(())
/// }
/// ```
pub struct Scanner {
    config: Config,
    dialect: Box<dyn IacDialect>,
}

impl Scanner {
    /// Create a scanner using the builtin dialect registry.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedDialect` if the configured dialect is not
    /// registered.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_registry(config, &DialectRegistry::builtin())
    }

    /// Create a scanner resolving the configured dialect in `registry`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedDialect` if the configured dialect is not
    /// registered.
    pub fn with_registry(config: Config, registry: &DialectRegistry) -> Result<Self> {
        let dialect = registry.create(&config.dialect.name, config.dialect.version.as_deref())?;
        tracing::debug!(
            dialect = dialect.name(),
            version = dialect.version(),
            "Scanner created"
        );
        Ok(Self { config, dialect })
    }

    /// The dialect this scanner converts with.
    #[must_use]
    pub fn dialect(&self) -> &dyn IacDialect {
        self.dialect.as_ref()
    }

    /// The scanner configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Convert a single in-memory document.
    ///
    /// # Errors
    ///
    /// Returns the loader or conversion error for the document.
    pub fn convert_source(&self, source: String, path: &Path) -> Result<Value> {
        let document = self.dialect.load_source(source, path)?;
        self.dialect
            .convert_to_canonical_value(&document, &ConversionOptions::from(&self.config))
    }

    /// Convert a single in-memory document into its canonical value and
    /// resource records.
    ///
    /// # Errors
    ///
    /// Returns the loader or conversion error for the document.
    pub fn convert_document(&self, source: String, path: &Path) -> Result<CanonicalDocument> {
        let document = self.dialect.load_source(source, path)?;
        let options = ConversionOptions::from(&self.config);
        let value = self.dialect.convert_to_canonical_value(&document, &options)?;
        let resources = self.dialect.resource_configs(&document, &options)?;
        Ok(CanonicalDocument {
            path: document.path,
            value,
            resources,
        })
    }

    /// Scan a single local path (directory or file).
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The path doesn't exist
    /// - A file fails and `continue_on_error` is disabled
    pub async fn scan_path<P: AsRef<Path>>(&self, path: P) -> Result<ScanResult> {
        self.scan_paths(&[path.as_ref()]).await
    }

    /// Scan multiple local paths.
    ///
    /// Documents and failures keep discovery order.
    ///
    /// # Errors
    ///
    /// Returns an error if a path doesn't exist, or if a file fails and
    /// `continue_on_error` is disabled.
    pub async fn scan_paths<P: AsRef<Path>>(&self, paths: &[P]) -> Result<ScanResult> {
        let mut files = Vec::new();
        for path in paths {
            let path = path.as_ref();
            tracing::info!(path = %path.display(), "Scanning path");
            files.extend(parser::discover_files(
                path,
                self.dialect.as_ref(),
                &self.config.scan.exclude_patterns,
                self.config.scan.max_depth,
            )?);
        }

        let mut sources = Vec::with_capacity(files.len());
        for file in &files {
            let source = tokio::fs::read_to_string(file)
                .await
                .map_err(|e| IacCanonError::io(file, e, file!(), line!()));
            sources.push((file.clone(), source));
        }

        let outcomes: Vec<(PathBuf, Result<CanonicalDocument>)> = sources
            .into_par_iter()
            .map(|(file, source)| {
                tracing::debug!(file = %file.display(), "Converting file");
                let outcome = source.and_then(|source| self.convert_document(source, &file));
                (file, outcome)
            })
            .collect();

        let mut result = ScanResult {
            files_scanned: files,
            dialect: DialectInfo {
                name: self.dialect.name().to_string(),
                version: self.dialect.version().to_string(),
            },
            ..ScanResult::default()
        };

        for (file, outcome) in outcomes {
            match outcome {
                Ok(document) => result.documents.push(document),
                Err(e) => {
                    if self.config.scan.continue_on_error && e.is_recoverable() {
                        tracing::warn!(
                            file = %file.display(),
                            category = e.category(),
                            "failed to convert file, continuing: {}",
                            e
                        );
                        result.failures.push(FileFailure::new(file, &e));
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        tracing::info!(
            documents = result.documents.len(),
            failures = result.failures.len(),
            files = result.files_scanned.len(),
            "Scan complete"
        );

        Ok(result)
    }
}

impl ScanResult {
    /// Render this result with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn generate_report(&self, format: ReportFormat) -> Result<String> {
        let config = Config::default();
        let reporter = reporter::Reporter::new(&config);
        reporter.generate(self, format)
    }
}
