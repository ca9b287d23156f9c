//! IaC dialect adapters.
//!
//! A dialect adapter parses one file format and lowers its syntax tree into
//! the dialect-neutral [`syntax`](crate::syntax) model, which the
//! [`convert`](crate::convert) engine turns into a canonical value.
//!
//! Adapters are looked up in a [`DialectRegistry`] by `(name, version)`.
//! Registration is explicit: [`DialectRegistry::builtin`] registers the
//! adapters shipped with this crate, and callers may register more.
//!
//! # Example
//!
//! ```rust
//! use iac_canon::parser::{ConversionOptions, DialectRegistry};
//! use std::path::Path;
//!
//! let registry = DialectRegistry::builtin();
//! let dialect = registry.create("terraform", None).unwrap();
//!
//! let document = dialect
//!     .load_source("region = \"us-east-1\"".to_string(), Path::new("main.tf"))
//!     .unwrap();
//! let value = dialect
//!     .convert_to_canonical_value(&document, &ConversionOptions::default())
//!     .unwrap();
//! assert_eq!(value["region"], "us-east-1");
//! ```

mod hcl;

pub use hcl::HclParser;

use crate::config::Config;
use crate::convert::DEFAULT_MAX_NESTING_DEPTH;
use crate::error::Result;
use crate::syntax::Body;
use crate::types::ResourceConfig;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directories and files to skip during discovery.
pub const SKIP_FILES: &[&str] = &[".terraform", ".terragrunt-cache", "terraform.tfstate"];

/// A parsed document: source text plus its lowered syntax tree.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    /// File the document was loaded from
    pub path: PathBuf,
    /// Raw source text; expression spans index into it
    pub source: String,
    /// Lowered syntax tree
    pub body: Body,
}

/// Options for a single canonical conversion.
#[derive(Debug, Clone, Copy)]
pub struct ConversionOptions {
    /// Maximum syntax tree nesting before conversion fails
    pub max_nesting_depth: usize,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

impl From<&Config> for ConversionOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_nesting_depth: config.conversion.max_nesting_depth,
        }
    }
}

/// An IaC dialect adapter.
///
/// Implementations must be cheap to share across threads: documents of the
/// same dialect are converted in parallel.
pub trait IacDialect: Send + Sync {
    /// Dialect name, e.g. `terraform`.
    fn name(&self) -> &'static str;

    /// Dialect version, e.g. `v14`.
    fn version(&self) -> &'static str;

    /// File name suffixes this dialect loads.
    fn extensions(&self) -> &'static [&'static str];

    /// Parse `source` and lower it into a [`LoadedDocument`].
    ///
    /// # Errors
    ///
    /// Returns an `UpstreamLoad` error if the source is not valid for this
    /// dialect.
    fn load_source(&self, source: String, path: &Path) -> Result<LoadedDocument>;

    /// Read and parse a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    fn load_file(&self, path: &Path) -> Result<LoadedDocument> {
        if !path.is_file() {
            return Err(crate::err!(FileNotFound {
                path: path.to_path_buf(),
            }));
        }
        let source = std::fs::read_to_string(path)
            .map_err(|e| crate::error::IacCanonError::io(path, e, file!(), line!()))?;
        self.load_source(source, path)
    }

    /// Convert a loaded document into its canonical value.
    ///
    /// # Errors
    ///
    /// Returns the conversion error unchanged; no partial value is produced.
    fn convert_to_canonical_value(
        &self,
        document: &LoadedDocument,
        options: &ConversionOptions,
    ) -> Result<serde_json::Value> {
        tracing::debug!(
            file = %document.path.display(),
            dialect = self.name(),
            version = self.version(),
            "Converting document"
        );
        crate::convert::to_canonical_value(&document.source, &document.body, options.max_nesting_depth)
    }

    /// Extract one record per managed resource declared in a loaded
    /// document.
    ///
    /// # Errors
    ///
    /// Returns the conversion error of the first failing resource body.
    fn resource_configs(
        &self,
        document: &LoadedDocument,
        options: &ConversionOptions,
    ) -> Result<Vec<ResourceConfig>> {
        crate::convert::resource_configs(
            &document.source,
            &document.body,
            &document.path,
            options.max_nesting_depth,
        )
    }

    /// Check if a file belongs to this dialect.
    fn handles(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.extensions().iter().any(|ext| path_str.ends_with(ext))
    }
}

/// Builds a fresh adapter instance.
pub type DialectFactory = fn() -> Box<dyn IacDialect>;

/// Registry of dialect adapters keyed by `(name, version)`.
#[derive(Debug, Default, Clone)]
pub struct DialectRegistry {
    factories: BTreeMap<(String, String), DialectFactory>,
    defaults: BTreeMap<String, String>,
}

impl DialectRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the adapters shipped in this crate.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        hcl::register(&mut registry);
        registry
    }

    /// Register a factory. The first version registered for a name becomes
    /// its default until [`set_default`](Self::set_default) says otherwise.
    pub fn register(&mut self, name: &str, version: &str, factory: DialectFactory) {
        tracing::debug!(dialect = %name, version = %version, "Registering dialect");
        self.factories
            .insert((name.to_string(), version.to_string()), factory);
        self.defaults
            .entry(name.to_string())
            .or_insert_with(|| version.to_string());
    }

    /// Choose the version used when none is requested.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedDialect` if the pair is not registered.
    pub fn set_default(&mut self, name: &str, version: &str) -> Result<()> {
        if !self.factories.contains_key(&(name.to_string(), version.to_string())) {
            return Err(crate::err!(UnsupportedDialect {
                name: name.to_string(),
                version: version.to_string(),
            }));
        }
        self.defaults.insert(name.to_string(), version.to_string());
        Ok(())
    }

    /// Instantiate the adapter for `name`, using the default version when
    /// `version` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedDialect` if nothing is registered for the request.
    pub fn create(&self, name: &str, version: Option<&str>) -> Result<Box<dyn IacDialect>> {
        let unsupported = || {
            crate::err!(UnsupportedDialect {
                name: name.to_string(),
                version: version.unwrap_or("default").to_string(),
            })
        };

        let version = match version {
            Some(version) => version,
            None => self.defaults.get(name).ok_or_else(unsupported)?.as_str(),
        };

        let factory = self
            .factories
            .get(&(name.to_string(), version.to_string()))
            .ok_or_else(unsupported)?;
        Ok(factory())
    }

    /// Registered `(name, version, is_default)` triples, sorted.
    #[must_use]
    pub fn entries(&self) -> Vec<(&str, &str, bool)> {
        self.factories
            .keys()
            .map(|(name, version)| {
                let is_default = self.defaults.get(name) == Some(version);
                (name.as_str(), version.as_str(), is_default)
            })
            .collect()
    }
}

/// Find every file under `root` that `dialect` handles.
///
/// Hidden entries, [`SKIP_FILES`] and names matching `exclude_patterns` are
/// skipped. A `root` that is itself a file is returned as-is when the dialect
/// handles it.
///
/// # Errors
///
/// Returns `DirectoryNotFound` if `root` does not exist.
pub fn discover_files(
    root: &Path,
    dialect: &dyn IacDialect,
    exclude_patterns: &[String],
    max_depth: usize,
) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(crate::err!(DirectoryNotFound {
            path: root.to_path_buf(),
        }));
    }

    if root.is_file() {
        return Ok(if dialect.handles(root) { vec![root.to_path_buf()] } else { Vec::new() });
    }

    let patterns: Vec<glob::Pattern> = exclude_patterns
        .iter()
        .filter_map(|pattern| match glob::Pattern::new(pattern) {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!(pattern = %pattern, error = %e, "Ignoring invalid exclude pattern");
                None
            }
        })
        .collect();

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .max_depth(max_depth)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !should_skip(e.path(), &patterns))
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read directory entry");
                continue;
            }
        };

        let file_path = entry.path();
        if file_path.is_dir() || !dialect.handles(file_path) {
            continue;
        }
        files.push(file_path.to_path_buf());
    }

    tracing::debug!(root = %root.display(), files = files.len(), "Discovery complete");
    Ok(files)
}

/// Check if a path should be skipped.
fn should_skip(path: &Path, patterns: &[glob::Pattern]) -> bool {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    if file_name.starts_with('.') {
        tracing::debug!(path = %path.display(), reason = "hidden file/directory", "Skipping path");
        return true;
    }

    if SKIP_FILES.iter().any(|s| file_name == *s) {
        tracing::debug!(path = %path.display(), reason = "known skip file", "Skipping path");
        return true;
    }

    let path_str = path.to_string_lossy();
    if patterns.iter().any(|p| p.matches(file_name) || p.matches(&path_str)) {
        tracing::debug!(path = %path.display(), reason = "matches exclude pattern", "Skipping path");
        return true;
    }

    false
}
