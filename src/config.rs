//! Configuration module for iac-canon.
//!
//! This module handles loading and validating configuration from:
//! - YAML configuration files (`iac-canon.yaml`)
//! - Environment variables
//! - CLI arguments
//!
//! # Configuration File Format
//!
//! ```yaml
//! # iac-canon.yaml
//!
//! scan:
//!   exclude_patterns:
//!     - "**/.terraform/**"
//!   continue_on_error: true
//!   max_depth: 100
//!
//! conversion:
//!   max_nesting_depth: 64
//!
//! dialect:
//!   name: terraform
//!   version: ${IAC_DIALECT_VERSION}  # Environment variable expansion
//!
//! output:
//!   colored: true
//!   pretty: true
//! ```

use crate::convert::DEFAULT_MAX_NESTING_DEPTH;
use crate::error::{ErrorCollector, IacCanonError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

/// Configuration files looked up in the working directory, in order.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["iac-canon.yaml", "iac-canon.yml", ".iac-canon.yaml"];

/// Scanning options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Patterns to exclude from scanning (glob patterns).
    pub exclude_patterns: Vec<String>,

    /// Continue scanning even if some files fail to convert.
    pub continue_on_error: bool,

    /// Maximum depth for recursive directory scanning.
    pub max_depth: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            exclude_patterns: vec!["**/.terraform/**".to_string()],
            continue_on_error: true,
            max_depth: default_max_depth(),
        }
    }
}

/// Canonical conversion options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionSettings {
    /// Maximum syntax tree nesting before a document is rejected.
    pub max_nesting_depth: usize,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

/// Dialect selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialectOptions {
    /// Registered dialect name.
    pub name: String,

    /// Dialect version; the registry default when unset.
    pub version: Option<String>,
}

impl Default for DialectOptions {
    fn default() -> Self {
        Self {
            name: "terraform".to_string(),
            version: None,
        }
    }
}

/// Output options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// Use colored output.
    pub colored: bool,

    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            colored: true,
            pretty: true,
        }
    }
}

/// Main configuration structure with nested sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scanning options
    pub scan: ScanOptions,

    /// Conversion options
    pub conversion: ConversionSettings,

    /// Dialect selection
    pub dialect: DialectOptions,

    /// Output options
    pub output: OutputOptions,
}

fn default_max_depth() -> usize {
    100
}

impl Config {
    /// Load configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or a value is out of range.
    pub fn from_yaml(content: &str) -> Result<Self> {
        tracing::debug!("Parsing configuration from YAML");
        let expanded = expand_env_vars(content);

        // An all-comment document deserializes as null.
        let config: Config = match serde_yaml::from_str::<Option<Config>>(&expanded) {
            Ok(config) => config.unwrap_or_default(),
            Err(e) => {
                return Err(IacCanonError::config_parse(e.to_string(), Some(Box::new(e)), file!(), line!()));
            }
        };
        config.validate()?;

        tracing::debug!(
            exclude_patterns = config.scan.exclude_patterns.len(),
            continue_on_error = config.scan.continue_on_error,
            dialect = %config.dialect.name,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading configuration file");
        if !path.is_file() {
            return Err(crate::err!(FileNotFound { path: path.to_path_buf() }));
        }
        let content = std::fs::read_to_string(path).map_err(|e| IacCanonError::io(path, e, file!(), line!()))?;
        Self::from_yaml(&content)
    }

    /// Load the configuration from `explicit`, or from the first default
    /// configuration file found in the working directory, or fall back to
    /// the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file exists but is invalid.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        for candidate in DEFAULT_CONFIG_FILES {
            let path = Path::new(candidate);
            if path.exists() {
                tracing::debug!(path = %candidate, "Found configuration file");
                return Self::from_file(path);
            }
        }

        tracing::debug!("No configuration file found, using default configuration");
        Ok(Self::default())
    }

    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `ConfigValue` for an invalid setting, or `Multiple` when
    /// several settings are invalid.
    pub fn validate(&self) -> Result<()> {
        let mut errors = ErrorCollector::new();

        if self.conversion.max_nesting_depth == 0 {
            errors.add(crate::err!(ConfigValue {
                key: "conversion.max_nesting_depth".to_string(),
                message: "must be at least 1".to_string(),
            }));
        }
        if self.dialect.name.trim().is_empty() {
            errors.add(crate::err!(ConfigValue {
                key: "dialect.name".to_string(),
                message: "must not be empty".to_string(),
            }));
        }
        for pattern in &self.scan.exclude_patterns {
            if let Err(e) = glob::Pattern::new(pattern) {
                errors.add(crate::err!(ConfigValue {
                    key: "scan.exclude_patterns".to_string(),
                    message: format!("invalid glob '{pattern}': {e}"),
                }));
            }
        }

        errors.into_result()
    }

    /// Generate an example YAML configuration.
    #[must_use]
    pub fn example_yaml() -> String {
        r#"# iac-canon configuration file

# Scanning options
scan:
  # Patterns to exclude from scanning (glob patterns)
  exclude_patterns:
    - "**/.terraform/**"

  # Record failing files and keep going instead of aborting the scan
  continue_on_error: true

  # Maximum depth for recursive directory scanning
  max_depth: 100

# Conversion options
conversion:
  # Documents nesting deeper than this are rejected
  max_nesting_depth: 64

# Dialect selection
dialect:
  name: terraform
  # Registry default when unset (can use environment variable)
  # version: ${IAC_DIALECT_VERSION}

# Output options
output:
  # Use colored output in terminal
  colored: true

  # Pretty-print JSON output
  pretty: true
"#
        .to_string()
    }

    /// Merge CLI arguments into the configuration.
    pub fn merge_cli_args(&mut self, args: &crate::cli::ConvertArgs) {
        if !args.exclude_patterns.is_empty() {
            self.scan
                .exclude_patterns
                .extend(args.exclude_patterns.iter().cloned());
        }
        if args.fail_fast {
            self.scan.continue_on_error = false;
        }
        if let Some(max_depth) = args.max_depth {
            self.scan.max_depth = max_depth;
        }
        if let Some(max_nesting_depth) = args.max_nesting_depth {
            self.conversion.max_nesting_depth = max_nesting_depth;
        }
        if let Some(ref dialect) = args.dialect {
            self.dialect.name = dialect.clone();
        }
        if let Some(ref version) = args.dialect_version {
            self.dialect.version = Some(version.clone());
        }
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. Unset variables are left as written.
fn expand_env_vars(content: &str) -> String {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(re) = PATTERN
        .get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)").ok())
        .as_ref()
    else {
        return content.to_string();
    };

    re.replace_all(content, |caps: &regex::Captures<'_>| {
        let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        std::env::var(name).unwrap_or_else(|_| caps[0].to_string())
    })
    .into_owned()
}
