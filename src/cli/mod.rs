//! Command-line interface module.
//!
//! This module defines the CLI structure using Clap, including
//! all commands, arguments, and options.
//!
//! # Commands
//!
//! - `convert`: Convert IaC files into canonical JSON/YAML documents
//! - `dialects`: List the registered IaC dialects
//! - `init`: Create an example configuration file
//! - `validate`: Validate a configuration file
//!
//! # Example Usage
//!
//! ```bash
//! # Convert a directory
//! iac-canon convert ./terraform
//!
//! # Write YAML to a file
//! iac-canon convert ./terraform --format yaml --output canonical.yaml
//!
//! # Use the Terraform 0.12 adapter and stop at the first failure
//! iac-canon convert ./legacy --dialect-version v12 --fail-fast
//!
//! # Initialize configuration
//! iac-canon init
//!
//! # Validate configuration
//! iac-canon validate iac-canon.yaml
//! ```

use crate::types::ReportFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// iac-canon - canonicalize Infrastructure-as-Code for policy evaluation.
#[derive(Parser, Debug)]
#[command(
    name = "iac-canon",
    author,
    version,
    about = "Canonicalize Infrastructure-as-Code files into JSON for policy evaluation",
    long_about = "iac-canon parses Terraform/HCL files and converts each one into a \
                  deterministic JSON value: labeled blocks nest by label, repeated blocks \
                  collect into arrays, and expressions that cannot be evaluated statically \
                  are kept verbatim as ${...} markers."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "IAC_CANON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert IaC files into canonical documents
    #[command(visible_alias = "c")]
    Convert(ConvertArgs),

    /// List registered IaC dialects
    Dialects,

    /// Create an example configuration file
    Init,

    /// Validate a configuration file
    Validate(ValidateArgs),
}

/// Arguments for the convert command.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Files or directories to convert
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "json", value_enum)]
    pub format: ReportFormat,

    /// Output file path (stdout if not specified)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Dialect name (default: from configuration, else terraform)
    #[arg(long, value_name = "NAME")]
    pub dialect: Option<String>,

    /// Dialect version (default: the dialect's default version)
    #[arg(long, value_name = "VERSION")]
    pub dialect_version: Option<String>,

    /// Patterns to exclude from scanning (glob patterns)
    #[arg(short, long = "exclude", value_name = "PATTERN")]
    pub exclude_patterns: Vec<String>,

    /// Maximum depth for recursive directory scanning
    #[arg(long, value_name = "DEPTH")]
    pub max_depth: Option<usize>,

    /// Maximum syntax tree nesting before a document is rejected
    #[arg(long, value_name = "DEPTH")]
    pub max_nesting_depth: Option<usize>,

    /// Abort on the first file that fails to convert
    #[arg(long)]
    pub fail_fast: bool,
}

/// Arguments for the validate command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(value_name = "FILE", default_value = "iac-canon.yaml")]
    pub config: PathBuf,
}
