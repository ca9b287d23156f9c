//! Core data types used throughout iac-canon.
//!
//! This module defines the results of a scan:
//! - Canonical documents produced from individual files
//! - Per-resource records extracted from those documents
//! - Per-file failures recorded when scanning continues past errors
//! - Report formats

use crate::error::IacCanonError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One converted file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalDocument {
    /// File the document was loaded from
    pub path: PathBuf,

    /// Canonical value handed to policy evaluation
    pub value: Value,

    /// Managed resources declared in the file, in declaration order
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
}

/// A managed resource declared by a `resource "<type>" "<name>"` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// `<type>.<name>`
    pub id: String,

    /// Resource name (second label)
    pub name: String,

    /// Resource type (first label)
    #[serde(rename = "type")]
    pub resource_type: String,

    /// File the block is declared in
    pub source: PathBuf,

    /// 1-based line of the block's type keyword
    pub line: usize,

    /// Canonical value of the block body
    pub config: Value,
}

/// Resource records grouped by resource type.
pub type AllResourceConfigs = BTreeMap<String, Vec<ResourceConfig>>;

/// A file that could not be loaded or converted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    /// The failing file
    pub file: PathBuf,

    /// Error category (see [`IacCanonError::category`])
    pub category: String,

    /// Human-readable error message
    pub message: String,
}

impl FileFailure {
    /// Record `error` against `file`.
    #[must_use]
    pub fn new(file: PathBuf, error: &IacCanonError) -> Self {
        Self {
            file,
            category: error.category().to_string(),
            message: error.to_string(),
        }
    }
}

/// The dialect a scan ran with.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DialectInfo {
    /// Registered dialect name
    pub name: String,

    /// Dialect version
    pub version: String,
}

/// Results from a scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanResult {
    /// Converted documents, in discovery order
    pub documents: Vec<CanonicalDocument>,

    /// Files that failed, in discovery order
    pub failures: Vec<FileFailure>,

    /// List of files that were scanned
    pub files_scanned: Vec<PathBuf>,

    /// Dialect used for the scan
    pub dialect: DialectInfo,
}

impl ScanResult {
    /// Merge another scan result into this one.
    pub fn merge(&mut self, other: Self) {
        self.documents.extend(other.documents);
        self.failures.extend(other.failures);
        self.files_scanned.extend(other.files_scanned);
        if self.dialect.name.is_empty() {
            self.dialect = other.dialect;
        }
    }

    /// Check if any file failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Look up the canonical value for `path`.
    #[must_use]
    pub fn document(&self, path: &std::path::Path) -> Option<&Value> {
        self.documents
            .iter()
            .find(|document| document.path == path)
            .map(|document| &document.value)
    }

    /// All resource records of the scan grouped by type. Within a type,
    /// records keep discovery and declaration order.
    #[must_use]
    pub fn resource_configs(&self) -> AllResourceConfigs {
        let mut all = AllResourceConfigs::new();
        for resource in self.documents.iter().flat_map(|document| &document.resources) {
            all.entry(resource.resource_type.clone())
                .or_default()
                .push(resource.clone());
        }
        all
    }
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum ReportFormat {
    /// JSON format
    #[default]
    Json,
    /// YAML format
    Yaml,
    /// Plain text summary
    Text,
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Yaml => write!(f, "yaml"),
            Self::Text => write!(f, "text"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(path: &str) -> CanonicalDocument {
        CanonicalDocument {
            path: PathBuf::from(path),
            value: json!({"file": path}),
            resources: vec![],
        }
    }

    fn resource(resource_type: &str, name: &str, source: &str, line: usize) -> ResourceConfig {
        ResourceConfig {
            id: format!("{resource_type}.{name}"),
            name: name.to_string(),
            resource_type: resource_type.to_string(),
            source: PathBuf::from(source),
            line,
            config: json!({}),
        }
    }

    #[test]
    fn test_failure_records_category() {
        let error = crate::err!(NestingTooDeep { limit: 8 });
        let failure = FileFailure::new(PathBuf::from("deep.tf"), &error);

        assert_eq!(failure.category, "structural");
        assert!(failure.message.contains("limit of 8"));
    }

    #[test]
    fn test_merge_keeps_order() {
        let mut result = ScanResult {
            documents: vec![document("a.tf")],
            files_scanned: vec![PathBuf::from("a.tf")],
            ..Default::default()
        };
        let other = ScanResult {
            documents: vec![document("b.tf")],
            files_scanned: vec![PathBuf::from("b.tf")],
            dialect: DialectInfo {
                name: "terraform".to_string(),
                version: "v14".to_string(),
            },
            ..Default::default()
        };

        result.merge(other);

        assert_eq!(result.documents.len(), 2);
        assert_eq!(result.documents[1].path, PathBuf::from("b.tf"));
        assert_eq!(result.dialect.version, "v14");
        assert!(!result.has_failures());
        assert_eq!(
            result.document(std::path::Path::new("a.tf")),
            Some(&json!({"file": "a.tf"}))
        );
    }

    #[test]
    fn test_resource_configs_group_by_type() {
        let mut first = document("a.tf");
        first.resources = vec![
            resource("aws_s3_bucket", "logs", "a.tf", 3),
            resource("aws_instance", "web", "a.tf", 9),
        ];
        let mut second = document("b.tf");
        second.resources = vec![resource("aws_s3_bucket", "data", "b.tf", 1)];

        let result = ScanResult {
            documents: vec![first, second],
            ..Default::default()
        };
        let all = result.resource_configs();

        assert_eq!(all.keys().collect::<Vec<_>>(), vec!["aws_instance", "aws_s3_bucket"]);
        let buckets: Vec<&str> = all["aws_s3_bucket"].iter().map(|r| r.id.as_str()).collect();
        assert_eq!(buckets, vec!["aws_s3_bucket.logs", "aws_s3_bucket.data"]);
    }

    #[test]
    fn test_resource_config_serializes_type_field() {
        let value = serde_json::to_value(resource("aws_instance", "web", "main.tf", 4)).unwrap();
        assert_eq!(value["type"], "aws_instance");
        assert_eq!(value["line"], 4);
        assert!(value.get("resource_type").is_none());
    }

    #[test]
    fn test_report_format_display() {
        assert_eq!(ReportFormat::Json.to_string(), "json");
        assert_eq!(ReportFormat::Yaml.to_string(), "yaml");
        assert_eq!(ReportFormat::Text.to_string(), "text");
    }
}
