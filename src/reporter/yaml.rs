//! YAML report generator.

use crate::config::Config;
use crate::error::Result;
use crate::reporter::{CanonicalReport, ReportGenerator};
use crate::types::ScanResult;

/// YAML report generator.
pub struct YamlReporter;

impl YamlReporter {
    /// Create a new YAML reporter.
    #[must_use]
    pub const fn new(_config: &Config) -> Self {
        Self
    }
}

impl ReportGenerator for YamlReporter {
    fn generate(&self, result: &ScanResult) -> Result<String> {
        serde_yaml::to_string(&CanonicalReport::from(result)).map_err(|e| crate::err!(ReportGeneration {
            message: format!("Failed to serialize YAML report: {e}"),
        }))
    }
}
