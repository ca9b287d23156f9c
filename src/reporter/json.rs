//! JSON report generator.

use crate::config::Config;
use crate::error::Result;
use crate::reporter::{CanonicalReport, ReportGenerator};
use crate::types::ScanResult;

/// JSON report generator.
pub struct JsonReporter {
    /// Whether to pretty-print the output
    pretty: bool,
}

impl JsonReporter {
    /// Create a new JSON reporter.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            pretty: config.output.pretty,
        }
    }
}

impl ReportGenerator for JsonReporter {
    fn generate(&self, result: &ScanResult) -> Result<String> {
        let report = CanonicalReport::from(result);

        let json = if self.pretty {
            serde_json::to_string_pretty(&report)
        } else {
            serde_json::to_string(&report)
        };

        json.map_err(|e| crate::err!(ReportGeneration {
            message: format!("Failed to serialize JSON report: {e}"),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::test_support::sample_result;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_json_report_generation() {
        let reporter = JsonReporter::new(&Config::default());
        let json = reporter.generate(&sample_result()).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert!(parsed["metadata"]["version"].is_string());
        assert_eq!(parsed["metadata"]["dialect"], "terraform");
        assert_eq!(parsed["metadata"]["files_scanned"], 3);
        assert_eq!(
            parsed["documents"]["stack/main.tf"],
            json!({"provider": {"aws": {"region": "${var.region}"}}})
        );
        assert_eq!(parsed["failures"][0]["category"], "upstream");
    }

    #[test]
    fn test_json_report_groups_resources() {
        let reporter = JsonReporter::new(&Config::default());
        let parsed: serde_json::Value =
            serde_json::from_str(&reporter.generate(&sample_result()).unwrap()).unwrap();

        assert_eq!(
            parsed["resources"]["aws_vpc"][0],
            json!({
                "id": "aws_vpc.main",
                "name": "main",
                "type": "aws_vpc",
                "source": "stack/network.tf",
                "line": 1,
                "config": {"cidr_block": "10.0.0.0/16"}
            })
        );
    }

    #[test]
    fn test_json_report_sorted_paths() {
        let reporter = JsonReporter::new(&Config::default());
        let json = reporter.generate(&sample_result()).unwrap();

        let main = json.find("stack/main.tf\": {").unwrap();
        let network = json.find("stack/network.tf\": {").unwrap();
        assert!(main < network);
    }

    #[test]
    fn test_json_report_pretty() {
        let mut config = Config::default();

        config.output.pretty = true;
        let pretty = JsonReporter::new(&config).generate(&sample_result()).unwrap();
        assert!(pretty.contains('\n'));

        config.output.pretty = false;
        let compact = JsonReporter::new(&config).generate(&sample_result()).unwrap();
        assert!(!compact.contains('\n'));
    }

    #[test]
    fn test_json_report_is_deterministic() {
        let reporter = JsonReporter::new(&Config::default());
        assert_eq!(
            reporter.generate(&sample_result()).unwrap(),
            reporter.generate(&sample_result()).unwrap()
        );
    }
}
