//! Integration tests for iac-canon.
//!
//! These tests verify the end-to-end functionality of the scanner,
//! dialect adapters, conversion engine, reporters and binary.

use iac_canon::{Config, Scanner};
use serde_json::json;
use std::path::PathBuf;

/// Get the path to the test fixtures directory.
fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

mod scanner_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_convert_simple_stack() {
        let scanner = Scanner::new(Config::default()).unwrap();
        let root = fixtures_path().join("simple");
        let result = scanner.scan_path(&root).await.unwrap();

        // README.md is not a Terraform file.
        assert_eq!(result.files_scanned.len(), 2);
        assert!(result.failures.is_empty());

        // Compared as parsed values, so whitespace and key order in the
        // checked-in file do not matter.
        let expected: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(fixtures_path().join("expected/simple_main.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(result.document(&root.join("main.tf")), Some(&expected));
    }

    #[tokio::test]
    async fn test_repeated_nested_blocks() {
        let scanner = Scanner::new(Config::default()).unwrap();
        let root = fixtures_path().join("simple");
        let result = scanner.scan_path(&root).await.unwrap();

        let network = result.document(&root.join("network.tf")).unwrap();
        assert_eq!(
            network,
            &json!({
                "resource": {
                    "aws_security_group": {
                        "web": {
                            "name": "web-${var.env}",
                            "description": "${var.prod ? \"production\" : \"staging\"}",
                            "ingress": [
                                {"from_port": 443, "to_port": 443, "cidr_blocks": ["0.0.0.0/0"]},
                                {"from_port": 22, "to_port": 22, "cidr_blocks": ["${var.admin_cidr}"]}
                            ]
                        }
                    }
                }
            })
        );
    }

    #[tokio::test]
    async fn test_templates() {
        let scanner = Scanner::new(Config::default()).unwrap();
        let root = fixtures_path().join("templates");
        let result = scanner.scan_path(&root).await.unwrap();

        let locals = &result.document(&root.join("user_data.tf")).unwrap()["locals"][0];
        assert_eq!(
            locals,
            &json!({
                "greeting": "Hello, %{if var.name != \"\"}${var.name}%{else}stranger%{endif}!",
                "hosts": "%{for host in var.hosts}${host},%{endfor}",
                "mode": "mode-%{if var.strict}strict%{else}relaxed%{endif}",
                "port": 8080,
                "static": "plain text"
            })
        );
    }

    #[tokio::test]
    async fn test_resource_records() {
        let scanner = Scanner::new(Config::default()).unwrap();
        let root = fixtures_path().join("simple");
        let result = scanner.scan_path(&root).await.unwrap();

        let all = result.resource_configs();
        let records: Vec<(&str, PathBuf, usize)> = all
            .values()
            .flatten()
            .map(|resource| (resource.id.as_str(), resource.source.clone(), resource.line))
            .collect();
        assert_eq!(
            records,
            vec![
                ("aws_s3_bucket.logs", root.join("main.tf"), 14),
                ("aws_s3_bucket.data", root.join("main.tf"), 23),
                ("aws_security_group.web", root.join("network.tf"), 1),
            ]
        );

        let web = &all["aws_security_group"][0];
        assert_eq!(web.config["ingress"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let scanner = Scanner::new(Config::default()).unwrap();
        let root = fixtures_path().join("broken");
        let result = scanner.scan_path(&root).await.unwrap();

        assert_eq!(result.files_scanned.len(), 3);
        assert_eq!(result.documents.len(), 1);
        assert_eq!(
            result.document(&root.join("good.tf")),
            Some(&json!({"locals": [{"name": "ok"}]}))
        );

        let categories: Vec<(PathBuf, &str)> = result
            .failures
            .iter()
            .map(|failure| (failure.file.clone(), failure.category.as_str()))
            .collect();
        assert_eq!(
            categories,
            vec![
                (root.join("ambiguous.tf"), "structural"),
                (root.join("invalid.tf"), "upstream"),
            ]
        );
    }

    #[tokio::test]
    async fn test_fail_fast_aborts() {
        let mut config = Config::default();
        config.scan.continue_on_error = false;
        let scanner = Scanner::new(config).unwrap();

        assert!(scanner.scan_path(fixtures_path().join("broken")).await.is_err());
    }

    #[tokio::test]
    async fn test_exclude_patterns() {
        let mut config = Config::default();
        config.scan.exclude_patterns.push("network.tf".to_string());
        let scanner = Scanner::new(config).unwrap();

        let result = scanner.scan_path(fixtures_path().join("simple")).await.unwrap();
        assert_eq!(result.files_scanned.len(), 1);
    }

    #[tokio::test]
    async fn test_scan_single_file() {
        let scanner = Scanner::new(Config::default()).unwrap();
        let file = fixtures_path().join("simple").join("network.tf");

        let result = scanner.scan_path(&file).await.unwrap();
        assert_eq!(result.files_scanned, vec![file]);
        assert_eq!(result.documents.len(), 1);
    }

    #[tokio::test]
    async fn test_dialect_versions_agree() {
        let mut config = Config::default();
        config.dialect.version = Some("v12".to_string());
        let legacy = Scanner::new(config).unwrap();
        let current = Scanner::new(Config::default()).unwrap();

        let root = fixtures_path().join("simple");
        let legacy_result = legacy.scan_path(&root).await.unwrap();
        let current_result = current.scan_path(&root).await.unwrap();

        assert_eq!(legacy_result.dialect.version, "v12");
        assert_eq!(current_result.dialect.version, "v14");
        assert_eq!(legacy_result.documents, current_result.documents);
    }

    #[tokio::test]
    async fn test_conversion_is_deterministic() {
        let scanner = Scanner::new(Config::default()).unwrap();
        let root = fixtures_path().join("simple");

        let first = scanner.scan_path(&root).await.unwrap();
        let second = scanner.scan_path(&root).await.unwrap();
        assert_eq!(
            first.generate_report(iac_canon::ReportFormat::Json).unwrap(),
            second.generate_report(iac_canon::ReportFormat::Json).unwrap()
        );
    }
}

mod reporter_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use iac_canon::reporter::Reporter;
    use iac_canon::ReportFormat;

    #[tokio::test]
    async fn test_json_report_from_scan() {
        let scanner = Scanner::new(Config::default()).unwrap();
        let root = fixtures_path().join("broken");
        let result = scanner.scan_path(&root).await.unwrap();

        let report = Reporter::new(&Config::default())
            .generate(&result, ReportFormat::Json)
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&report).unwrap();

        assert_eq!(parsed["metadata"]["dialect"], "terraform");
        assert_eq!(parsed["metadata"]["files_scanned"], 3);
        assert_eq!(parsed["failures"].as_array().unwrap().len(), 2);

        assert!(parsed["resources"].as_object().unwrap().is_empty());

        let key = root.join("good.tf").to_string_lossy().to_string();
        assert_eq!(parsed["documents"][key.as_str()], json!({"locals": [{"name": "ok"}]}));
    }

    #[tokio::test]
    async fn test_yaml_report_from_scan() {
        let scanner = Scanner::new(Config::default()).unwrap();
        let result = scanner.scan_path(fixtures_path().join("simple")).await.unwrap();

        let report = Reporter::new(&Config::default())
            .generate(&result, ReportFormat::Yaml)
            .unwrap();
        assert!(report.contains("metadata:"));
        assert!(report.contains("${var.region}"));
    }
}

mod cli_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use assert_cmd::Command;
    use predicates::prelude::*;

    fn iac_canon() -> Command {
        let mut cmd = Command::cargo_bin("iac-canon").unwrap();
        cmd.env_remove("IAC_CANON_CONFIG").env_remove("RUST_LOG");
        cmd
    }

    #[test]
    fn test_convert_success() {
        let output = iac_canon()
            .arg("convert")
            .arg(fixtures_path().join("simple"))
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();

        let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(parsed["documents"].as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_convert_with_failures_exits_2() {
        iac_canon()
            .arg("convert")
            .arg(fixtures_path().join("broken"))
            .assert()
            .code(2)
            .stdout(predicate::str::contains("\"structural\""));
    }

    #[test]
    fn test_convert_fail_fast_exits_1() {
        iac_canon()
            .arg("convert")
            .arg(fixtures_path().join("broken"))
            .arg("--fail-fast")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Error:"));
    }

    #[test]
    fn test_convert_text_format() {
        iac_canon()
            .args(["convert", "--format", "text"])
            .arg(fixtures_path().join("simple"))
            .env("NO_COLOR", "1")
            .assert()
            .success()
            .stdout(predicate::str::contains("2 converted"));
    }

    #[test]
    fn test_convert_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("canonical.yaml");

        iac_canon()
            .args(["convert", "--format", "yaml", "--output"])
            .arg(&output)
            .arg(fixtures_path().join("simple"))
            .assert()
            .success();

        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.contains("aws_security_group"));
    }

    #[test]
    fn test_unknown_dialect_exits_1() {
        iac_canon()
            .args(["convert", "--dialect", "pulumi"])
            .arg(fixtures_path().join("simple"))
            .assert()
            .code(1)
            .stderr(predicate::str::contains("pulumi"));
    }

    #[test]
    fn test_dialects_lists_terraform() {
        iac_canon()
            .arg("dialects")
            .assert()
            .success()
            .stdout(predicate::str::contains("terraform").and(predicate::str::contains("v14")));
    }

    #[test]
    fn test_init_and_validate() {
        let dir = tempfile::tempdir().unwrap();

        iac_canon().current_dir(dir.path()).arg("init").assert().success();
        assert!(dir.path().join("iac-canon.yaml").exists());

        iac_canon()
            .current_dir(dir.path())
            .arg("validate")
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration is valid"));

        // A second init refuses to overwrite.
        iac_canon().current_dir(dir.path()).arg("init").assert().code(1);
    }

    #[test]
    fn test_validate_rejects_bad_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("bad.yaml");
        std::fs::write(&config, "conversion:\n  max_nesting_depth: 0\n").unwrap();

        iac_canon()
            .arg("validate")
            .arg(&config)
            .assert()
            .code(1)
            .stderr(predicate::str::contains("max_nesting_depth"));
    }
}
