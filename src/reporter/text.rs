//! Plain text report generator.

use crate::config::Config;
use crate::error::Result;
use crate::reporter::ReportGenerator;
use crate::types::ScanResult;
use colored::Colorize;
use comfy_table::{Cell, Color, ContentArrangement, Table};

/// Text report generator for CLI output.
pub struct TextReporter {
    /// Whether to use colors
    use_colors: bool,
}

impl TextReporter {
    /// Create a new text reporter.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            use_colors: config.output.colored,
        }
    }
}

impl ReportGenerator for TextReporter {
    fn generate(&self, result: &ScanResult) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header(result));
        output.push('\n');

        output.push_str(&self.format_summary(result));
        output.push('\n');

        if !result.failures.is_empty() {
            output.push_str(&self.format_failures(result));
            output.push('\n');
        }

        output.push_str(&self.format_footer(result));

        Ok(output)
    }
}

impl TextReporter {
    fn section_title(&self, title: &str) -> String {
        if self.use_colors {
            title.bright_cyan().bold().to_string()
        } else {
            title.to_string()
        }
    }

    /// Format the report header.
    fn format_header(&self, result: &ScanResult) -> String {
        let title = "iac-canon Conversion";
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));
        let dialect = format!("({} {})", result.dialect.name, result.dialect.version);

        if self.use_colors {
            format!(
                "\n{} {} {}\n{}\n",
                title.bright_white().bold(),
                version.dimmed(),
                dialect.dimmed(),
                "=".repeat(80).bright_blue(),
            )
        } else {
            format!("\n{title} {version} {dialect}\n{}\n", "=".repeat(80))
        }
    }

    /// Format the summary section.
    fn format_summary(&self, result: &ScanResult) -> String {
        let mut output = format!("\n{}\n{}\n", self.section_title("Summary"), "-".repeat(80));

        let converted = result.documents.len();
        let failed = result.failures.len();

        if self.use_colors {
            output.push_str(&format!(
                "  {} converted | {} failed\n",
                converted.to_string().green().bold(),
                if failed == 0 {
                    failed.to_string().normal()
                } else {
                    failed.to_string().red().bold()
                },
            ));
        } else {
            output.push_str(&format!("  {converted} converted | {failed} failed\n"));
        }

        let resources: usize = result.documents.iter().map(|document| document.resources.len()).sum();
        output.push_str(&format!("  {resources} resources\n"));
        output.push_str(&format!("  {} files scanned\n", result.files_scanned.len()));
        output
    }

    /// Format the failures table.
    fn format_failures(&self, result: &ScanResult) -> String {
        let mut output = format!("\n{}\n{}\n", self.section_title("Failures"), "-".repeat(80));

        let mut table = Table::new();
        table
            .load_preset(comfy_table::presets::UTF8_BORDERS_ONLY)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["File", "Category", "Message"]);

        for failure in &result.failures {
            let category = if self.use_colors {
                Cell::new(&failure.category).fg(Color::Red)
            } else {
                Cell::new(&failure.category)
            };
            table.add_row(vec![
                Cell::new(failure.file.display().to_string()),
                category,
                Cell::new(&failure.message),
            ]);
        }

        output.push_str(&table.to_string());
        output.push('\n');
        output
    }

    /// Format the report footer.
    fn format_footer(&self, result: &ScanResult) -> String {
        let status = if result.has_failures() {
            let text = format!("{} file(s) could not be converted", result.failures.len());
            if self.use_colors {
                text.red().bold().to_string()
            } else {
                text
            }
        } else if self.use_colors {
            "All files converted".green().bold().to_string()
        } else {
            "All files converted".to_string()
        };

        format!("\n{status}\n")
    }
}
