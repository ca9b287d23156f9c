//! iac-canon CLI entry point.
//!
//! This binary provides the command-line interface for iac-canon.

use clap::Parser;
use comfy_table::{ContentArrangement, Table};
use iac_canon::cli::{Cli, Commands, ConvertArgs};
use iac_canon::reporter::Reporter;
use iac_canon::{Config, DialectRegistry, Scanner};
use std::error::Error;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Exit code when at least one file failed to convert.
const EXIT_CONVERSION_FAILURES: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");

            eprintln!("Error: {e}");

            let mut source = e.source();
            if source.is_some() {
                eprintln!("\nCaused by:");
                let mut i = 0;
                while let Some(cause) = source {
                    eprintln!("  {i}: {cause}");
                    source = cause.source();
                    i += 1;
                }
            }

            ExitCode::from(1)
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let base_level = match verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            };
            // Our crate at the requested level, everything else at warn.
            EnvFilter::new(format!("warn,iac_canon={base_level}"))
        })
    };

    // Logs go to stderr so stdout carries only the report.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Commands::Convert(args) => {
            let mut config = Config::discover(cli.config.as_deref())?;
            config.merge_cli_args(&args);
            config.validate()?;
            convert(config, args).await
        }

        Commands::Dialects => {
            let registry = DialectRegistry::builtin();
            let mut table = Table::new();
            table
                .load_preset(comfy_table::presets::UTF8_BORDERS_ONLY)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["Dialect", "Version", "Default"]);
            for (name, version, is_default) in registry.entries() {
                table.add_row(vec![name, version, if is_default { "yes" } else { "" }]);
            }
            println!("{table}");
            Ok(ExitCode::SUCCESS)
        }

        Commands::Init => {
            let config_path = Path::new("iac-canon.yaml");
            if config_path.exists() {
                anyhow::bail!("Configuration file already exists: {}", config_path.display());
            }

            std::fs::write(config_path, Config::example_yaml())?;
            println!("Created example configuration: {}", config_path.display());
            Ok(ExitCode::SUCCESS)
        }

        Commands::Validate(args) => match Config::from_file(&args.config) {
            Ok(config) => {
                // The dialect must also resolve, not just parse.
                if let Err(e) = Scanner::new(config) {
                    eprintln!("Configuration error: {e}");
                    return Ok(ExitCode::from(1));
                }
                println!("Configuration is valid: {}", args.config.display());
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                eprintln!("Configuration error: {e}");
                Ok(ExitCode::from(1))
            }
        },
    }
}

async fn convert(config: Config, args: ConvertArgs) -> anyhow::Result<ExitCode> {
    tracing::debug!(paths = args.paths.len(), format = %args.format, "Executing convert command");

    let scanner = Scanner::new(config.clone())?;
    let result = scanner.scan_paths(args.paths.as_slice()).await?;

    let report = Reporter::new(&config).generate(&result, args.format)?;

    if let Some(output_path) = args.output {
        std::fs::write(&output_path, &report)?;
        tracing::info!(path = %output_path.display(), "Report written");
    } else {
        println!("{report}");
    }

    if result.has_failures() {
        Ok(ExitCode::from(EXIT_CONVERSION_FAILURES))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
