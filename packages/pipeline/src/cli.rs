//! Command-line interface for the charter parser.

use std::path::PathBuf;
use std::time::Instant;

use charter_layout::JsonLayoutSource;
use clap::{Parser, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use strum::AsRefStr;

use crate::config::{OracleConfig, PipelineConfig};
use crate::error::{PipelineError, Result};
use crate::oracle::AnthropicClient;
use crate::output::{write_outputs, RunReport, DEFAULT_OUTPUT_PATH};
use crate::pipeline::ClausePipeline;

/// Charter Parser - Extract clauses from charter party layout documents.
#[derive(Debug, Parser)]
#[command(name = "charter-parser")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Layout JSON of the charter party
    pub input: PathBuf,

    /// Where to write the extracted clauses
    #[arg(short, long, default_value = DEFAULT_OUTPUT_PATH)]
    pub output: PathBuf,

    /// Also write a JSON run report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Log level, overridden by RUST_LOG
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Run the CLI with already parsed arguments.
pub fn run(cli: Cli) -> Result<()> {
    if !cli.input.exists() {
        return Err(PipelineError::InputNotFound(cli.input));
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(parse_command(&cli))
}

/// Execute a full parse of `cli.input`.
async fn parse_command(cli: &Cli) -> Result<()> {
    let oracle = OracleConfig::from_env()?;
    let config = PipelineConfig::from_env();
    let client = AnthropicClient::new(&oracle)?;
    let pipeline = ClausePipeline::new(client, oracle, config);

    println!(
        "{} {}",
        style("Parsing").bold(),
        style(cli.input.display()).cyan()
    );
    println!();

    let started = Instant::now();

    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message("Segmenting, enumerating and extracting clauses...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let output = match pipeline.run(&cli.input, &JsonLayoutSource).await {
        Ok(output) => output,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };

    pb.set_message("Saving clauses...");
    let elapsed = started.elapsed().as_secs_f64();

    let report = cli
        .report
        .as_deref()
        .map(|path| (path, RunReport::new(&cli.input, &output, elapsed)));
    let saved = write_outputs(
        &cli.output,
        &output.clauses,
        report.as_ref().map(|(path, report)| (*path, report)),
    );
    pb.finish_and_clear();
    saved?;

    println!("  Sections: {}", output.sections.len());
    println!("  Enumeration attempts: {}", output.enumeration_attempts);
    println!("  Clauses: {}", style(output.clauses.len()).green());
    if output.failed_extractions > 0 {
        println!(
            "  Failed extractions: {}",
            style(output.failed_extractions).yellow().bold()
        );
    }
    println!(
        "  Tokens: {} in / {} out",
        output.token_usage.input_tokens, output.token_usage.output_tokens
    );
    println!();
    println!(
        "{} {} ({elapsed:.1}s)",
        style("Saved to:").green().bold(),
        cli.output.display()
    );
    if let Some(report_path) = &cli.report {
        println!("{} {}", style("Report:").green().bold(), report_path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_defaults() {
        let cli = Cli::parse_from(["charter-parser", "charter.json"]);

        assert_eq!(cli.input, PathBuf::from("charter.json"));
        assert_eq!(cli.output, PathBuf::from("output/clauses.json"));
        assert!(cli.report.is_none());
        assert_eq!(cli.log_level, LogLevel::Info);
    }

    #[test]
    fn test_cli_parse_options() {
        let cli = Cli::parse_from([
            "charter-parser",
            "charter.json",
            "-o",
            "out/c.json",
            "--report",
            "out/report.json",
            "--log-level",
            "debug",
        ]);

        assert_eq!(cli.output, PathBuf::from("out/c.json"));
        assert_eq!(cli.report, Some(PathBuf::from("out/report.json")));
        assert_eq!(cli.log_level.as_ref(), "debug");
    }

    #[test]
    fn test_cli_rejects_unknown_log_level() {
        assert!(Cli::try_parse_from(["charter-parser", "charter.json", "--log-level", "loud"]).is_err());
    }

    #[test]
    fn test_run_missing_input() {
        let cli = Cli::parse_from(["charter-parser", "/nonexistent/charter.json"]);
        assert!(matches!(run(cli), Err(PipelineError::InputNotFound(_))));
    }
}
