//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Report format printed after the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored tables per model and scenario
    Text,
    /// The aggregate record as JSON
    Json,
}

/// CLI arguments for bizeval
#[derive(Parser, Debug)]
#[command(name = "bizeval")]
#[command(author, version, about = "Benchmark models on multi-turn, tool-augmented business conversations")]
#[command(long_about = r#"
bizeval drives each configured model through scripted business scenarios,
lets it call simulated tools (knowledge base, product catalog, pricing
calculator, scheduler), and scores every conversation on five dimensions:
response quality, business value, communication style, tool usage and
performance.

Configuration files are loaded from (in priority order):
1. BIZEVAL_* environment variables
2. --config <path>     Explicit config file
3. ./bizeval.toml      Project-level config
4. ~/.config/bizeval/config.toml   Global config

Example:
  bizeval --dry-run
  bizeval -m gpt-4o-mini -s product_inquiry --runs 5
  bizeval --error-rate scheduler=0.2 --output results.jsonl
"#)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Configured models to evaluate (can be specified multiple times; default: all)
    #[arg(short, long, value_name = "MODEL")]
    pub model: Vec<String>,

    /// Scenarios to run (can be specified multiple times; default: all)
    #[arg(short, long, value_name = "SCENARIO")]
    pub scenario: Vec<String>,

    /// Directory of additional scenario JSON files
    #[arg(long, value_name = "DIR")]
    pub scenario_dir: Option<PathBuf>,

    /// Runs per model and scenario
    #[arg(long, value_name = "N")]
    pub runs: Option<usize>,

    /// Units evaluated at once
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Per-unit timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Seed for tool failure injection
    #[arg(long)]
    pub seed: Option<u64>,

    /// Tool failure probability, as TOOL=RATE (can be specified multiple times)
    #[arg(long, value_name = "TOOL=RATE", value_parser = parse_error_rate)]
    pub error_rate: Vec<(String, f64)>,

    /// Write run, failure and aggregate records to a JSONL file
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// List available scenarios and exit
    #[arg(long)]
    pub list_scenarios: bool,

    /// Evaluate an offline scripted model instead of the configured ones
    #[arg(long)]
    pub dry_run: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Write diagnostic logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

/// Parse `TOOL=RATE`
fn parse_error_rate(s: &str) -> Result<(String, f64), String> {
    let (tool, rate) = s
        .split_once('=')
        .ok_or_else(|| format!("expected TOOL=RATE, got '{}'", s))?;
    let tool = tool.trim();
    if tool.is_empty() {
        return Err("tool name cannot be empty".to_string());
    }
    let rate: f64 = rate
        .trim()
        .parse()
        .map_err(|_| format!("invalid rate '{}'", rate))?;
    Ok((tool.to_string(), rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_full_invocation() {
        let cli = Cli::try_parse_from([
            "bizeval",
            "-m",
            "gpt-4o-mini",
            "-m",
            "local",
            "-s",
            "product_inquiry",
            "--runs",
            "5",
            "--concurrency",
            "2",
            "--error-rate",
            "scheduler=0.25",
            "--format",
            "json",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.model, vec!["gpt-4o-mini", "local"]);
        assert_eq!(cli.scenario, vec!["product_inquiry"]);
        assert_eq!(cli.runs, Some(5));
        assert_eq!(cli.concurrency, Some(2));
        assert_eq!(cli.error_rate, vec![("scheduler".to_string(), 0.25)]);
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert_eq!(cli.verbose, 2);
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_error_rate_parser() {
        assert_eq!(
            parse_error_rate("knowledge_base = 0.5").unwrap(),
            ("knowledge_base".to_string(), 0.5)
        );
        assert!(parse_error_rate("scheduler").is_err());
        assert!(parse_error_rate("=0.1").is_err());
        assert!(parse_error_rate("scheduler=often").is_err());
    }
}
