//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Lexlink - Extract and validate statute interpretation links from case law.
#[derive(Debug, Parser)]
#[command(name = "lexlink")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true, default_value = "table")]
    pub format: CliFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (statute ids only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the extraction pipeline over a batch of paragraphs
    Run(RunArgs),

    /// Print a pipeline configuration as TOML
    Config(ConfigArgs),
}

/// Language model backend for the LLM-assisted phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProviderKind {
    /// OpenAI-compatible chat completions API
    Openai,
    /// Local Ollama server
    Ollama,
}

/// Arguments for the run command.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// JSON file holding an array of case paragraphs
    #[arg(short, long)]
    pub input: PathBuf,

    /// Pipeline configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory for the link, review and statistics artifacts
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Skip the LLM-assisted phase
    #[arg(long)]
    pub no_llm: bool,

    /// Spending ceiling for model calls (USD)
    #[arg(short, long)]
    pub budget: Option<f64>,

    /// Send at most this many paragraphs to the model
    #[arg(long)]
    pub max_llm_paragraphs: Option<usize>,

    /// Language model backend
    #[arg(long, value_enum, default_value = "openai", env = "LEXLINK_LLM_PROVIDER")]
    pub provider: ProviderKind,

    /// Model name
    #[arg(short, long, env = "LEXLINK_LLM_MODEL")]
    pub model: Option<String>,
}

/// Configuration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Preset {
    /// Balanced defaults
    Default,
    /// Higher thresholds, budget ceiling
    Strict,
    /// Lower thresholds, more retries
    Lenient,
}

/// Arguments for the config command.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    /// Preset to print
    #[arg(short, long, value_enum, default_value = "default")]
    pub preset: Preset,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "lexlink", "run", "--input", "paragraphs.json", "--no-llm", "--budget", "2.5",
            "--output-dir", "out",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.input, PathBuf::from("paragraphs.json"));
        assert!(args.no_llm);
        assert_eq!(args.budget, Some(2.5));
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
        assert_eq!(cli.format, CliFormat::Table);
    }

    #[test]
    fn test_parse_config_preset() {
        let cli = Cli::try_parse_from(["lexlink", "--format", "json", "config", "--preset", "strict"])
            .unwrap();
        assert_eq!(cli.format, CliFormat::Json);
        assert!(matches!(
            cli.command,
            Command::Config(ConfigArgs { preset: Preset::Strict })
        ));
    }

    #[test]
    fn test_run_requires_input() {
        assert!(Cli::try_parse_from(["lexlink", "run"]).is_err());
    }
}
