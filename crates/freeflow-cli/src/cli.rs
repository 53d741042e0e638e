//! CLI argument definitions for freeflow.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `fcf` | Resolve free cash flow TTM for one or more symbols |
//! | `aliases` | Print the effective statement alias table |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--source` | `yahoo` | Statement provider |
//! | `--fixture` | | Fixture file, required for `--source fixture` |
//! | `--aliases` | built-in | Alias table JSON file |
//! | `--timeout-ms` | `3000` | Per-fetch timeout in ms |
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Treat notes and errors as failures |
//! | `--explain` | `false` | Show error detail in table output |
//! | `-v` | | Raise log verbosity (repeatable) |
//!
//! # Examples
//!
//! ```bash
//! freeflow fcf AAPL MSFT --format table
//! freeflow fcf IBM --source alphavantage --pretty
//! freeflow fcf AAPL --source fixture --fixture statements.json
//! FREEFLOW_LOG=freeflow_core=debug freeflow fcf AAPL
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use freeflow_core::ProviderId;

/// Free cash flow TTM from public statement providers.
#[derive(Debug, Parser)]
#[command(
    name = "freeflow",
    author,
    version,
    about = "Free cash flow TTM from public statement providers",
    long_about = "freeflow resolves trailing-twelve-month free cash flow for listed \
companies. Quarterly statements are preferred; when they are not usable the \
result falls back to annual data and says so in a note.\n\
\n\
Use 'freeflow <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Statement provider.
    #[arg(long, global = true, value_enum, default_value_t = SourceSelector::Yahoo)]
    pub source: SourceSelector,

    /// Fixture file with recorded statements (for `--source fixture`).
    #[arg(long, global = true)]
    pub fixture: Option<PathBuf>,

    /// Alias table JSON file replacing the built-in field aliases.
    #[arg(long, global = true)]
    pub aliases: Option<PathBuf>,

    /// Per-fetch timeout budget in milliseconds.
    #[arg(long, global = true, default_value_t = 3000)]
    pub timeout_ms: u64,

    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Treat notes and errors as failures (exit code 5).
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Print error detail below the table.
    #[arg(long, global = true, default_value_t = false)]
    pub explain: bool,

    /// Increase log verbosity (-v debug, -vv trace). `FREEFLOW_LOG` wins.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON envelope.
    Json,
    /// Terminal table with compact values.
    Table,
}

/// Statement provider selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceSelector {
    /// Yahoo Finance fundamentals time series.
    Yahoo,
    /// Alpha Vantage CASH_FLOW (`FREEFLOW_ALPHAVANTAGE_API_KEY`).
    Alphavantage,
    /// Recorded statements from `--fixture`.
    Fixture,
}

impl SourceSelector {
    pub const fn provider_id(self) -> ProviderId {
        match self {
            Self::Yahoo => ProviderId::Yahoo,
            Self::Alphavantage => ProviderId::Alphavantage,
            Self::Fixture => ProviderId::Fixture,
        }
    }
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve free cash flow TTM for one or more symbols.
    ///
    /// # Examples
    ///
    ///   freeflow fcf AAPL
    ///   freeflow fcf AAPL MSFT GOOGL --format table
    Fcf(FcfArgs),

    /// Print the effective alias table as JSON.
    Aliases,
}

/// Arguments for the `fcf` command.
#[derive(Debug, Args)]
pub struct FcfArgs {
    /// One or more market symbols (e.g., AAPL, MSFT, BRK.B).
    #[arg(required = true, num_args = 1..)]
    pub symbols: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "freeflow", "fcf", "AAPL", "MSFT", "--source", "fixture", "--fixture", "f.json",
            "--format", "table", "-vv",
        ])
        .expect("valid arguments");

        assert_eq!(cli.source, SourceSelector::Fixture);
        assert_eq!(cli.format, OutputFormat::Table);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.timeout_ms, 3000);
        match cli.command {
            Command::Fcf(args) => assert_eq!(args.symbols, vec!["AAPL", "MSFT"]),
            Command::Aliases => panic!("expected fcf"),
        }
    }

    #[test]
    fn fcf_requires_a_symbol() {
        assert!(Cli::try_parse_from(["freeflow", "fcf"]).is_err());
    }
}
