use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::slack::ExecutionKind;

pub mod formatters;

#[derive(Parser)]
#[command(name = "folio")]
#[command(
    version,
    about = "Portfolio monitoring bot with spreadsheet holdings and Slack reports"
)]
#[command(
    long_about = "Pull held securities from a spreadsheet, fetch current market prices, analyze weights, P&L, volatility and concentration, and deliver the report (plus an AI-generated narrative) to a Slack channel."
)]
pub struct Cli {
    /// Path to the TOML config file (default: platform config dir)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Read holdings from a local CSV file instead of Google Sheets
    #[arg(long, global = true, value_name = "FILE")]
    pub holdings_csv: Option<PathBuf>,

    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline: fetch, analyze, advise, deliver to Slack
    Run {
        /// Report cadence shown in the delivery header
        #[arg(long, value_enum, default_value_t = Execution::Daily)]
        execution: Execution,

        /// Analyze and print without posting to Slack
        #[arg(long)]
        skip_notify: bool,
    },

    /// Fetch and analyze, print the report and holdings table locally
    Report,

    /// Show the parsed holdings list (source debugging)
    Holdings,

    /// Fetch and display quotes for the given symbols
    Quotes {
        /// Symbols to quote (e.g. AAPL 7203.T)
        #[arg(required = true)]
        symbols: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Execution {
    Daily,
    Monthly,
}

impl From<Execution> for ExecutionKind {
    fn from(execution: Execution) -> Self {
        match execution {
            Execution::Daily => ExecutionKind::Daily,
            Execution::Monthly => ExecutionKind::Monthly,
        }
    }
}
