pub mod detect;
pub mod formats;
pub mod init;
pub mod reconcile;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "reconcile",
    version,
    about = "Reconcile bank and card exports against an aggregator ledger."
)]
pub struct Cli {
    /// Increase console logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Save default directories and inputs to the settings file.
    Init {
        /// Where reconciled output is written
        #[arg(long = "output-dir")]
        output_dir: Option<String>,
        /// Where run logs are written
        #[arg(long = "log-dir")]
        log_dir: Option<String>,
        /// Default aggregator ledger CSV
        #[arg(long)]
        aggregator: Option<String>,
        /// Default folder of detail exports
        #[arg(long)]
        details: Option<String>,
    },
    /// Match detail exports against the aggregator ledger and write the results.
    Run {
        /// Aggregator ledger CSV (default: "aggregator" from settings)
        #[arg(long)]
        aggregator: Option<String>,
        /// Folder of per-institution CSV exports (default: "details_dir" from settings)
        #[arg(long)]
        details: Option<String>,
        /// Output directory (default: "output_dir" from settings)
        #[arg(long)]
        output: Option<String>,
    },
    /// Show which export format a CSV file is recognized as.
    Detect {
        /// Path to a CSV file
        file: String,
    },
    /// List supported export formats in detection order.
    Formats {
        /// Show a single format by key (e.g. capital_one)
        key: Option<String>,
    },
}
