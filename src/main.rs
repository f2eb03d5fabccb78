mod cli;
mod error;
mod export;
mod fmt;
mod formats;
mod importer;
mod logging;
mod models;
mod normalize;
mod reconciler;
mod reports;
mod settings;

use clap::Parser;

use cli::{Cli, Commands};
use settings::{load_settings, RunContext};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init {
            output_dir,
            log_dir,
            aggregator,
            details,
        } => {
            logging::init(None, cli.verbose);
            cli::init::run(output_dir, log_dir, aggregator, details)
        }
        Commands::Run {
            aggregator,
            details,
            output,
        } => {
            let settings = load_settings();
            let ctx = RunContext::new(&settings, output.as_deref(), cli.verbose);
            logging::init(Some(&ctx.log_dir), ctx.verbosity);
            cli::reconcile::run(&ctx, &settings, aggregator.as_deref(), details.as_deref())
        }
        Commands::Detect { file } => {
            logging::init(None, cli.verbose);
            cli::detect::run(&file)
        }
        Commands::Formats { key } => cli::formats::run(key.as_deref()),
    };

    if let Err(e) = result {
        tracing::debug!("Run failed: {e:?}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
