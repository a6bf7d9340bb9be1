mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::evaluate::EvaluateArgs;
use commands::margin_of_safety::MosRequestArgs;
use commands::registry::{DefaultsArgs, ModelsArgs};
use commands::sync::SyncArgs;
use commands::tables::{CagrArgs, ClassifyArgs, LadderArgs};

/// Stock fair-value models with decimal precision
#[derive(Parser)]
#[command(
    name = "fairval",
    version,
    about = "Stock fair-value models with decimal precision",
    long_about = "A CLI for estimating a stock's fair value with DCF, Ben Graham, \
                  Peter Lynch, Rule #1, Ten Cap and Price-to-FCF models, and for \
                  keeping inputs shared between models in sync."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log evaluation details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one model's inputs
    Evaluate(EvaluateArgs),
    /// Apply one field edit and propagate it to the other models
    Sync(SyncArgs),
    /// Print default inputs
    Defaults(DefaultsArgs),
    /// Classify a percentage difference or a cap rate
    Classify(ClassifyArgs),
    /// Margin-of-safety price ladder
    Ladder(LadderArgs),
    /// Required CAGR from buy prices to a future price
    Cagr(CagrArgs),
    /// List the shared field groups
    Groups,
    /// Validate margin-of-safety inputs and print the prediction request
    MosRequest(MosRequestArgs),
    /// List the models, or one model's input fields
    Models(ModelsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    logging::init_cli_logger(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Evaluate(args) => commands::evaluate::run_evaluate(args),
        Commands::Sync(args) => commands::sync::run_sync(args),
        Commands::Defaults(args) => commands::registry::run_defaults(args),
        Commands::Classify(args) => commands::tables::run_classify(args),
        Commands::Ladder(args) => commands::tables::run_ladder(args),
        Commands::Cagr(args) => commands::tables::run_cagr(args),
        Commands::Groups => commands::registry::run_groups(),
        Commands::MosRequest(args) => commands::margin_of_safety::run_mos_request(args),
        Commands::Models(args) => commands::registry::run_models(args),
        Commands::Version => {
            println!("fairval {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
