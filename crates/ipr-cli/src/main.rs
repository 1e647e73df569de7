//! # ipr CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ipr_cli::code::{run_code, CodeArgs};
use ipr_cli::fy::{run_fy, FyArgs};
use ipr_cli::vocab::{run_vocab, VocabArgs};

/// IPR registry operator CLI.
#[derive(Parser, Debug)]
#[command(name = "ipr", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Financial year for a date.
    Fy(FyArgs),

    /// Preview a reference code.
    Code(CodeArgs),

    /// List the seeded system vocabulary.
    Vocab(VocabArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Fy(args) => run_fy(&args),
        Commands::Code(args) => run_code(&args),
        Commands::Vocab(args) => run_vocab(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}
