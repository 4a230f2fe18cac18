mod config;
mod decode;
mod encode;
mod output;
mod random;
mod solve;

use config::PacksatConfig;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "packsat")]
#[command(about = "Orthogonal bin packing through SAT")]
#[command(version)]
struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decide whether the items of an instance fit into its container
    Solve(solve::SolveArgs),

    /// Build the formula for an instance and optionally export it as DIMACS
    Encode(encode::EncodeArgs),

    /// Turn the answer of an external solver into a packing
    Decode(decode::DecodeArgs),

    /// Solve a batch of random instances
    Random(random::RandomArgs),
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    // RUST_LOG wins over the flag
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env()
        .init();
}

fn run() -> Result<i32> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = PacksatConfig::load_from_cwd()?;
    if let Some(path) = config.as_ref().and_then(|c| c.path.as_ref()) {
        log::info!("Using configuration {}", path.display());
    }

    match args.command {
        Commands::Solve(args) => solve::execute(args, config.as_ref()),
        Commands::Encode(args) => encode::execute(args),
        Commands::Decode(args) => decode::execute(args),
        Commands::Random(args) => random::execute(args, config.as_ref()),
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            eprintln!("Error: {}", e);
            for cause in e.chain().skip(1) {
                eprintln!("  Caused by: {}", cause);
            }
            ExitCode::FAILURE
        }
    }
}
