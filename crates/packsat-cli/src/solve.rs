//! Solve command - decide whether an instance packs.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use packsat_core::{Instance, Packer};

use crate::config::{PacksatConfig, SolverArgs, SolverSettings};
use crate::output;

#[derive(Args, Debug)]
pub struct SolveArgs {
    /// Instance file (.json, anything else is read as text)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[command(flatten)]
    pub solver: SolverArgs,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// List the variables that are true in the model
    #[arg(long)]
    pub show_model: bool,

    /// Disable progress output
    #[arg(long)]
    pub no_progress: bool,
}

pub fn execute(args: SolveArgs, config: Option<&PacksatConfig>) -> Result<i32> {
    let instance = Instance::load(&args.file)
        .with_context(|| format!("Failed to load instance {}", args.file.display()))?;

    let settings = SolverSettings::resolve(config, &args.solver);
    let packer = Packer::new(settings.solver()?).with_options(settings.options());

    if !args.json {
        output::print_instance(&instance);
    }

    let spinner = output::spinner(
        &format!("Solving with {}...", packer.solver_name()),
        args.json || args.no_progress,
    );
    let report = packer.pack(&instance);
    spinner.finish_and_clear();
    let report = report.context("Failed to solve instance")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_report(&report, args.show_model);
    }

    Ok(report.status.exit_code() as i32)
}
