//! Decode command - interpret the answer of an offline solver run.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use packsat_core::cnf::dimacs::{parse_solution, read_namespace};
use packsat_core::{interpret, Instance, SolveOutcome};

use crate::output;

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// DIMACS file written by `packsat encode --dimacs`
    #[arg(value_name = "CNF")]
    pub cnf: PathBuf,

    /// Solver output in SAT competition format
    #[arg(value_name = "SOLUTION")]
    pub solution: PathBuf,

    /// The instance that was encoded
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(BufReader::new(file))
}

pub fn execute(args: DecodeArgs) -> Result<i32> {
    let instance = Instance::load(&args.file)
        .with_context(|| format!("Failed to load instance {}", args.file.display()))?;
    let namespace = read_namespace(open(&args.cnf)?)
        .with_context(|| format!("Failed to read variable names from {}", args.cnf.display()))?;
    let outcome = parse_solution(open(&args.solution)?, namespace.len() as u32)
        .with_context(|| format!("Failed to parse {}", args.solution.display()))?;

    output::print_instance(&instance);
    println!("{} {}", "Result:".cyan(), output::status_label(outcome.status()));

    match &outcome {
        SolveOutcome::Satisfiable(model) => {
            let packing = interpret(&instance, &namespace, model)
                .context("Model does not describe a packing")?;
            packing.validate().context("Decoded packing is invalid")?;
            output::print_packing(&packing);
        }
        SolveOutcome::Unknown(reason) => println!("  {} {}", "Reason:".yellow(), reason),
        SolveOutcome::Unsatisfiable => {}
    }

    Ok(outcome.status().exit_code() as i32)
}
