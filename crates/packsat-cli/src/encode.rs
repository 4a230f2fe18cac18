//! Encode command - build the formula without solving it.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use packsat_core::cnf::dimacs::write_dimacs;
use packsat_core::{clausify, Encoder, Instance};

use crate::output;

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Instance file (.json, anything else is read as text)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Write the clauses in DIMACS format to this file
    #[arg(long, value_name = "OUT")]
    pub dimacs: Option<PathBuf>,

    /// List every minimal infeasible set
    #[arg(long)]
    pub show_sets: bool,
}

pub fn execute(args: EncodeArgs) -> Result<i32> {
    let instance = Instance::load(&args.file)
        .with_context(|| format!("Failed to load instance {}", args.file.display()))?;
    output::print_instance(&instance);

    let encoding = Encoder::new()
        .encode(&instance)
        .context("Failed to encode instance")?;
    let clauses = clausify(&encoding);
    output::print_encoding(&encoding, &clauses, args.show_sets);

    if let Some(path) = &args.dimacs {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        write_dimacs(&mut writer, &clauses, Some(encoding.namespace()))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        writer.flush()?;
        println!("{} {}", "Wrote".green(), path.display());
    }

    Ok(0)
}
