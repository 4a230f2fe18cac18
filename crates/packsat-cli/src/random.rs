//! Random command - generate instances and tally the answers.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

use packsat_core::{Instance, Packer, SolveStatus};

use crate::config::{PacksatConfig, SolverArgs, SolverSettings};
use crate::output;

#[derive(Args, Debug)]
pub struct RandomArgs {
    /// Items per instance
    #[arg(long, default_value_t = 6)]
    pub items: usize,

    /// Number of axes
    #[arg(long, default_value_t = 2)]
    pub dimension: usize,

    /// Number of instances to generate
    #[arg(long, default_value_t = 10)]
    pub count: usize,

    /// Seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write every generated instance to this directory
    #[arg(long, value_name = "DIR")]
    pub save: Option<PathBuf>,

    #[command(flatten)]
    pub solver: SolverArgs,

    /// Disable progress output
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Debug, Default)]
struct Tally {
    satisfiable: usize,
    unsatisfiable: usize,
    unknown: usize,
    oversized: usize,
}

impl Tally {
    fn record(&mut self, status: SolveStatus, oversized: bool) {
        match status {
            SolveStatus::Satisfiable => self.satisfiable += 1,
            SolveStatus::Unsatisfiable => self.unsatisfiable += 1,
            SolveStatus::Unknown => self.unknown += 1,
        }
        if oversized {
            self.oversized += 1;
        }
    }
}

pub fn execute(args: RandomArgs, config: Option<&PacksatConfig>) -> Result<i32> {
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let settings = SolverSettings::resolve(config, &args.solver);
    let packer = Packer::new(settings.solver()?).with_options(settings.options());

    if let Some(dir) = &args.save {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let pb = if args.no_progress {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(args.count as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    };

    let mut tally = Tally::default();
    for index in 1..=args.count {
        let instance = Instance::random(&mut rng, args.items, args.dimension)
            .context("Failed to generate instance")?;

        if let Some(dir) = &args.save {
            let path = dir.join(format!("instance-{:04}.txt", index));
            std::fs::write(&path, instance.to_text())
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }

        let report = packer
            .pack(&instance)
            .with_context(|| format!("Failed to solve instance {}", index))?;
        log::info!(
            "instance {}: {} in {:.3}s",
            index,
            report.status,
            report.elapsed.as_secs_f64()
        );
        tally.record(report.status, !report.oversized.is_empty());

        pb.set_message(format!("{}", report.status));
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!(
        "{} {} instances, {} items, {} axes, solver {}",
        "Random:".cyan(),
        args.count,
        args.items,
        args.dimension,
        packer.solver_name()
    );
    println!(
        "  {}: {}",
        output::status_label(SolveStatus::Satisfiable),
        tally.satisfiable
    );
    println!(
        "  {}: {} ({} with an oversized item)",
        output::status_label(SolveStatus::Unsatisfiable),
        tally.unsatisfiable,
        tally.oversized
    );
    println!(
        "  {}: {}",
        output::status_label(SolveStatus::Unknown),
        tally.unknown
    );

    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_counts_statuses() {
        let mut tally = Tally::default();
        tally.record(SolveStatus::Satisfiable, false);
        tally.record(SolveStatus::Unsatisfiable, true);
        tally.record(SolveStatus::Unsatisfiable, false);
        tally.record(SolveStatus::Unknown, false);

        assert_eq!(tally.satisfiable, 1);
        assert_eq!(tally.unsatisfiable, 2);
        assert_eq!(tally.unknown, 1);
        assert_eq!(tally.oversized, 1);
    }
}
