//! Terminal rendering shared by the commands.

use colored::{ColoredString, Colorize};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use packsat_core::{ClauseSet, Encoding, Instance, PackReport, Packing, SolveStatus};

pub fn status_label(status: SolveStatus) -> ColoredString {
    match status {
        SolveStatus::Satisfiable => status.to_string().green().bold(),
        SolveStatus::Unsatisfiable => status.to_string().red().bold(),
        SolveStatus::Unknown => status.to_string().yellow().bold(),
    }
}

/// Spinner on stderr, hidden when `quiet`
pub fn spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn join(values: &[u64], separator: &str) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

pub fn print_instance(instance: &Instance) {
    println!(
        "{} {} items in a {} container",
        "Instance:".cyan(),
        instance.len(),
        join(instance.container().capacities(), "x")
    );
}

pub fn print_packing(packing: &Packing) {
    println!("{}", "Placements:".cyan());
    println!("  {:>5}  {:<18} {:<18} slots", "item", "position", "size");
    for placement in packing.placements() {
        let runs: Vec<String> = placement.runs.iter().map(|r| r.to_string()).collect();
        println!(
            "  {:>5}  {:<18} {:<18} {}",
            placement.item,
            format!("({})", join(&placement.position, ", ")),
            join(&placement.extents, "x"),
            runs.join(" / ").dimmed()
        );
    }
}

pub fn print_report(report: &PackReport, show_model: bool) {
    println!(
        "{} {} ({} variables, {} clauses, {:.3}s, {})",
        "Result:".cyan(),
        status_label(report.status),
        report.stats.variable_count,
        report.clauses,
        report.elapsed.as_secs_f64(),
        report.solver
    );

    for (item, axis) in &report.oversized {
        println!(
            "  {} item {} does not fit on axis {}",
            "!".red().bold(),
            item,
            axis
        );
    }
    if let Some(reason) = &report.reason {
        println!("  {} {}", "Reason:".yellow(), reason);
    }

    if let Some(packing) = &report.packing {
        print_packing(packing);
    }

    if show_model {
        if let Some(model) = &report.model {
            let true_keys: Vec<&str> = model
                .iter()
                .filter(|(_, &value)| value)
                .map(|(key, _)| key.as_str())
                .collect();
            println!("{} {}", "True variables:".cyan(), true_keys.join(" "));
        }
    }
}

pub fn print_encoding(encoding: &Encoding, clauses: &ClauseSet, show_sets: bool) {
    let stats = encoding.stats();
    println!(
        "{} {} variables, {} formula nodes, {} clauses",
        "Formula:".cyan(),
        stats.variable_count,
        stats.formula_size,
        clauses.len()
    );

    println!("  {:<22} {:>11} {:>9} {:>9}", "family", "constraints", "nodes", "clauses");
    for summary in encoding.assembly().families() {
        println!(
            "  {:<22} {:>11} {:>9} {:>9}",
            summary.family.to_string(),
            summary.constraints,
            summary.size,
            clauses.count_by_family(summary.family)
        );
    }

    for sets in encoding.infeasible_sets() {
        println!(
            "{} axis {} (capacity {}): {} minimal infeasible sets",
            "Enumeration:".cyan(),
            sets.axis(),
            sets.capacity(),
            sets.len()
        );
        for item in sets.oversized() {
            println!("  {} item {} alone exceeds the capacity", "!".red().bold(), item);
        }
        if show_sets {
            for set in sets.minimal() {
                let items: Vec<String> = set.iter().map(|i| i.to_string()).collect();
                println!("  {{{}}}", items.join(", "));
            }
        }
    }
}
