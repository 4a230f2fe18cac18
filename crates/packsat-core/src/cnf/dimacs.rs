//! DIMACS CNF output and SAT competition answer parsing.
//!
//! Files written here carry the namespace as comments so that a model
//! produced offline can be mapped back to variable keys:
//!
//! ```text
//! c packsat dimension 2 items 3
//! c var 1 c_1_1_1
//! c var 2 c_1_1_2
//! ...
//! p cnf 42 117
//! 1 2 3 0
//! ```

use std::io::{BufRead, Write};

use super::{ClauseSet, Literal};
use crate::encoding::variable::{Namespace, VariableId, VariableKey};
use crate::error::{PackError, Result};
use crate::solver::{Model, SolveOutcome, UnknownReason};

const HEADER_PREFIX: &str = "c packsat";

fn dimacs_error(line: usize, reason: impl Into<String>) -> PackError {
    PackError::Dimacs {
        line,
        reason: reason.into(),
    }
}

/// Write a clause set in DIMACS CNF format.
///
/// With a namespace, every named variable is listed in a `c var` comment.
pub fn write_dimacs<W: Write>(
    writer: &mut W,
    clauses: &ClauseSet,
    namespace: Option<&Namespace>,
) -> Result<()> {
    if let Some(ns) = namespace {
        writeln!(
            writer,
            "{} dimension {} items {}",
            HEADER_PREFIX,
            ns.dimension(),
            ns.items()
        )?;
        for (id, key) in ns.iter() {
            writeln!(writer, "c var {} {}", id.get(), key)?;
        }
    }

    writeln!(writer, "p cnf {} {}", clauses.num_vars(), clauses.len())?;
    for clause in clauses.iter() {
        for lit in clause.literals() {
            write!(writer, "{} ", lit)?;
        }
        writeln!(writer, "0")?;
    }

    writer.flush()?;
    Ok(())
}

/// Render a clause set as a DIMACS string
pub fn to_dimacs_string(clauses: &ClauseSet, namespace: Option<&Namespace>) -> Result<String> {
    let mut buffer = Vec::new();
    write_dimacs(&mut buffer, clauses, namespace)?;
    String::from_utf8(buffer).map_err(|e| dimacs_error(0, e.to_string()))
}

/// Rebuild the namespace recorded in the comments of a DIMACS file.
///
/// Reading stops at the problem line.
pub fn read_namespace<R: BufRead>(reader: R) -> Result<Namespace> {
    let mut namespace: Option<Namespace> = None;

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line?;
        let line = line.trim();

        if line.starts_with('p') {
            break;
        }

        if let Some(rest) = line.strip_prefix(HEADER_PREFIX) {
            let fields: Vec<&str> = rest.split_whitespace().collect();
            let (d, n) = match fields.as_slice() {
                ["dimension", d, "items", n] => (
                    d.parse::<usize>()
                        .map_err(|_| dimacs_error(line_no, format!("invalid dimension '{}'", d)))?,
                    n.parse::<usize>()
                        .map_err(|_| dimacs_error(line_no, format!("invalid item count '{}'", n)))?,
                ),
                _ => return Err(dimacs_error(line_no, "malformed packsat header")),
            };
            namespace = Some(Namespace::new(d, n));
            continue;
        }

        if let Some(rest) = line.strip_prefix("c var ") {
            let ns = namespace
                .as_mut()
                .ok_or_else(|| dimacs_error(line_no, "variable listed before the packsat header"))?;

            let mut fields = rest.split_whitespace();
            let (Some(id), Some(key), None) = (fields.next(), fields.next(), fields.next()) else {
                return Err(dimacs_error(line_no, "expected 'c var <id> <key>'"));
            };
            let id: u32 = id
                .parse()
                .map_err(|_| dimacs_error(line_no, format!("invalid variable id '{}'", id)))?;
            if id == 0 {
                return Err(dimacs_error(line_no, "variable ids start at 1"));
            }
            let key: VariableKey = key
                .parse()
                .map_err(|e: PackError| dimacs_error(line_no, e.to_string()))?;

            let assigned = ns
                .address(key)
                .map_err(|e| dimacs_error(line_no, e.to_string()))?;
            if assigned != VariableId::new(id) {
                return Err(dimacs_error(
                    line_no,
                    format!("variable {} listed out of order, expected {}", id, assigned.get()),
                ));
            }
        }
    }

    namespace.ok_or_else(|| dimacs_error(0, "no packsat header found"))
}

/// Parse solver output in SAT competition format.
///
/// Accepts `s`/`v` lines as well as the `SAT`/`UNSAT` result files some
/// solvers write. Variables missing from the value lines are false.
pub fn parse_solution<R: BufRead>(reader: R, num_vars: u32) -> Result<SolveOutcome> {
    let mut status: Option<&'static str> = None;
    let mut literals: Vec<Literal> = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line?;
        let line = line.trim();

        let values = if let Some(rest) = line.strip_prefix("s ") {
            status = Some(match rest.trim() {
                "SATISFIABLE" => "sat",
                "UNSATISFIABLE" => "unsat",
                "UNKNOWN" => "unknown",
                other => return Err(dimacs_error(line_no, format!("unknown status '{}'", other))),
            });
            continue;
        } else if let Some(rest) = line.strip_prefix("v ") {
            rest
        } else {
            match line {
                "" => continue,
                "SAT" => {
                    status = Some("sat");
                    continue;
                }
                "UNSAT" => {
                    status = Some("unsat");
                    continue;
                }
                "INDET" => {
                    status = Some("unknown");
                    continue;
                }
                _ if line.starts_with('c') => continue,
                _ if status == Some("sat")
                    && line.starts_with(|c: char| c == '-' || c.is_ascii_digit()) =>
                {
                    line
                }
                _ => continue,
            }
        };

        for token in values.split_whitespace() {
            let lit: Literal = token
                .parse()
                .map_err(|_| dimacs_error(line_no, format!("invalid literal '{}'", token)))?;
            if lit.unsigned_abs() > num_vars {
                return Err(dimacs_error(
                    line_no,
                    format!("literal {} out of range for {} variables", lit, num_vars),
                ));
            }
            if lit != 0 {
                literals.push(lit);
            }
        }
    }

    Ok(match status {
        Some("sat") => SolveOutcome::Satisfiable(Model::from_literals(num_vars, &literals)),
        Some("unsat") => SolveOutcome::Unsatisfiable,
        Some(_) => SolveOutcome::Unknown(UnknownReason::Solver(
            "solver reported UNKNOWN".to_string(),
        )),
        None => SolveOutcome::Unknown(UnknownReason::Solver(
            "no status line in solver output".to_string(),
        )),
    })
}
