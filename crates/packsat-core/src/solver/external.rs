use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use super::{SatSolver, SolveOptions, SolveOutcome, UnknownReason};
use crate::cnf::dimacs::{parse_solution, write_dimacs};
use crate::cnf::ClauseSet;
use crate::error::Result;

/// Runs a DIMACS solver binary such as kissat, cadical or minisat.
///
/// The formula is piped to the child's stdin; the answer is read from its
/// stdout in SAT competition format. The child is killed when the budget
/// runs out.
#[derive(Debug, Clone)]
pub struct ExternalSolver {
    command: String,
    args: Vec<String>,
    poll_interval: Duration,
}

impl ExternalSolver {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            poll_interval: Duration::from_millis(10),
        }
    }

    /// Extra arguments passed before any input
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl SatSolver for ExternalSolver {
    fn name(&self) -> &str {
        &self.command
    }

    fn solve(&self, clauses: &ClauseSet, options: &SolveOptions) -> Result<SolveOutcome> {
        let budget = options.budget();

        let mut input = Vec::new();
        write_dimacs(&mut input, clauses, None)?;

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        log::debug!("Started {} (pid {})", self.command, child.id());

        // Feed and drain on separate threads so neither pipe can fill up and block the child
        let writer = child.stdin.take().map(|mut stdin| {
            thread::spawn(move || {
                // The solver may exit before reading everything
                let _ = stdin.write_all(&input);
            })
        });
        let reader = child.stdout.take().map(|mut stdout| {
            thread::spawn(move || {
                let mut output = String::new();
                stdout.read_to_string(&mut output).map(|_| output)
            })
        });

        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if let Some(reason) = budget.exhausted() {
                log::debug!("Stopping {}: {}", self.command, reason);
                let _ = child.kill();
                let _ = child.wait();
                return Ok(SolveOutcome::Unknown(reason));
            }
            thread::sleep(self.poll_interval);
        };

        if let Some(writer) = writer {
            let _ = writer.join();
        }
        let output = match reader.map(|r| r.join()) {
            Some(Ok(output)) => output?,
            _ => {
                return Ok(SolveOutcome::Unknown(UnknownReason::Solver(
                    "could not read solver output".to_string(),
                )))
            }
        };

        log::debug!("{} exited with {}", self.command, status);
        let outcome = parse_solution(output.as_bytes(), clauses.num_vars())?;

        if let SolveOutcome::Satisfiable(model) = &outcome {
            if !model.satisfies(clauses) {
                log::warn!("{} returned a model that violates the formula", self.command);
                return Ok(SolveOutcome::Unknown(UnknownReason::Solver(
                    "model does not satisfy the formula".to_string(),
                )));
            }
        }
        if let SolveOutcome::Unknown(UnknownReason::Solver(message)) = &outcome {
            return Ok(SolveOutcome::Unknown(UnknownReason::Solver(format!(
                "{} ({})",
                message, status
            ))));
        }

        Ok(outcome)
    }
}
