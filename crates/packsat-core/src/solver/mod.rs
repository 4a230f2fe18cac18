//! SAT solver boundary.
//!
//! The packer only sees the [`SatSolver`] trait: a clause set goes in, and
//! a [`SolveOutcome`] comes out. Two backends ship with the crate:
//!
//! - [`DpllSolver`]: an in-process complete solver with two-watched-literal
//!   unit propagation and chronological backtracking
//! - [`ExternalSolver`]: any DIMACS solver binary that follows the SAT
//!   competition output conventions
//!
//! A solver that runs out of time or is interrupted answers
//! [`SolveOutcome::Unknown`], never [`SolveOutcome::Unsatisfiable`].

mod decisions;
mod dpll;
mod external;
mod watch_graph;

#[cfg(test)]
mod tests;

pub use decisions::Decisions;
pub use dpll::DpllSolver;
pub use external::ExternalSolver;
pub use watch_graph::{PropagateResult, Propagator, WatchGraph};

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::cnf::{ClauseSet, Literal};
use crate::encoding::variable::{Namespace, VariableId};
use crate::error::Result;

/// A SAT backend.
pub trait SatSolver {
    /// Short name used in logs and reports
    fn name(&self) -> &str;

    /// Decide satisfiability of a clause set
    fn solve(&self, clauses: &ClauseSet, options: &SolveOptions) -> Result<SolveOutcome>;
}

impl<S: SatSolver + ?Sized> SatSolver for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn solve(&self, clauses: &ClauseSet, options: &SolveOptions) -> Result<SolveOutcome> {
        (**self).solve(clauses, options)
    }
}

/// Limits applied to one solver call.
#[derive(Debug, Clone, Default)]
pub struct SolveOptions {
    /// Wall-clock limit for the call
    pub timeout: Option<Duration>,
    /// Set to `true` from another thread to stop the search
    pub interrupt: Option<Arc<AtomicBool>>,
}

impl SolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_interrupt(mut self, interrupt: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    /// Start the clock for one solver call
    pub(crate) fn budget(&self) -> Budget {
        Budget {
            deadline: self.timeout.map(|t| Instant::now() + t),
            interrupt: self.interrupt.clone(),
        }
    }
}

/// Deadline and interrupt flag of a running call.
#[derive(Debug, Clone)]
pub(crate) struct Budget {
    deadline: Option<Instant>,
    interrupt: Option<Arc<AtomicBool>>,
}

impl Budget {
    /// Reason to stop now, if any
    pub(crate) fn exhausted(&self) -> Option<UnknownReason> {
        if let Some(flag) = &self.interrupt {
            if flag.load(Ordering::Relaxed) {
                return Some(UnknownReason::Interrupted);
            }
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(UnknownReason::Timeout),
            _ => None,
        }
    }
}

/// Why a solver gave no answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "lowercase")]
pub enum UnknownReason {
    Timeout,
    Interrupted,
    /// The backend failed or produced no verdict
    Solver(String),
}

impl fmt::Display for UnknownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnknownReason::Timeout => write!(f, "time limit reached"),
            UnknownReason::Interrupted => write!(f, "interrupted"),
            UnknownReason::Solver(message) => write!(f, "solver failure: {}", message),
        }
    }
}

/// A solver verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    Satisfiable(Model),
    Unsatisfiable,
    Unknown(UnknownReason),
}

impl SolveOutcome {
    pub fn status(&self) -> SolveStatus {
        match self {
            SolveOutcome::Satisfiable(_) => SolveStatus::Satisfiable,
            SolveOutcome::Unsatisfiable => SolveStatus::Unsatisfiable,
            SolveOutcome::Unknown(_) => SolveStatus::Unknown,
        }
    }

    pub fn model(&self) -> Option<&Model> {
        match self {
            SolveOutcome::Satisfiable(model) => Some(model),
            _ => None,
        }
    }

    pub fn is_satisfiable(&self) -> bool {
        matches!(self, SolveOutcome::Satisfiable(_))
    }
}

/// The verdict without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveStatus {
    Satisfiable,
    Unsatisfiable,
    Unknown,
}

impl SolveStatus {
    /// Exit code following the SAT competition convention
    pub fn exit_code(&self) -> u8 {
        match self {
            SolveStatus::Satisfiable => 10,
            SolveStatus::Unsatisfiable => 20,
            SolveStatus::Unknown => 0,
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Satisfiable => write!(f, "SATISFIABLE"),
            SolveStatus::Unsatisfiable => write!(f, "UNSATISFIABLE"),
            SolveStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// A total assignment over variables `1..=num_vars`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    /// Index 0 holds variable 1
    values: Vec<bool>,
}

impl Model {
    pub fn new(values: Vec<bool>) -> Self {
        Self { values }
    }

    /// Build from true/false literals; unmentioned variables are false
    pub fn from_literals(num_vars: u32, literals: &[Literal]) -> Self {
        let highest = literals
            .iter()
            .map(|l| l.unsigned_abs())
            .max()
            .unwrap_or(0)
            .max(num_vars);
        let mut values = vec![false; highest as usize];
        for &lit in literals {
            if lit != 0 {
                values[lit.unsigned_abs() as usize - 1] = lit > 0;
            }
        }
        Self { values }
    }

    /// Value of a variable, `false` when out of range
    pub fn value(&self, id: VariableId) -> bool {
        self.values.get(id.index()).copied().unwrap_or(false)
    }

    /// Whether a literal holds
    pub fn literal(&self, literal: Literal) -> bool {
        if literal == 0 {
            return false;
        }
        let value = self
            .values
            .get(literal.unsigned_abs() as usize - 1)
            .copied()
            .unwrap_or(false);
        value == (literal > 0)
    }

    pub fn num_vars(&self) -> usize {
        self.values.len()
    }

    /// The assignment as DIMACS literals, variable 1 first
    pub fn literals(&self) -> impl Iterator<Item = Literal> + '_ {
        self.values.iter().enumerate().map(|(i, &v)| {
            let var = (i + 1) as Literal;
            if v {
                var
            } else {
                -var
            }
        })
    }

    /// Check every clause
    pub fn satisfies(&self, clauses: &ClauseSet) -> bool {
        clauses.is_satisfied_by(|lit| self.literal(lit))
    }

    /// Values of the named variables, keyed by their textual key
    pub fn named(&self, namespace: &Namespace) -> IndexMap<String, bool> {
        namespace
            .iter()
            .map(|(id, key)| (key.to_string(), self.value(id)))
            .collect()
    }
}
