//! Orthogonal bin packing as Boolean satisfiability.
//!
//! A set of axis-aligned boxes fits into a container iff, on every axis,
//! the interval graph of their projections has a clique ordering in which
//! every stable set fits the container, and every pair of boxes is
//! separated on at least one axis. This crate encodes that condition as a
//! propositional formula, hands it to a SAT solver and turns a model back
//! into coordinates.
//!
//! ```
//! use packsat_core::{Container, DpllSolver, Instance, Item, Packer, SolveStatus};
//!
//! let instance = Instance::new(
//!     Container::new(vec![4, 6]),
//!     vec![Item::new(vec![1, 2]), Item::new(vec![3, 1]), Item::new(vec![2, 1])],
//! ).unwrap();
//!
//! let report = Packer::new(DpllSolver::new()).pack(&instance).unwrap();
//! assert_eq!(report.status, SolveStatus::Satisfiable);
//! ```

pub mod cnf;
pub mod encoding;
pub mod error;
pub mod formula;
pub mod instance;
pub mod interpret;
pub mod packer;
pub mod solver;

pub use cnf::{clausify, Clause, ClauseSet, Literal};
pub use encoding::{
    ConstraintFamily, Encoder, Encoding, FormulaStats, InfeasibleSets, Namespace, VariableId,
    VariableKey, VariableKind,
};
pub use error::{PackError, Result};
pub use formula::Formula;
pub use instance::{Container, Instance, Item};
pub use interpret::{interpret, Packing, Placement, SlotRun};
pub use packer::{PackReport, Packer};
pub use solver::{
    DpllSolver, ExternalSolver, Model, SatSolver, SolveOptions, SolveOutcome, SolveStatus,
    UnknownReason,
};
