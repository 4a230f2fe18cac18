//! End-to-end driver: encode, solve, interpret.

use std::time::{Duration, Instant};

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use crate::cnf::clausify;
use crate::encoding::{Encoder, FormulaStats};
use crate::error::Result;
use crate::instance::Instance;
use crate::interpret::{interpret, Packing};
use crate::solver::{SatSolver, SolveOptions, SolveOutcome, SolveStatus, UnknownReason};

fn as_secs<S: Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Everything known about one packing attempt.
#[derive(Debug, Clone, Serialize)]
pub struct PackReport {
    pub status: SolveStatus,
    /// Wall-clock time from encoding to interpretation, in seconds
    #[serde(serialize_with = "as_secs")]
    pub elapsed: Duration,
    pub stats: FormulaStats,
    /// Clauses handed to the solver, 0 when the solver was not called
    pub clauses: usize,
    pub solver: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<UnknownReason>,
    /// `(item, axis)` pairs that exceed the container on their own
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub oversized: Vec<(usize, usize)>,
    /// Value of every named variable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<IndexMap<String, bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packing: Option<Packing>,
}

/// Packs instances with an injected SAT backend.
pub struct Packer {
    solver: Box<dyn SatSolver>,
    options: SolveOptions,
    encoder: Encoder,
}

impl Packer {
    pub fn new(solver: impl SatSolver + 'static) -> Self {
        Self {
            solver: Box::new(solver),
            options: SolveOptions::default(),
            encoder: Encoder::new(),
        }
    }

    /// Set the timeout and interrupt flag used for every solver call
    pub fn with_options(mut self, options: SolveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &SolveOptions {
        &self.options
    }

    pub fn solver_name(&self) -> &str {
        self.solver.name()
    }

    /// Decide whether the instance packs and, if so, where every item goes.
    ///
    /// An item that exceeds the container on some axis makes the instance
    /// unsatisfiable without a solver call. A satisfiable answer always
    /// carries a validated packing.
    pub fn pack(&self, instance: &Instance) -> Result<PackReport> {
        let start = Instant::now();
        let encoding = self.encoder.encode(instance)?;

        let mut report = PackReport {
            status: SolveStatus::Unknown,
            elapsed: Duration::ZERO,
            stats: encoding.stats(),
            clauses: 0,
            solver: self.solver.name().to_string(),
            reason: None,
            oversized: encoding.oversized_items(),
            model: None,
            packing: None,
        };

        if !report.oversized.is_empty() {
            log::info!(
                "{} item/axis pairs exceed the container, skipping the solver",
                report.oversized.len()
            );
            report.status = SolveStatus::Unsatisfiable;
            report.elapsed = start.elapsed();
            return Ok(report);
        }

        let clauses = clausify(&encoding);
        report.clauses = clauses.len();

        log::info!("Solving {} clauses with {}", clauses.len(), self.solver.name());
        let outcome = self.solver.solve(&clauses, &self.options)?;
        report.status = outcome.status();

        match outcome {
            SolveOutcome::Satisfiable(model) => {
                let packing = interpret(instance, encoding.namespace(), &model)?;
                packing.validate()?;
                report.model = Some(model.named(encoding.namespace()));
                report.packing = Some(packing);
            }
            SolveOutcome::Unsatisfiable => {}
            SolveOutcome::Unknown(reason) => {
                log::warn!("Solver gave no answer: {}", reason);
                report.reason = Some(reason);
            }
        }

        report.elapsed = start.elapsed();
        log::info!("{} in {:?}", report.status, report.elapsed);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnf::ClauseSet;
    use crate::instance::{Container, Item};
    use crate::solver::DpllSolver;

    /// Backend that must never be reached
    struct Unreachable;

    impl SatSolver for Unreachable {
        fn name(&self) -> &str {
            "unreachable"
        }

        fn solve(&self, _: &ClauseSet, _: &SolveOptions) -> Result<SolveOutcome> {
            panic!("solver called for a trivially unsatisfiable instance")
        }
    }

    /// Backend that always gives up
    struct GiveUp;

    impl SatSolver for GiveUp {
        fn name(&self) -> &str {
            "give-up"
        }

        fn solve(&self, _: &ClauseSet, _: &SolveOptions) -> Result<SolveOutcome> {
            Ok(SolveOutcome::Unknown(UnknownReason::Timeout))
        }
    }

    fn instance(container: &[u64], items: &[&[u64]]) -> Instance {
        Instance::new(
            Container::new(container.to_vec()),
            items.iter().map(|i| Item::new(i.to_vec())).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_pack_satisfiable() {
        let report = Packer::new(DpllSolver::new())
            .pack(&instance(&[4, 6], &[&[1, 2], &[3, 1], &[2, 1]]))
            .unwrap();

        assert_eq!(report.status, SolveStatus::Satisfiable);
        assert_eq!(report.solver, "builtin");
        assert!(report.clauses > 0);
        let packing = report.packing.unwrap();
        assert_eq!(packing.placements().len(), 3);
        packing.validate().unwrap();
        assert_eq!(report.model.unwrap().len(), report.stats.variable_count);
    }

    #[test]
    fn test_pack_oversized_skips_solver() {
        let report = Packer::new(Unreachable)
            .pack(&instance(&[4, 6], &[&[1, 7], &[1, 1]]))
            .unwrap();

        assert_eq!(report.status, SolveStatus::Unsatisfiable);
        assert_eq!(report.oversized, vec![(1, 2)]);
        assert_eq!(report.clauses, 0);
        assert!(report.packing.is_none());
    }

    #[test]
    fn test_pack_unknown_keeps_reason() {
        let report = Packer::new(GiveUp)
            .pack(&instance(&[4, 6], &[&[1, 2], &[3, 1]]))
            .unwrap();

        assert_eq!(report.status, SolveStatus::Unknown);
        assert_eq!(report.reason, Some(UnknownReason::Timeout));
        assert!(report.model.is_none());
    }

    #[test]
    fn test_report_serializes() {
        let report = Packer::new(DpllSolver::new())
            .pack(&instance(&[2, 2], &[&[1, 1]]))
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["status"], "satisfiable");
        assert_eq!(json["stats"]["variable_count"], 2);
        assert!(json["elapsed"].is_f64());
        assert!(json.get("reason").is_none());
        assert_eq!(json["packing"]["placements"][0]["position"], serde_json::json!([0, 0]));
    }
}
