use std::time::Instant;

use super::decisions::Decisions;
use super::watch_graph::{PropagateResult, Propagator, WatchGraph};
use super::{Budget, Model, SatSolver, SolveOptions, SolveOutcome};
use crate::cnf::{Clause, ClauseSet, Literal};
use crate::error::Result;

/// Complete in-process solver.
///
/// Unit propagation runs over a two-watched-literal graph. Decisions pick
/// the lowest undecided variable, false first, and conflicts flip the most
/// recent unflipped decision.
#[derive(Debug, Clone)]
pub struct DpllSolver {
    /// Budget is checked when `steps & clock_check_mask == 0`
    clock_check_mask: u64,
}

impl DpllSolver {
    /// Check the clock every 1024 steps
    const DEFAULT_CLOCK_CHECK_MASK: u64 = 0x3FF;

    pub fn new() -> Self {
        Self {
            clock_check_mask: Self::DEFAULT_CLOCK_CHECK_MASK,
        }
    }

    /// Check the budget more or less often; the mask must be `2^k - 1`
    pub fn with_clock_check_mask(mut self, mask: u64) -> Self {
        self.clock_check_mask = mask;
        self
    }
}

impl Default for DpllSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SatSolver for DpllSolver {
    fn name(&self) -> &str {
        "builtin"
    }

    fn solve(&self, clauses: &ClauseSet, options: &SolveOptions) -> Result<SolveOutcome> {
        let budget = options.budget();
        if let Some(reason) = budget.exhausted() {
            return Ok(SolveOutcome::Unknown(reason));
        }

        let start = Instant::now();
        let Some(normalized) = normalize(clauses) else {
            log::debug!("Clause set contains the empty clause");
            return Ok(SolveOutcome::Unsatisfiable);
        };

        let mut state = SearchState::new(&normalized);
        let outcome = state.run(&budget, self.clock_check_mask);

        log::debug!(
            "DPLL finished in {:?}: {} decisions, {} conflicts, {} propagations",
            start.elapsed(),
            state.stats.decisions,
            state.stats.conflicts,
            state.stats.propagations
        );

        if let SolveOutcome::Satisfiable(model) = &outcome {
            debug_assert!(model.satisfies(clauses));
        }
        Ok(outcome)
    }
}

/// Sort and merge literals, drop tautologies; `None` when a clause is empty
fn normalize(clauses: &ClauseSet) -> Option<ClauseSet> {
    let mut normalized = ClauseSet::new(clauses.num_vars());
    for clause in clauses.iter() {
        if clause.is_empty() {
            return None;
        }
        let mut literals = clause.literals().to_vec();
        literals.sort_by_key(|l| (l.unsigned_abs(), *l < 0));
        literals.dedup();
        if literals.windows(2).any(|w| w[0] == -w[1]) {
            continue;
        }
        normalized.add(Clause::new(literals, clause.family()));
    }
    Some(normalized)
}

/// A decision point on the branch stack
#[derive(Debug, Clone, Copy)]
struct Branch {
    level: u32,
    literal: Literal,
    /// Whether the opposite polarity has already been tried
    flipped: bool,
}

#[derive(Debug, Default)]
struct SearchStats {
    decisions: u64,
    conflicts: u64,
    propagations: u64,
}

struct SearchState<'a> {
    clauses: &'a ClauseSet,
    graph: WatchGraph,
    decisions: Decisions,
    /// Next queue position to propagate
    propagate_index: usize,
    branches: Vec<Branch>,
    stats: SearchStats,
}

impl<'a> SearchState<'a> {
    fn new(clauses: &'a ClauseSet) -> Self {
        Self {
            clauses,
            graph: WatchGraph::from_clauses(clauses),
            decisions: Decisions::with_capacity(clauses.num_vars() as usize),
            propagate_index: 0,
            branches: Vec::new(),
            stats: SearchStats::default(),
        }
    }

    fn run(&mut self, budget: &Budget, clock_check_mask: u64) -> SolveOutcome {
        if !self.process_assertions() {
            return SolveOutcome::Unsatisfiable;
        }

        let mut steps: u64 = 0;
        loop {
            steps = steps.wrapping_add(1);
            if steps & clock_check_mask == 0 {
                if let Some(reason) = budget.exhausted() {
                    log::debug!("Search stopped after {} steps: {}", steps, reason);
                    return SolveOutcome::Unknown(reason);
                }
            }

            if let Err(clause_id) = self.propagate() {
                self.stats.conflicts += 1;
                log::trace!(
                    "Conflict in clause {} at level {}",
                    clause_id,
                    self.decisions.level()
                );
                if !self.backtrack() {
                    return SolveOutcome::Unsatisfiable;
                }
                continue;
            }

            match self.next_undecided() {
                Some(var) => self.branch(-(var as Literal)),
                None => {
                    let values = self.decisions.values(self.clauses.num_vars() as usize);
                    return SolveOutcome::Satisfiable(Model::new(values));
                }
            }
        }
    }

    /// Decide unit clauses at level 0
    fn process_assertions(&mut self) -> bool {
        for clause in self.clauses.units() {
            if !self.decisions.decide(clause.literals()[0], Some(clause.id())) {
                log::trace!("Conflicting assertion in clause {}", clause.id());
                return false;
            }
        }
        true
    }

    /// Propagate every queued assignment; `Err` carries the conflicting clause
    fn propagate(&mut self) -> std::result::Result<(), u32> {
        while self.propagate_index < self.decisions.len() {
            let (literal, _) = self.decisions.queue()[self.propagate_index];
            self.propagate_index += 1;
            self.stats.propagations += 1;

            let decisions = &self.decisions;
            let results = Propagator::new(&mut self.graph, self.clauses)
                .propagate(literal, |l| decisions.value(l));

            for result in results {
                match result {
                    PropagateResult::Unit(lit, clause_id) => {
                        if !self.decisions.decide(lit, Some(clause_id)) {
                            return Err(clause_id);
                        }
                    }
                    PropagateResult::Conflict(clause_id) => return Err(clause_id),
                }
            }
        }
        Ok(())
    }

    fn next_undecided(&self) -> Option<u32> {
        (1..=self.clauses.num_vars()).find(|&var| self.decisions.undecided(var))
    }

    /// Open a new level with `literal` as its decision
    fn branch(&mut self, literal: Literal) {
        self.decisions.increment_level();
        self.decisions.decide(literal, None);
        self.branches.push(Branch {
            level: self.decisions.level(),
            literal,
            flipped: false,
        });
        self.stats.decisions += 1;
    }

    /// Flip the most recent unflipped decision; false when none is left
    fn backtrack(&mut self) -> bool {
        while let Some(branch) = self.branches.pop() {
            if branch.flipped {
                continue;
            }

            self.decisions.revert_to_level(branch.level - 1);
            self.decisions.increment_level();
            // Everything below the reverted level was already propagated
            self.propagate_index = self.decisions.len();
            self.decisions.decide(-branch.literal, None);
            self.branches.push(Branch {
                literal: -branch.literal,
                flipped: true,
                ..branch
            });
            return true;
        }
        false
    }
}
