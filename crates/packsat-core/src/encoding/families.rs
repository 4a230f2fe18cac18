//! The six constraint families of the clique-cover encoding.
//!
//! Each generator returns one closed formula and registers the variables it
//! mentions. Items, axes and slots are 1-based throughout; `n` slots exist
//! per axis, one per item.

use std::fmt;

use serde::Serialize;

use super::enumerator::InfeasibleSets;
use super::variable::{Namespace, VariableKey};
use crate::error::Result;
use crate::formula::Formula;

/// Identifies one constraint family, in assembly order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ConstraintFamily {
    /// Every item occupies at least one slot per axis
    Completeness,
    /// Occupied slots of an item form a contiguous run
    Contiguity,
    /// Every pair is separated on at least one axis
    NoOverlap,
    /// Some pair of every minimal infeasible set overlaps
    InfeasibleExclusion,
    /// An empty slot is never followed by a used one
    Monotonicity,
    /// Links pair co-assignment and edge variables to slot assignment
    Correlation,
}

impl ConstraintFamily {
    /// All families in assembly order
    pub const ALL: [ConstraintFamily; 6] = [
        ConstraintFamily::Completeness,
        ConstraintFamily::Contiguity,
        ConstraintFamily::NoOverlap,
        ConstraintFamily::InfeasibleExclusion,
        ConstraintFamily::Monotonicity,
        ConstraintFamily::Correlation,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ConstraintFamily::Completeness => "completeness",
            ConstraintFamily::Contiguity => "contiguity",
            ConstraintFamily::NoOverlap => "no-overlap",
            ConstraintFamily::InfeasibleExclusion => "infeasible-exclusion",
            ConstraintFamily::Monotonicity => "monotonicity",
            ConstraintFamily::Correlation => "correlation",
        }
    }

    /// Position in [`ConstraintFamily::ALL`]
    pub fn position(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for ConstraintFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Run a generator and tag any error with its family
fn generate<F>(family: ConstraintFamily, build: F) -> Result<Formula>
where
    F: FnOnce() -> Result<Formula>,
{
    build().map_err(|e| e.in_family(family))
}

fn var(ns: &mut Namespace, key: VariableKey) -> Result<Formula> {
    ns.address(key).map(Formula::var)
}

/// All unordered pairs `x < y` of `1..=n`
fn pairs(n: usize) -> impl Iterator<Item = (usize, usize)> {
    (1..=n).flat_map(move |x| (x + 1..=n).map(move |y| (x, y)))
}

/// Family 1: `c[i][x][1] | ... | c[i][x][n]` for every item and axis.
pub fn packing_completeness(ns: &mut Namespace) -> Result<Formula> {
    generate(ConstraintFamily::Completeness, || {
        let (d, n) = (ns.dimension(), ns.items());
        let mut clauses = Vec::with_capacity(d * n);

        for item in 1..=n {
            for axis in 1..=d {
                let slots = (1..=n)
                    .map(|slot| var(ns, VariableKey::clique(axis, item, slot)))
                    .collect::<Result<Vec<_>>>()?;
                clauses.push(Formula::or(slots));
            }
        }

        Ok(Formula::and(clauses))
    })
}

/// Family 2: `(c[i][x][a] & c[i][x][b]) -> c[i][x][a+1]` for `a + 2 <= b`.
pub fn clique_contiguity(ns: &mut Namespace) -> Result<Formula> {
    generate(ConstraintFamily::Contiguity, || {
        let (d, n) = (ns.dimension(), ns.items());
        let mut implications = Vec::new();

        for item in 1..=n {
            for axis in 1..=d {
                for a in 1..=n {
                    for b in a + 2..=n {
                        let premise = Formula::and([
                            var(ns, VariableKey::clique(axis, item, a))?,
                            var(ns, VariableKey::clique(axis, item, b))?,
                        ]);
                        let conclusion = var(ns, VariableKey::clique(axis, item, a + 1))?;
                        implications.push(Formula::implies(premise, conclusion));
                    }
                }
            }
        }

        Ok(Formula::and(implications))
    })
}

/// Family 3: `!e[1][x][y] | ... | !e[d][x][y]` for every pair.
pub fn no_axis_overlap(ns: &mut Namespace) -> Result<Formula> {
    generate(ConstraintFamily::NoOverlap, || {
        let (d, n) = (ns.dimension(), ns.items());
        let mut clauses = Vec::new();

        for (x, y) in pairs(n) {
            let separated = (1..=d)
                .map(|axis| var(ns, VariableKey::edge(axis, x, y)).map(Formula::not))
                .collect::<Result<Vec<_>>>()?;
            clauses.push(Formula::or(separated));
        }

        Ok(Formula::and(clauses))
    })
}

/// Family 4: `OR e[i][x][y]` over the pairs of every minimal infeasible set.
///
/// An oversized item yields the empty disjunction, which is false.
pub fn infeasible_set_exclusion(ns: &mut Namespace, sets: &[InfeasibleSets]) -> Result<Formula> {
    generate(ConstraintFamily::InfeasibleExclusion, || {
        let mut clauses = Vec::new();

        for axis_sets in sets {
            let axis = axis_sets.axis();

            for _ in axis_sets.oversized() {
                clauses.push(Formula::or([]));
            }

            for set in axis_sets.minimal() {
                let mut overlaps = Vec::new();
                for (i, &x) in set.iter().enumerate() {
                    for &y in &set[i + 1..] {
                        overlaps.push(var(ns, VariableKey::edge(axis, x, y))?);
                    }
                }
                clauses.push(Formula::or(overlaps));
            }
        }

        Ok(Formula::and(clauses))
    })
}

/// Family 5: `(AND !c[i][x][a]) -> (AND !c[i][x][a+1])` for `a < n`.
pub fn non_empty_monotonicity(ns: &mut Namespace) -> Result<Formula> {
    generate(ConstraintFamily::Monotonicity, || {
        let (d, n) = (ns.dimension(), ns.items());
        let mut implications = Vec::new();

        let empty = |ns: &mut Namespace, axis: usize, slot: usize| {
            (1..=n)
                .map(|item| var(ns, VariableKey::clique(axis, item, slot)).map(Formula::not))
                .collect::<Result<Vec<_>>>()
                .map(Formula::and)
        };

        for axis in 1..=d {
            for a in 1..n {
                let premise = empty(ns, axis, a)?;
                let conclusion = empty(ns, axis, a + 1)?;
                implications.push(Formula::implies(premise, conclusion));
            }
        }

        Ok(Formula::and(implications))
    })
}

/// Family 6: `p[i][x][y][a] <-> (c[i][x][a] & c[i][y][a])` for every slot,
/// and `(p[i][x][y][1] | ... | p[i][x][y][n]) <-> e[i][x][y]`.
pub fn edge_correlation(ns: &mut Namespace) -> Result<Formula> {
    generate(ConstraintFamily::Correlation, || {
        let (d, n) = (ns.dimension(), ns.items());
        let mut equivalences = Vec::new();

        for (x, y) in pairs(n) {
            for axis in 1..=d {
                let mut shared = Vec::with_capacity(n);

                for slot in 1..=n {
                    let pair = var(ns, VariableKey::pair(axis, x, y, slot))?;
                    let both = Formula::and([
                        var(ns, VariableKey::clique(axis, x, slot))?,
                        var(ns, VariableKey::clique(axis, y, slot))?,
                    ]);
                    equivalences.push(Formula::iff(pair.clone(), both));
                    shared.push(pair);
                }

                let edge = var(ns, VariableKey::edge(axis, x, y))?;
                equivalences.push(Formula::iff(Formula::or(shared), edge));
            }
        }

        Ok(Formula::and(equivalences))
    })
}

/// Build all six families in assembly order
pub fn build_all(ns: &mut Namespace, sets: &[InfeasibleSets]) -> Result<[Formula; 6]> {
    Ok([
        packing_completeness(ns)?,
        clique_contiguity(ns)?,
        no_axis_overlap(ns)?,
        infeasible_set_exclusion(ns, sets)?,
        non_empty_monotonicity(ns)?,
        edge_correlation(ns)?,
    ])
}
