use crate::cnf::{Clause, ClauseSet, Literal};

/// Two-watched literals graph for efficient unit propagation.
///
/// Each clause of two or more literals watches exactly 2 of them. When a
/// watched literal becomes false, we try to find another literal to watch.
/// The pair currently watched is stored per clause, so moving one watch
/// never leaves the other side pointing at a stale literal.
#[derive(Debug)]
pub struct WatchGraph {
    /// Maps literal index -> clauses watching that literal
    watches: Vec<Vec<u32>>,
    /// Watched pair per clause ID, `None` for units and empty clauses
    watched: Vec<Option<[Literal; 2]>>,
}

impl WatchGraph {
    /// Create a new empty watch graph
    pub fn new() -> Self {
        Self {
            watches: Vec::new(),
            watched: Vec::new(),
        }
    }

    /// Convert literal to index (handles positive and negative literals)
    fn literal_to_index(literal: Literal) -> usize {
        let abs = literal.unsigned_abs() as usize;
        if literal > 0 {
            abs * 2
        } else {
            abs * 2 + 1
        }
    }

    /// Get mutable reference to watches for a literal, resizing if needed
    fn get_watches_mut(&mut self, literal: Literal) -> &mut Vec<u32> {
        let idx = Self::literal_to_index(literal);
        if idx >= self.watches.len() {
            self.watches.resize(idx + 1, Vec::new());
        }
        &mut self.watches[idx]
    }

    /// Build the watch graph from a clause set
    pub fn from_clauses(clauses: &ClauseSet) -> Self {
        let mut graph = Self::new();
        for clause in clauses.iter() {
            graph.add_clause(clause);
        }
        graph
    }

    /// Add a clause to the watch graph.
    ///
    /// Literals of the clause must be distinct.
    pub fn add_clause(&mut self, clause: &Clause) {
        let id = clause.id() as usize;
        if id >= self.watched.len() {
            self.watched.resize(id + 1, None);
        }

        let literals = clause.literals();
        if literals.len() < 2 {
            return; // Units are handled as assertions
        }

        let (watch1, watch2) = (literals[0], literals[1]);
        self.watched[id] = Some([watch1, watch2]);
        self.get_watches_mut(watch1).push(clause.id());
        self.get_watches_mut(watch2).push(clause.id());
    }

    /// Get clauses watching a specific literal
    pub fn get_watches(&self, literal: Literal) -> &[u32] {
        let idx = Self::literal_to_index(literal);
        if idx < self.watches.len() {
            &self.watches[idx]
        } else {
            &[]
        }
    }

    /// The pair a clause currently watches
    pub fn watched(&self, clause_id: u32) -> Option<[Literal; 2]> {
        self.watched.get(clause_id as usize).copied().flatten()
    }
}

impl Default for WatchGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of propagating a literal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropagateResult {
    /// A new unit was found that must be propagated
    Unit(Literal, u32), // (literal to assign, clause_id)
    /// A conflict was found
    Conflict(u32), // clause_id
}

/// Propagator handles unit propagation using the watch graph
#[derive(Debug)]
pub struct Propagator<'a> {
    graph: &'a mut WatchGraph,
    clauses: &'a ClauseSet,
}

impl<'a> Propagator<'a> {
    /// Create a new propagator
    pub fn new(graph: &'a mut WatchGraph, clauses: &'a ClauseSet) -> Self {
        Self { graph, clauses }
    }

    /// Propagate a literal that just became true.
    ///
    /// Every clause watching its negation either finds a new literal to
    /// watch, is satisfied by its other watch, or reports a unit or a
    /// conflict. Propagation stops at the first conflict.
    pub fn propagate<F>(&mut self, literal: Literal, value: F) -> Vec<PropagateResult>
    where
        F: Fn(Literal) -> Option<bool>, // None = undecided
    {
        let mut results = Vec::new();
        let false_literal = -literal;

        let idx = WatchGraph::literal_to_index(false_literal);
        let Some(list) = self.graph.watches.get_mut(idx) else {
            return results;
        };
        let watching = std::mem::take(list);
        let mut kept = Vec::with_capacity(watching.len());
        let mut pending = watching.into_iter();

        while let Some(clause_id) = pending.next() {
            let Some(mut pair) = self.graph.watched(clause_id) else {
                continue;
            };
            if pair[0] != false_literal {
                pair.swap(0, 1);
            }
            let other = pair[1];

            if value(other) == Some(true) {
                kept.push(clause_id);
                continue;
            }

            let replacement = self.clauses.get(clause_id).and_then(|clause| {
                clause
                    .literals()
                    .iter()
                    .copied()
                    .find(|&lit| lit != false_literal && lit != other && value(lit) != Some(false))
            });

            if let Some(lit) = replacement {
                self.graph.watched[clause_id as usize] = Some([lit, other]);
                self.graph.get_watches_mut(lit).push(clause_id);
                continue;
            }

            kept.push(clause_id);
            match value(other) {
                None => results.push(PropagateResult::Unit(other, clause_id)),
                _ => {
                    results.push(PropagateResult::Conflict(clause_id));
                    kept.extend(pending);
                    break;
                }
            }
        }

        self.graph.watches[idx] = kept;
        results
    }
}
