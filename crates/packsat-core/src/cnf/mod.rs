//! Conjunctive normal form at the solver boundary.
//!
//! The assembled formula is turned into clauses here. Negations are pushed
//! to the leaves first, then disjunctions are distributed over conjunctions.
//! All six constraint families clausify exactly this way, without auxiliary
//! variables. A disjunction whose expansion would exceed
//! [`DISTRIBUTION_LIMIT`] clauses is abbreviated by a fresh variable `t`
//! with the clauses `!t | C` for every clause `C` of the abbreviated part.

pub mod dimacs;

use std::collections::HashMap;
use std::fmt;

use crate::encoding::families::ConstraintFamily;
use crate::encoding::Encoding;
use crate::formula::Formula;

/// A literal in DIMACS terms - positive means "true", negative means "false"
pub type Literal = i32;

/// Largest clause product expanded by distribution
pub const DISTRIBUTION_LIMIT: usize = 4096;

/// A disjunction of literals.
#[derive(Clone, PartialEq, Eq)]
pub struct Clause {
    /// The literals in this clause
    literals: Vec<Literal>,
    /// Family the clause came from, `None` for definitions of fresh variables
    family: Option<ConstraintFamily>,
    /// Clause ID (assigned by ClauseSet)
    id: u32,
}

impl Clause {
    /// Create a new clause with the given literals
    pub fn new(literals: Vec<Literal>, family: Option<ConstraintFamily>) -> Self {
        Self {
            literals,
            family,
            id: 0,
        }
    }

    /// Get the clause ID
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    pub fn family(&self) -> Option<ConstraintFamily> {
        self.family
    }

    /// Check if this is a unit clause (single literal)
    pub fn is_unit(&self) -> bool {
        self.literals.len() == 1
    }

    /// Get the number of literals
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    /// An empty clause can never be satisfied
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Check the clause against a total assignment
    pub fn is_satisfied_by<F>(&self, value: F) -> bool
    where
        F: Fn(Literal) -> bool,
    {
        self.literals.iter().any(|&lit| value(lit))
    }
}

impl fmt::Debug for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Clause({:?}, {:?})", self.family, self.literals)
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let literals: Vec<String> = self.literals.iter().map(|l| l.to_string()).collect();
        let family = self.family.map(|family| family.name()).unwrap_or("definition");
        write!(f, "({}) [{}]", family, literals.join(" | "))
    }
}

/// Collection of clauses over variables `1..=num_vars`.
#[derive(Debug, Clone, Default)]
pub struct ClauseSet {
    /// All clauses indexed by ID
    clauses: Vec<Clause>,
    /// Highest variable number in use
    num_vars: u32,
    /// Variables that belong to the namespace, the rest are fresh
    named_vars: u32,
    /// Clause count per family
    by_family: HashMap<ConstraintFamily, usize>,
}

impl ClauseSet {
    /// Create a new empty clause set over `num_vars` named variables
    pub fn new(num_vars: u32) -> Self {
        Self {
            clauses: Vec::new(),
            num_vars,
            named_vars: num_vars,
            by_family: HashMap::new(),
        }
    }

    /// Add a clause, returning its ID
    pub fn add(&mut self, mut clause: Clause) -> u32 {
        let id = self.clauses.len() as u32;
        clause.id = id;

        if let Some(family) = clause.family {
            *self.by_family.entry(family).or_default() += 1;
        }
        if let Some(max) = clause.literals.iter().map(|l| l.unsigned_abs()).max() {
            self.num_vars = self.num_vars.max(max);
        }

        self.clauses.push(clause);
        id
    }

    /// Allocate a variable that is not part of the namespace
    pub fn fresh_variable(&mut self) -> u32 {
        self.num_vars += 1;
        self.num_vars
    }

    /// Get a clause by ID
    pub fn get(&self, id: u32) -> Option<&Clause> {
        self.clauses.get(id as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    /// Get unit clauses
    pub fn units(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter().filter(|c| c.is_unit())
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn num_vars(&self) -> u32 {
        self.num_vars
    }

    /// Number of variables that map back to namespace keys
    pub fn named_vars(&self) -> u32 {
        self.named_vars
    }

    /// Count clauses produced by one family
    pub fn count_by_family(&self, family: ConstraintFamily) -> usize {
        self.by_family.get(&family).copied().unwrap_or(0)
    }

    /// Check every clause against a total assignment
    pub fn is_satisfied_by<F>(&self, value: F) -> bool
    where
        F: Fn(Literal) -> bool,
    {
        self.clauses.iter().all(|c| c.is_satisfied_by(&value))
    }
}

/// Negation normal form over literals
#[derive(Debug, Clone)]
enum Nnf {
    Lit(Literal),
    And(Vec<Nnf>),
    Or(Vec<Nnf>),
}

fn nnf(formula: &Formula, positive: bool) -> Nnf {
    match formula {
        Formula::Var(id) => {
            let lit = id.get() as Literal;
            Nnf::Lit(if positive { lit } else { -lit })
        }
        Formula::Not(inner) => nnf(inner, !positive),
        Formula::And(parts) => {
            let parts = parts.iter().map(|p| nnf(p, positive)).collect();
            if positive {
                Nnf::And(parts)
            } else {
                Nnf::Or(parts)
            }
        }
        Formula::Or(parts) => {
            let parts = parts.iter().map(|p| nnf(p, positive)).collect();
            if positive {
                Nnf::Or(parts)
            } else {
                Nnf::And(parts)
            }
        }
        Formula::Implies(premise, conclusion) => {
            // a -> b == !a | b
            if positive {
                Nnf::Or(vec![nnf(premise, false), nnf(conclusion, true)])
            } else {
                Nnf::And(vec![nnf(premise, true), nnf(conclusion, false)])
            }
        }
        Formula::Iff(left, right) => {
            // a <-> b == (!a | b) & (a | !b), its negation == (a | b) & (!a | !b)
            if positive {
                Nnf::And(vec![
                    Nnf::Or(vec![nnf(left, false), nnf(right, true)]),
                    Nnf::Or(vec![nnf(left, true), nnf(right, false)]),
                ])
            } else {
                Nnf::And(vec![
                    Nnf::Or(vec![nnf(left, true), nnf(right, true)]),
                    Nnf::Or(vec![nnf(left, false), nnf(right, false)]),
                ])
            }
        }
    }
}

/// Turns formulas into clauses, tagging each with its family.
struct Clausifier {
    clauses: ClauseSet,
}

impl Clausifier {
    /// Clause list of an NNF node
    fn expand(&mut self, node: &Nnf) -> Vec<Vec<Literal>> {
        match node {
            Nnf::Lit(lit) => vec![vec![*lit]],
            Nnf::And(parts) => parts.iter().flat_map(|p| self.expand(p)).collect(),
            Nnf::Or(parts) => {
                let mut product: Vec<Vec<Literal>> = vec![Vec::new()];
                for part in parts {
                    let mut expanded = self.expand(part);
                    if expanded.len() > 1 && product.len() * expanded.len() > DISTRIBUTION_LIMIT {
                        expanded = vec![vec![self.abbreviate(expanded)]];
                    }

                    let mut next = Vec::with_capacity(product.len() * expanded.len());
                    for left in &product {
                        for right in &expanded {
                            let mut clause = left.clone();
                            clause.extend_from_slice(right);
                            next.push(clause);
                        }
                    }
                    product = next;
                }
                product
            }
        }
    }

    /// Introduce `t -> AND clauses` and return `t`
    fn abbreviate(&mut self, clauses: Vec<Vec<Literal>>) -> Literal {
        let t = self.clauses.fresh_variable() as Literal;
        log::trace!("Abbreviating {} clauses with fresh variable {}", clauses.len(), t);
        for mut clause in clauses {
            clause.insert(0, -t);
            self.push(clause, None);
        }
        t
    }

    /// Add a clause after merging duplicates; tautologies are dropped
    fn push(&mut self, mut literals: Vec<Literal>, family: Option<ConstraintFamily>) {
        literals.sort_by_key(|l| (l.unsigned_abs(), *l < 0));
        literals.dedup();
        if literals.windows(2).any(|w| w[0] == -w[1]) {
            return;
        }
        self.clauses.add(Clause::new(literals, family));
    }
}

/// Convert an encoding into clauses.
///
/// Variables keep their namespace ids; fresh variables, if any, are
/// numbered after them.
pub fn clausify(encoding: &Encoding) -> ClauseSet {
    let mut clausifier = Clausifier {
        clauses: ClauseSet::new(encoding.namespace().len() as u32),
    };

    for family in ConstraintFamily::ALL {
        let formula = encoding.assembly().family_formula(family);
        let root = nnf(formula, true);
        for clause in clausifier.expand(&root) {
            clausifier.push(clause, Some(family));
        }
        log::debug!(
            "Family {}: {} clauses",
            family,
            clausifier.clauses.count_by_family(family)
        );
    }

    let clauses = clausifier.clauses;
    log::info!(
        "Clausified into {} clauses over {} variables ({} fresh)",
        clauses.len(),
        clauses.num_vars(),
        clauses.num_vars() - clauses.named_vars()
    );
    clauses
}

/// Convert a standalone formula, tagging every clause with `family`
pub fn clausify_formula(
    formula: &Formula,
    num_vars: u32,
    family: Option<ConstraintFamily>,
) -> ClauseSet {
    let mut clausifier = Clausifier {
        clauses: ClauseSet::new(num_vars),
    };
    let root = nnf(formula, true);
    for clause in clausifier.expand(&root) {
        clausifier.push(clause, family);
    }
    clausifier.clauses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::variable::VariableId;
    use crate::encoding::Encoder;
    use crate::instance::{Container, Instance, Item};

    fn v(id: u32) -> Formula {
        Formula::var(VariableId::new(id))
    }

    fn literal_sets(clauses: &ClauseSet) -> Vec<Vec<Literal>> {
        clauses.iter().map(|c| c.literals().to_vec()).collect()
    }

    /// Every assignment over `num_vars` variables, for small equivalence checks
    fn assignments(num_vars: u32) -> impl Iterator<Item = Vec<bool>> {
        (0u32..(1 << num_vars))
            .map(move |mask| (0..num_vars).map(|i| mask & (1 << i) != 0).collect())
    }

    #[test]
    fn test_implication_clause() {
        // (x1 & x2) -> x3  ==  !x1 | !x2 | x3
        let f = Formula::implies(Formula::and([v(1), v(2)]), v(3));
        let clauses = clausify_formula(&f, 3, None);
        assert_eq!(literal_sets(&clauses), vec![vec![-1, -2, 3]]);
    }

    #[test]
    fn test_iff_and_clauses() {
        // x1 <-> (x2 & x3)
        let f = Formula::iff(v(1), Formula::and([v(2), v(3)]));
        let clauses = clausify_formula(&f, 3, None);
        assert_eq!(literal_sets(&clauses), vec![vec![-1, 2], vec![-1, 3], vec![1, -2, -3]]);
    }

    #[test]
    fn test_empty_disjunction_is_empty_clause() {
        let f = Formula::and([Formula::or([])]);
        let clauses = clausify_formula(&f, 0, None);
        assert_eq!(clauses.len(), 1);
        assert!(clauses.get(0).unwrap().is_empty());
    }

    #[test]
    fn test_tautologies_dropped_and_duplicates_merged() {
        let f = Formula::and([
            Formula::or([v(1), Formula::not(v(1))]),
            Formula::or([v(2), v(2), v(3)]),
        ]);
        let clauses = clausify_formula(&f, 3, None);
        assert_eq!(literal_sets(&clauses), vec![vec![2, 3]]);
    }

    #[test]
    fn test_clausification_is_equivalent() {
        let f = Formula::and([
            Formula::iff(Formula::or([v(1), v(2), v(3)]), v(4)),
            Formula::implies(
                Formula::and([Formula::not(v(1)), Formula::not(v(2))]),
                Formula::and([Formula::not(v(3)), Formula::not(v(4))]),
            ),
            Formula::not(Formula::iff(v(1), v(3))),
        ]);
        let clauses = clausify_formula(&f, 4, None);
        assert_eq!(clauses.num_vars(), 4);

        for values in assignments(4) {
            let value = |id: VariableId| values[id.index()];
            let lit_value = |lit: Literal| values[lit.unsigned_abs() as usize - 1] == (lit > 0);
            assert_eq!(f.evaluate(&value), clauses.is_satisfied_by(lit_value));
        }
    }

    #[test]
    fn test_large_disjunction_is_abbreviated() {
        // OR of two conjunctions of 100 literals would need 10_000 clauses
        let left = Formula::and((1..=100).map(v));
        let right = Formula::and((101..=200).map(v));
        let f = Formula::or([left, right]);

        let clauses = clausify_formula(&f, 200, None);
        assert_eq!(clauses.named_vars(), 200);
        assert_eq!(clauses.num_vars(), 201);
        assert!(clauses.len() <= 100 + 100);
    }

    #[test]
    fn test_encoding_needs_no_fresh_variables() {
        let instance = Instance::new(
            Container::new(vec![4, 6]),
            vec![Item::new(vec![1, 2]), Item::new(vec![3, 1]), Item::new(vec![2, 1])],
        )
        .unwrap();
        let encoding = Encoder::new().encode(&instance).unwrap();
        let clauses = clausify(&encoding);

        assert_eq!(clauses.num_vars(), clauses.named_vars());
        assert_eq!(clauses.num_vars() as usize, encoding.namespace().len());
        // 2 axes * 3 items
        assert_eq!(clauses.count_by_family(ConstraintFamily::Completeness), 6);
        // 3 pairs, one clause each
        assert_eq!(clauses.count_by_family(ConstraintFamily::NoOverlap), 3);
        // per pair and axis: 3 clauses per slot plus 1 + n for the edge equivalence
        assert_eq!(
            clauses.count_by_family(ConstraintFamily::Correlation),
            3 * 2 * (3 * 3 + 1 + 3)
        );
    }
}
