//! Boolean expression trees over namespace variables.

use std::collections::BTreeSet;
use std::fmt;

use crate::encoding::variable::{Namespace, VariableId};

/// An immutable Boolean formula.
///
/// An empty `And` is true and an empty `Or` is false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formula {
    Var(VariableId),
    Not(Box<Formula>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
    Implies(Box<Formula>, Box<Formula>),
    Iff(Box<Formula>, Box<Formula>),
}

impl Formula {
    pub fn var(id: VariableId) -> Self {
        Formula::Var(id)
    }

    /// Negation of a formula
    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Formula) -> Self {
        Formula::Not(Box::new(inner))
    }

    pub fn and(parts: impl IntoIterator<Item = Formula>) -> Self {
        Formula::And(parts.into_iter().collect())
    }

    pub fn or(parts: impl IntoIterator<Item = Formula>) -> Self {
        Formula::Or(parts.into_iter().collect())
    }

    pub fn implies(premise: Formula, conclusion: Formula) -> Self {
        Formula::Implies(Box::new(premise), Box::new(conclusion))
    }

    pub fn iff(left: Formula, right: Formula) -> Self {
        Formula::Iff(Box::new(left), Box::new(right))
    }

    /// Number of sub-expression nodes, leaves included
    pub fn size(&self) -> usize {
        match self {
            Formula::Var(_) => 1,
            Formula::Not(inner) => 1 + inner.size(),
            Formula::And(parts) | Formula::Or(parts) => {
                1 + parts.iter().map(Formula::size).sum::<usize>()
            }
            Formula::Implies(left, right) | Formula::Iff(left, right) => {
                1 + left.size() + right.size()
            }
        }
    }

    /// Distinct variables occurring in the formula
    pub fn variables(&self) -> BTreeSet<VariableId> {
        let mut vars = BTreeSet::new();
        self.collect_variables(&mut vars);
        vars
    }

    fn collect_variables(&self, vars: &mut BTreeSet<VariableId>) {
        match self {
            Formula::Var(id) => {
                vars.insert(*id);
            }
            Formula::Not(inner) => inner.collect_variables(vars),
            Formula::And(parts) | Formula::Or(parts) => {
                for part in parts {
                    part.collect_variables(vars);
                }
            }
            Formula::Implies(left, right) | Formula::Iff(left, right) => {
                left.collect_variables(vars);
                right.collect_variables(vars);
            }
        }
    }

    /// Evaluate under an assignment
    pub fn evaluate<F>(&self, value: &F) -> bool
    where
        F: Fn(VariableId) -> bool,
    {
        match self {
            Formula::Var(id) => value(*id),
            Formula::Not(inner) => !inner.evaluate(value),
            Formula::And(parts) => parts.iter().all(|p| p.evaluate(value)),
            Formula::Or(parts) => parts.iter().any(|p| p.evaluate(value)),
            Formula::Implies(left, right) => !left.evaluate(value) || right.evaluate(value),
            Formula::Iff(left, right) => left.evaluate(value) == right.evaluate(value),
        }
    }

    /// Render with variable keys instead of ids
    pub fn display<'a>(&'a self, namespace: &'a Namespace) -> FormulaDisplay<'a> {
        FormulaDisplay {
            formula: self,
            namespace: Some(namespace),
        }
    }

    fn write(&self, f: &mut fmt::Formatter<'_>, namespace: Option<&Namespace>) -> fmt::Result {
        let join = |f: &mut fmt::Formatter<'_>, parts: &[Formula], op: &str, empty: &str| {
            if parts.is_empty() {
                return write!(f, "{}", empty);
            }
            write!(f, "(")?;
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    write!(f, " {} ", op)?;
                }
                part.write(f, namespace)?;
            }
            write!(f, ")")
        };

        match self {
            Formula::Var(id) => match namespace.and_then(|ns| ns.key(*id)) {
                Some(key) => write!(f, "{}", key),
                None => write!(f, "{}", id),
            },
            Formula::Not(inner) => {
                write!(f, "!")?;
                inner.write(f, namespace)
            }
            Formula::And(parts) => join(f, parts, "&", "true"),
            Formula::Or(parts) => join(f, parts, "|", "false"),
            Formula::Implies(left, right) => {
                write!(f, "(")?;
                left.write(f, namespace)?;
                write!(f, " -> ")?;
                right.write(f, namespace)?;
                write!(f, ")")
            }
            Formula::Iff(left, right) => {
                write!(f, "(")?;
                left.write(f, namespace)?;
                write!(f, " <-> ")?;
                right.write(f, namespace)?;
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f, None)
    }
}

/// Display adapter returned by [`Formula::display`]
pub struct FormulaDisplay<'a> {
    formula: &'a Formula,
    namespace: Option<&'a Namespace>,
}

impl fmt::Display for FormulaDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.formula.write(f, self.namespace)
    }
}
