use serde::Serialize;

use super::families::ConstraintFamily;
use crate::formula::Formula;

/// Size figures reported once a formula is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FormulaStats {
    /// Distinct variables occurring in the formula
    pub variable_count: usize,
    /// Sub-expression nodes, the root conjunction included
    pub formula_size: usize,
}

/// Per-family figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FamilySummary {
    pub family: ConstraintFamily,
    /// Top-level conjuncts of the family formula
    pub constraints: usize,
    /// Sub-expression nodes of the family formula
    pub size: usize,
}

/// The conjunction of the six families, in family order.
#[derive(Debug, Clone)]
pub struct Assembly {
    formula: Formula,
    stats: FormulaStats,
    families: Vec<FamilySummary>,
}

impl Assembly {
    /// The complete formula, `And` of the six family formulas
    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    pub fn stats(&self) -> FormulaStats {
        self.stats
    }

    pub fn families(&self) -> &[FamilySummary] {
        &self.families
    }

    /// The sub-formula contributed by one family
    pub fn family_formula(&self, family: ConstraintFamily) -> &Formula {
        match &self.formula {
            Formula::And(parts) => &parts[family.position()],
            _ => unreachable!("assembled formulas are always a conjunction of six families"),
        }
    }

    pub fn summary(&self, family: ConstraintFamily) -> FamilySummary {
        self.families[family.position()]
    }

    pub fn into_formula(self) -> Formula {
        self.formula
    }
}

/// Conjoin the six family formulas without reordering them.
pub fn assemble(families: [Formula; 6]) -> Assembly {
    let summaries: Vec<FamilySummary> = ConstraintFamily::ALL
        .iter()
        .zip(families.iter())
        .map(|(&family, formula)| FamilySummary {
            family,
            constraints: match formula {
                Formula::And(parts) => parts.len(),
                _ => 1,
            },
            size: formula.size(),
        })
        .collect();

    for summary in &summaries {
        log::debug!(
            "Family {}: {} constraints, {} nodes",
            summary.family,
            summary.constraints,
            summary.size
        );
    }

    let formula = Formula::and(families);
    let stats = FormulaStats {
        variable_count: formula.variables().len(),
        formula_size: formula.size(),
    };

    log::debug!(
        "Assembled formula: {} variables, {} nodes",
        stats.variable_count,
        stats.formula_size
    );

    Assembly {
        formula,
        stats,
        families: summaries,
    }
}
