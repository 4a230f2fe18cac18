//! Reduction of a packing instance to a Boolean formula.
//!
//! A packing exists iff, for every axis, the interval graph of item
//! projections admits a clique ordering in which every stable set fits the
//! container. The encoding models that with four variable families:
//!
//! - `c[i][x][a]`: item `x` belongs to clique (slot) `a` on axis `i`
//! - `e[i][x][y]`: items `x` and `y` overlap on axis `i`
//! - `p[i][x][y][a]`: items `x` and `y` both belong to slot `a` on axis `i`
//! - `u[i][a]`: slot `a` on axis `i` is used (reserved, not emitted)
//!
//! # Pipeline
//!
//! 1. **Validation**: malformed instances are rejected before any variable exists
//! 2. **Enumeration**: minimal infeasible sets per axis ([`enumerator`])
//! 3. **Constraints**: the six families ([`families`])
//! 4. **Assembly**: conjunction plus statistics ([`assembler`])
//!
//! # Example
//!
//! ```
//! use packsat_core::{Container, Encoder, Instance, Item};
//!
//! let instance = Instance::new(
//!     Container::new(vec![4, 6]),
//!     vec![Item::new(vec![1, 2]), Item::new(vec![3, 1]), Item::new(vec![2, 1])],
//! ).unwrap();
//!
//! let encoding = Encoder::new().encode(&instance).unwrap();
//! assert_eq!(encoding.stats().variable_count, 2 * 9 + 2 * 3 + 2 * 3 * 3);
//! ```

pub mod assembler;
pub mod enumerator;
pub mod families;
pub mod variable;

pub use assembler::{assemble, Assembly, FamilySummary, FormulaStats};
pub use enumerator::{enumerate, InfeasibleSets};
pub use families::ConstraintFamily;
pub use variable::{Namespace, VariableId, VariableKey, VariableKind};

use crate::error::Result;
use crate::formula::Formula;
use crate::instance::Instance;

/// Encodes instances into formulas.
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    _private: (),
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode an instance.
    ///
    /// The instance is validated first, so a malformed instance never
    /// leaves a partially built namespace behind.
    pub fn encode(&self, instance: &Instance) -> Result<Encoding> {
        instance.validate()?;

        let start = std::time::Instant::now();
        let (d, n) = (instance.dimension(), instance.len());
        let mut namespace = Namespace::new(d, n);

        let infeasible = (1..=d)
            .map(|axis| {
                enumerator::enumerate(axis, instance.items(), instance.container().capacity(axis))
            })
            .collect::<Result<Vec<_>>>()?;

        let families = families::build_all(&mut namespace, &infeasible)?;
        let assembly = assembler::assemble(families);

        log::info!(
            "Encoded {} items in {} dimensions: {} variables, {} nodes in {:?}",
            n,
            d,
            assembly.stats().variable_count,
            assembly.stats().formula_size,
            start.elapsed()
        );

        Ok(Encoding {
            namespace,
            infeasible,
            assembly,
        })
    }
}

/// Output of one encoding pass.
#[derive(Debug, Clone)]
pub struct Encoding {
    namespace: Namespace,
    infeasible: Vec<InfeasibleSets>,
    assembly: Assembly,
}

impl Encoding {
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Enumerator output, one entry per axis in axis order
    pub fn infeasible_sets(&self) -> &[InfeasibleSets] {
        &self.infeasible
    }

    pub fn assembly(&self) -> &Assembly {
        &self.assembly
    }

    pub fn formula(&self) -> &Formula {
        self.assembly.formula()
    }

    pub fn stats(&self) -> FormulaStats {
        self.assembly.stats()
    }

    /// `(item, axis)` pairs where one item alone exceeds the container
    pub fn oversized_items(&self) -> Vec<(usize, usize)> {
        self.infeasible
            .iter()
            .flat_map(|sets| sets.oversized().iter().map(move |&item| (item, sets.axis())))
            .collect()
    }

    /// Variable count predicted for `n` items in `d` axes.
    ///
    /// The families register every `c`, `e` and `p` variable and no `u`
    /// variable, so this is exact for every instance.
    pub fn expected_variable_count(d: usize, n: usize) -> usize {
        let pairs = n * n.saturating_sub(1) / 2;
        d * n * n + d * pairs + d * pairs * n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PackError;
    use crate::instance::{Container, Item};

    fn instance(container: &[u64], items: &[&[u64]]) -> Instance {
        Instance::new(
            Container::new(container.to_vec()),
            items.iter().map(|i| Item::new(i.to_vec())).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_encode_counts() {
        let inst = instance(&[4, 6], &[&[1, 2], &[3, 1], &[2, 1]]);
        let encoding = Encoder::new().encode(&inst).unwrap();

        assert_eq!(encoding.stats().variable_count, Encoding::expected_variable_count(2, 3));
        assert_eq!(encoding.namespace().len(), encoding.stats().variable_count);
        assert_eq!(encoding.namespace().count_of(VariableKind::Used), 0);
        assert_eq!(encoding.infeasible_sets().len(), 2);
        assert!(encoding.oversized_items().is_empty());
    }

    #[test]
    fn test_single_item_counts() {
        let inst = instance(&[4, 6], &[&[1, 2]]);
        let encoding = Encoder::new().encode(&inst).unwrap();
        assert_eq!(encoding.stats().variable_count, 2);
        assert_eq!(Encoding::expected_variable_count(2, 1), 2);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let inst = instance(&[5, 5], &[&[3, 2], &[3, 3], &[2, 4], &[1, 1]]);
        let first = Encoder::new().encode(&inst).unwrap();
        let second = Encoder::new().encode(&inst).unwrap();

        assert_eq!(first.stats(), second.stats());
        assert_eq!(first.assembly().families(), second.assembly().families());
        assert_eq!(first.formula(), second.formula());
        assert_eq!(first.infeasible_sets(), second.infeasible_sets());
    }

    #[test]
    fn test_oversized_items_reported() {
        let inst = instance(&[4, 6], &[&[5, 2], &[1, 1]]);
        let encoding = Encoder::new().encode(&inst).unwrap();
        assert_eq!(encoding.oversized_items(), vec![(1, 1)]);
    }

    #[test]
    fn test_malformed_instance_rejected_before_encoding() {
        // Deserialization skips validation, so build the bad instance from JSON
        let bad: Instance =
            serde_json::from_str(r#"{"container": [4, 6], "items": [[1, 2], [3]]}"#).unwrap();
        let err = Encoder::new().encode(&bad).unwrap_err();
        assert!(matches!(err, PackError::MalformedInstance { .. }));
    }
}
