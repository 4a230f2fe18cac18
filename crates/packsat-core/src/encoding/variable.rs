use std::fmt;
use std::str::FromStr;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::{PackError, Result};

/// The four families of Boolean variables in the encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VariableKind {
    /// `c[axis][item][slot]`: item occupies the slot on the axis
    Clique,
    /// `e[axis][x][y]`: projections of x and y overlap on the axis
    Edge,
    /// `p[axis][x][y][slot]`: x and y both occupy the slot on the axis
    Pair,
    /// `u[axis][slot]`: slot is non-empty (reserved, no constraint uses it)
    Used,
}

impl VariableKind {
    /// All kinds in symbol order
    pub const ALL: [VariableKind; 4] = [
        VariableKind::Clique,
        VariableKind::Edge,
        VariableKind::Pair,
        VariableKind::Used,
    ];

    /// Single letter used in textual keys
    pub fn symbol(&self) -> char {
        match self {
            VariableKind::Clique => 'c',
            VariableKind::Edge => 'e',
            VariableKind::Pair => 'p',
            VariableKind::Used => 'u',
        }
    }

    /// Number of indices a key of this kind carries
    pub fn arity(&self) -> usize {
        match self {
            VariableKind::Clique | VariableKind::Edge => 3,
            VariableKind::Pair => 4,
            VariableKind::Used => 2,
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for VariableKind {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "c" => Ok(VariableKind::Clique),
            "e" => Ok(VariableKind::Edge),
            "p" => Ok(VariableKind::Pair),
            "u" => Ok(VariableKind::Used),
            other => Err(PackError::InvalidVariableKind {
                kind: other.to_string(),
            }),
        }
    }
}

/// Semantic address of a Boolean variable.
///
/// All indices are 1-based. For `Edge` and `Pair` the item pair must be
/// passed in increasing order; the namespace rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VariableKey {
    Clique { axis: usize, item: usize, slot: usize },
    Edge { axis: usize, x: usize, y: usize },
    Pair { axis: usize, x: usize, y: usize, slot: usize },
    Used { axis: usize, slot: usize },
}

impl VariableKey {
    pub fn clique(axis: usize, item: usize, slot: usize) -> Self {
        VariableKey::Clique { axis, item, slot }
    }

    pub fn edge(axis: usize, x: usize, y: usize) -> Self {
        VariableKey::Edge { axis, x, y }
    }

    pub fn pair(axis: usize, x: usize, y: usize, slot: usize) -> Self {
        VariableKey::Pair { axis, x, y, slot }
    }

    pub fn used(axis: usize, slot: usize) -> Self {
        VariableKey::Used { axis, slot }
    }

    /// Build a key from a kind and a flat index list, checking the arity
    pub fn from_parts(kind: VariableKind, indices: &[usize]) -> Result<Self> {
        if indices.len() != kind.arity() {
            return Err(PackError::InvalidArity {
                kind,
                expected: kind.arity(),
                found: indices.len(),
            });
        }

        Ok(match kind {
            VariableKind::Clique => Self::clique(indices[0], indices[1], indices[2]),
            VariableKind::Edge => Self::edge(indices[0], indices[1], indices[2]),
            VariableKind::Pair => Self::pair(indices[0], indices[1], indices[2], indices[3]),
            VariableKind::Used => Self::used(indices[0], indices[1]),
        })
    }

    pub fn kind(&self) -> VariableKind {
        match self {
            VariableKey::Clique { .. } => VariableKind::Clique,
            VariableKey::Edge { .. } => VariableKind::Edge,
            VariableKey::Pair { .. } => VariableKind::Pair,
            VariableKey::Used { .. } => VariableKind::Used,
        }
    }

    /// Flat index list, in the order accepted by [`VariableKey::from_parts`]
    pub fn indices(&self) -> Vec<usize> {
        match *self {
            VariableKey::Clique { axis, item, slot } => vec![axis, item, slot],
            VariableKey::Edge { axis, x, y } => vec![axis, x, y],
            VariableKey::Pair { axis, x, y, slot } => vec![axis, x, y, slot],
            VariableKey::Used { axis, slot } => vec![axis, slot],
        }
    }

    pub fn axis(&self) -> usize {
        match *self {
            VariableKey::Clique { axis, .. }
            | VariableKey::Edge { axis, .. }
            | VariableKey::Pair { axis, .. }
            | VariableKey::Used { axis, .. } => axis,
        }
    }
}

impl fmt::Display for VariableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())?;
        for index in self.indices() {
            write!(f, "_{}", index)?;
        }
        Ok(())
    }
}

impl FromStr for VariableKey {
    type Err = PackError;

    /// Parse the `c_1_2_3` form produced by `Display`
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split('_');
        let kind: VariableKind = parts.next().unwrap_or_default().parse()?;
        let indices = parts
            .map(|part| {
                part.parse::<usize>().map_err(|_| PackError::InvalidIndex {
                    key: s.to_string(),
                    reason: format!("'{}' is not an index", part),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::from_parts(kind, &indices)
    }
}

/// Dense 1-based variable number, directly usable as a DIMACS variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableId(u32);

impl VariableId {
    pub fn new(id: u32) -> Self {
        debug_assert!(id > 0, "variable ids are 1-based");
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Zero-based position, for indexing dense tables
    #[inline]
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// Collision-free mapping between variable keys and ids.
///
/// Ids are handed out in first-use order and never reused, so encoding the
/// same instance twice yields the same numbering. Keys are bounds-checked
/// against the instance shape the namespace was created for.
#[derive(Debug, Clone)]
pub struct Namespace {
    dimension: usize,
    items: usize,
    keys: IndexSet<VariableKey>,
}

impl Namespace {
    /// Create an empty namespace for `items` items in `dimension` axes
    pub fn new(dimension: usize, items: usize) -> Self {
        Self {
            dimension,
            items,
            keys: IndexSet::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of items, which is also the number of slots per axis
    pub fn items(&self) -> usize {
        self.items
    }

    /// Address a variable, registering it on first use
    pub fn address(&mut self, key: VariableKey) -> Result<VariableId> {
        if let Some(index) = self.keys.get_index_of(&key) {
            return Ok(Self::id_at(index));
        }

        self.check(&key)?;
        let (index, _) = self.keys.insert_full(key);
        Ok(Self::id_at(index))
    }

    /// Address a variable from an untyped kind symbol and index list
    pub fn address_parts(&mut self, kind: &str, indices: &[usize]) -> Result<VariableId> {
        let kind: VariableKind = kind.parse()?;
        let key = VariableKey::from_parts(kind, indices)?;
        self.address(key)
    }

    /// Id of an already registered key
    pub fn lookup(&self, key: &VariableKey) -> Option<VariableId> {
        self.keys.get_index_of(key).map(Self::id_at)
    }

    /// Inverse mapping
    pub fn key(&self, id: VariableId) -> Option<&VariableKey> {
        self.keys.get_index(id.index())
    }

    /// Number of registered variables
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Registered variables in id order
    pub fn iter(&self) -> impl Iterator<Item = (VariableId, &VariableKey)> + '_ {
        self.keys
            .iter()
            .enumerate()
            .map(|(index, key)| (Self::id_at(index), key))
    }

    /// Count registered variables of one kind
    pub fn count_of(&self, kind: VariableKind) -> usize {
        self.keys.iter().filter(|k| k.kind() == kind).count()
    }

    #[inline]
    fn id_at(index: usize) -> VariableId {
        VariableId::new(index as u32 + 1)
    }

    fn check(&self, key: &VariableKey) -> Result<()> {
        let fail = |reason: String| PackError::InvalidIndex {
            key: key.to_string(),
            reason,
        };
        let within = |value: usize, bound: usize, what: &str| {
            if value == 0 || value > bound {
                Err(fail(format!("{} {} outside 1..={}", what, value, bound)))
            } else {
                Ok(())
            }
        };

        within(key.axis(), self.dimension, "axis")?;

        match *key {
            VariableKey::Clique { item, slot, .. } => {
                within(item, self.items, "item")?;
                within(slot, self.items, "slot")?;
            }
            VariableKey::Edge { x, y, .. } => {
                within(x, self.items, "item")?;
                within(y, self.items, "item")?;
            }
            VariableKey::Pair { x, y, slot, .. } => {
                within(x, self.items, "item")?;
                within(y, self.items, "item")?;
                within(slot, self.items, "slot")?;
            }
            VariableKey::Used { slot, .. } => {
                within(slot, self.items, "slot")?;
            }
        }

        if let VariableKey::Edge { x, y, .. } | VariableKey::Pair { x, y, .. } = *key {
            if x >= y {
                return Err(fail(format!("item pair ({}, {}) is not increasing", x, y)));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_is_memoized() {
        let mut ns = Namespace::new(2, 3);
        let a = ns.address(VariableKey::clique(1, 2, 3)).unwrap();
        let b = ns.address(VariableKey::clique(1, 2, 3)).unwrap();
        let c = ns.address(VariableKey::clique(2, 2, 3)).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.get(), 1);
        assert_eq!(c.get(), 2);
        assert_eq!(ns.len(), 2);
    }

    #[test]
    fn test_distinct_kinds_do_not_collide() {
        let mut ns = Namespace::new(2, 3);
        let clique = ns.address(VariableKey::clique(1, 1, 2)).unwrap();
        let edge = ns.address(VariableKey::edge(1, 1, 2)).unwrap();
        let used = ns.address(VariableKey::used(1, 2)).unwrap();

        assert_ne!(clique, edge);
        assert_ne!(edge, used);
        assert_eq!(ns.key(edge), Some(&VariableKey::edge(1, 1, 2)));
    }

    #[test]
    fn test_inverse_mapping() {
        let mut ns = Namespace::new(2, 4);
        let key = VariableKey::pair(2, 1, 4, 3);
        let id = ns.address(key).unwrap();
        assert_eq!(ns.key(id), Some(&key));
        assert_eq!(ns.lookup(&key), Some(id));
        assert_eq!(ns.lookup(&VariableKey::pair(2, 1, 4, 2)), None);
    }

    #[test]
    fn test_invalid_kind() {
        let mut ns = Namespace::new(2, 3);
        let err = ns.address_parts("q", &[1, 1, 1]).unwrap_err();
        assert!(matches!(err, PackError::InvalidVariableKind { ref kind } if kind == "q"));
    }

    #[test]
    fn test_invalid_arity() {
        let mut ns = Namespace::new(2, 3);
        let err = ns.address_parts("p", &[1, 1, 2]).unwrap_err();
        assert!(matches!(
            err,
            PackError::InvalidArity {
                kind: VariableKind::Pair,
                expected: 4,
                found: 3
            }
        ));

        let err = ns.address_parts("u", &[1, 1, 1]).unwrap_err();
        assert!(matches!(err, PackError::InvalidArity { expected: 2, .. }));
    }

    #[test]
    fn test_address_parts_matches_typed_key() {
        let mut ns = Namespace::new(2, 3);
        let typed = ns.address(VariableKey::edge(2, 1, 3)).unwrap();
        let untyped = ns.address_parts("e", &[2, 1, 3]).unwrap();
        assert_eq!(typed, untyped);
    }

    #[test]
    fn test_pair_order_enforced() {
        let mut ns = Namespace::new(2, 3);
        assert!(matches!(
            ns.address(VariableKey::edge(1, 2, 1)),
            Err(PackError::InvalidIndex { .. })
        ));
        assert!(matches!(
            ns.address(VariableKey::pair(1, 2, 2, 1)),
            Err(PackError::InvalidIndex { .. })
        ));
        assert!(ns.is_empty());
    }

    #[test]
    fn test_bounds_enforced() {
        let mut ns = Namespace::new(2, 3);
        assert!(ns.address(VariableKey::clique(3, 1, 1)).is_err());
        assert!(ns.address(VariableKey::clique(0, 1, 1)).is_err());
        assert!(ns.address(VariableKey::clique(1, 4, 1)).is_err());
        assert!(ns.address(VariableKey::clique(1, 1, 4)).is_err());
        assert!(ns.address(VariableKey::used(1, 3)).is_ok());
    }

    #[test]
    fn test_key_display_and_parse() {
        let key = VariableKey::pair(1, 2, 3, 4);
        assert_eq!(key.to_string(), "p_1_2_3_4");
        assert_eq!("p_1_2_3_4".parse::<VariableKey>().unwrap(), key);
        assert_eq!("c_2_1_1".parse::<VariableKey>().unwrap(), VariableKey::clique(2, 1, 1));

        assert!(matches!(
            "z_1_1".parse::<VariableKey>(),
            Err(PackError::InvalidVariableKind { .. })
        ));
        assert!(matches!(
            "e_1_2".parse::<VariableKey>(),
            Err(PackError::InvalidArity { .. })
        ));
        assert!(matches!(
            "e_1_a_2".parse::<VariableKey>(),
            Err(PackError::InvalidIndex { .. })
        ));
    }

    #[test]
    fn test_count_of() {
        let mut ns = Namespace::new(1, 2);
        ns.address(VariableKey::clique(1, 1, 1)).unwrap();
        ns.address(VariableKey::clique(1, 2, 1)).unwrap();
        ns.address(VariableKey::edge(1, 1, 2)).unwrap();
        assert_eq!(ns.count_of(VariableKind::Clique), 2);
        assert_eq!(ns.count_of(VariableKind::Edge), 1);
        assert_eq!(ns.count_of(VariableKind::Pair), 0);
    }
}
