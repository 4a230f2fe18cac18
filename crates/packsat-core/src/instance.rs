//! Packing instances: a container and the items that must fit inside it.
//!
//! Instances can be built in code, read from a small text format or from
//! JSON, or generated at random for stress runs.
//!
//! # Text format
//!
//! ```text
//! # container: width height
//! 4 6
//! # one item per line
//! 1 2
//! 3 1
//! 2 1
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{PackError, Result};

/// Exclusive upper bound for random container extents
const RANDOM_CONTAINER_BOUND: u64 = 100;
/// Exclusive upper bound for random item extents
const RANDOM_ITEM_BOUND: u64 = 50;

/// A box to be packed, with one extent per axis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item {
    extents: Vec<u64>,
}

impl Item {
    /// Create an item from its extents
    pub fn new(extents: impl Into<Vec<u64>>) -> Self {
        Self {
            extents: extents.into(),
        }
    }

    /// Extent along a 1-based axis
    #[inline]
    pub fn extent(&self, axis: usize) -> u64 {
        self.extents[axis - 1]
    }

    /// All extents, axis 1 first
    pub fn extents(&self) -> &[u64] {
        &self.extents
    }

    /// Number of axes
    pub fn dimension(&self) -> usize {
        self.extents.len()
    }
}

impl From<Vec<u64>> for Item {
    fn from(extents: Vec<u64>) -> Self {
        Self::new(extents)
    }
}

/// The bin all items must fit into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Container {
    capacities: Vec<u64>,
}

impl Container {
    /// Create a container from its capacities
    pub fn new(capacities: impl Into<Vec<u64>>) -> Self {
        Self {
            capacities: capacities.into(),
        }
    }

    /// Capacity along a 1-based axis
    #[inline]
    pub fn capacity(&self, axis: usize) -> u64 {
        self.capacities[axis - 1]
    }

    /// All capacities, axis 1 first
    pub fn capacities(&self) -> &[u64] {
        &self.capacities
    }

    /// Number of axes
    pub fn dimension(&self) -> usize {
        self.capacities.len()
    }
}

/// A packing decision problem.
///
/// Items are addressed by their 1-based position in `items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    container: Container,
    items: Vec<Item>,
}

impl Instance {
    /// Create and validate an instance
    pub fn new(container: Container, items: Vec<Item>) -> Result<Self> {
        let instance = Self { container, items };
        instance.validate()?;
        Ok(instance)
    }

    /// Check the arity and positivity invariants.
    ///
    /// Every encoding entry point calls this before creating a variable.
    pub fn validate(&self) -> Result<()> {
        let dimension = self.container.dimension();
        if dimension == 0 {
            return Err(PackError::malformed("container has no axes"));
        }
        if let Some(axis) = self.container.capacities.iter().position(|&c| c == 0) {
            return Err(PackError::malformed(format!(
                "container capacity on axis {} must be positive",
                axis + 1
            )));
        }
        if self.items.is_empty() {
            return Err(PackError::malformed("instance has no items"));
        }

        for (index, item) in self.items.iter().enumerate() {
            if item.dimension() != dimension {
                return Err(PackError::malformed(format!(
                    "item {} has {} extents, container has {}",
                    index + 1,
                    item.dimension(),
                    dimension
                )));
            }
            if let Some(axis) = item.extents.iter().position(|&e| e == 0) {
                return Err(PackError::malformed(format!(
                    "item {} has a zero extent on axis {}",
                    index + 1,
                    axis + 1
                )));
            }
        }

        Ok(())
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Item by 1-based index
    pub fn item(&self, index: usize) -> Option<&Item> {
        index.checked_sub(1).and_then(|i| self.items.get(i))
    }

    /// Number of items (`n`)
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of axes (`d`)
    pub fn dimension(&self) -> usize {
        self.container.dimension()
    }

    /// Return a copy with two items (1-based) exchanged, `None` if either index is out of range
    pub fn with_swapped(&self, a: usize, b: usize) -> Option<Self> {
        self.item(a)?;
        self.item(b)?;
        let mut swapped = self.clone();
        swapped.items.swap(a - 1, b - 1);
        Some(swapped)
    }

    /// Parse the whitespace separated text format
    pub fn parse_text(content: &str) -> Result<Self> {
        let mut rows = Vec::new();

        for (number, line) in content.lines().enumerate() {
            let line = match line.find('#') {
                Some(pos) => &line[..pos],
                None => line,
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let values = line
                .split_whitespace()
                .map(|token| {
                    token.parse::<u64>().map_err(|_| {
                        PackError::malformed(format!(
                            "line {}: '{}' is not a non-negative integer",
                            number + 1,
                            token
                        ))
                    })
                })
                .collect::<Result<Vec<u64>>>()?;
            rows.push(values);
        }

        let mut rows = rows.into_iter();
        let container = rows
            .next()
            .map(Container::new)
            .ok_or_else(|| PackError::malformed("no container line"))?;
        let items = rows.map(Item::new).collect();

        Self::new(container, items)
    }

    /// Parse the JSON format
    pub fn parse_json(content: &str) -> Result<Self> {
        let instance: Instance = serde_json::from_str(content)?;
        instance.validate()?;
        Ok(instance)
    }

    /// Load an instance, choosing the format from the file extension
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        log::debug!("Reading instance from {}", path.display());

        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::parse_json(&content),
            _ => Self::parse_text(&content),
        }
    }

    /// Render in the text format accepted by [`Instance::parse_text`]
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Generate a random instance.
    ///
    /// Container extents are drawn from `[1, 100)` and item extents from
    /// `[1, 50)`, so most random instances are tight but not trivially
    /// infeasible.
    pub fn random<R: Rng>(rng: &mut R, items: usize, dimension: usize) -> Result<Self> {
        let container = Container::new(
            (0..dimension)
                .map(|_| rng.gen_range(1..RANDOM_CONTAINER_BOUND))
                .collect::<Vec<_>>(),
        );
        let items = (0..items)
            .map(|_| {
                Item::new(
                    (0..dimension)
                        .map(|_| rng.gen_range(1..RANDOM_ITEM_BOUND))
                        .collect::<Vec<_>>(),
                )
            })
            .collect();

        Self::new(container, items)
    }
}

impl FromStr for Instance {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_text(s)
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |values: &[u64]| {
            values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        };

        writeln!(f, "{}", join(self.container.capacities()))?;
        for item in &self.items {
            writeln!(f, "{}", join(item.extents()))?;
        }
        Ok(())
    }
}
