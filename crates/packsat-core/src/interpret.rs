//! Turning a satisfying model back into box coordinates.
//!
//! On every axis each item occupies one contiguous run of slots. Items
//! whose runs are disjoint do not overlap along that axis, so an item is
//! placed right after the furthest-reaching item whose run ends before its
//! own run starts.

use std::fmt;

use serde::Serialize;

use crate::encoding::variable::{Namespace, VariableKey};
use crate::error::{PackError, Result};
use crate::instance::Instance;
use crate::solver::Model;

/// Inclusive range of 1-based slots occupied by one item on one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotRun {
    pub first: usize,
    pub last: usize,
}

impl SlotRun {
    pub fn intersects(&self, other: &SlotRun) -> bool {
        self.first <= other.last && other.first <= self.last
    }

    /// Whether this run ends before `other` starts
    pub fn precedes(&self, other: &SlotRun) -> bool {
        self.last < other.first
    }
}

impl fmt::Display for SlotRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first == self.last {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{}..{}", self.first, self.last)
        }
    }
}

/// Where one item ends up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    /// 1-based item index
    pub item: usize,
    /// Lower corner, 0-based coordinates, axis 1 first
    pub position: Vec<u64>,
    pub extents: Vec<u64>,
    /// Slot run per axis
    pub runs: Vec<SlotRun>,
}

impl Placement {
    /// Whether the two boxes share interior volume
    pub fn overlaps(&self, other: &Placement) -> bool {
        (0..self.position.len()).all(|axis| {
            self.position[axis] < other.position[axis] + other.extents[axis]
                && other.position[axis] < self.position[axis] + self.extents[axis]
        })
    }
}

/// Coordinates for every item of an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Packing {
    container: Vec<u64>,
    placements: Vec<Placement>,
}

impl Packing {
    pub fn container(&self) -> &[u64] {
        &self.container
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Placement of a 1-based item
    pub fn placement(&self, item: usize) -> Option<&Placement> {
        item.checked_sub(1).and_then(|i| self.placements.get(i))
    }

    /// Check that every box is inside the container and no two boxes overlap
    pub fn validate(&self) -> Result<()> {
        for placement in &self.placements {
            for (axis, &capacity) in self.container.iter().enumerate() {
                let end = placement.position[axis] + placement.extents[axis];
                if end > capacity {
                    return Err(PackError::InvalidPacking {
                        reason: format!(
                            "item {} reaches {} on axis {}, capacity is {}",
                            placement.item,
                            end,
                            axis + 1,
                            capacity
                        ),
                    });
                }
            }
        }

        for (i, a) in self.placements.iter().enumerate() {
            for b in &self.placements[i + 1..] {
                if a.overlaps(b) {
                    return Err(PackError::InvalidPacking {
                        reason: format!("items {} and {} overlap", a.item, b.item),
                    });
                }
            }
        }

        Ok(())
    }
}

fn value_of(namespace: &Namespace, model: &Model, key: VariableKey) -> Result<bool> {
    namespace
        .lookup(&key)
        .map(|id| model.value(id))
        .ok_or_else(|| PackError::inconsistent(format!("variable {} is not in the namespace", key)))
}

/// Decode the slot runs of every item on one axis, item 1 first
fn decode_runs(namespace: &Namespace, model: &Model, axis: usize) -> Result<Vec<SlotRun>> {
    let n = namespace.items();
    (1..=n)
        .map(|item| {
            let mut occupied = Vec::new();
            for slot in 1..=n {
                if value_of(namespace, model, VariableKey::clique(axis, item, slot))? {
                    occupied.push(slot);
                }
            }

            let (Some(&first), Some(&last)) = (occupied.first(), occupied.last()) else {
                return Err(PackError::inconsistent(format!(
                    "item {} occupies no slot on axis {}",
                    item, axis
                )));
            };
            if last - first + 1 != occupied.len() {
                return Err(PackError::inconsistent(format!(
                    "slots of item {} on axis {} are not contiguous: {:?}",
                    item, axis, occupied
                )));
            }
            Ok(SlotRun { first, last })
        })
        .collect()
}

/// Longest weighted path through the "ends before" order of runs
fn positions(runs: &[SlotRun], extents: &[u64]) -> Vec<u64> {
    let mut order: Vec<usize> = (0..runs.len()).collect();
    order.sort_by_key(|&i| (runs[i].first, i));

    let mut position = vec![0u64; runs.len()];
    for (k, &y) in order.iter().enumerate() {
        position[y] = order[..k]
            .iter()
            .filter(|&&x| runs[x].precedes(&runs[y]))
            .map(|&x| position[x] + extents[x])
            .max()
            .unwrap_or(0);
    }
    position
}

/// Interpret a model of the encoding of `instance`.
///
/// Fails with `InconsistentModel` when a run is empty or broken, or when an
/// edge variable disagrees with the runs it describes.
pub fn interpret(instance: &Instance, namespace: &Namespace, model: &Model) -> Result<Packing> {
    let (d, n) = (instance.dimension(), instance.len());
    if namespace.dimension() != d || namespace.items() != n {
        return Err(PackError::inconsistent(format!(
            "namespace covers {} items in {} dimensions, instance has {} items in {}",
            namespace.items(),
            namespace.dimension(),
            n,
            d
        )));
    }

    let mut runs_per_axis = Vec::with_capacity(d);
    let mut positions_per_axis = Vec::with_capacity(d);

    for axis in 1..=d {
        let runs = decode_runs(namespace, model, axis)?;

        for x in 1..=n {
            for y in x + 1..=n {
                let edge = value_of(namespace, model, VariableKey::edge(axis, x, y))?;
                let intersect = runs[x - 1].intersects(&runs[y - 1]);
                if edge != intersect {
                    return Err(PackError::inconsistent(format!(
                        "e_{}_{}_{} is {} but runs {} and {} {}",
                        axis,
                        x,
                        y,
                        edge,
                        runs[x - 1],
                        runs[y - 1],
                        if intersect { "intersect" } else { "are disjoint" }
                    )));
                }
            }
        }

        let extents: Vec<u64> = instance.items().iter().map(|item| item.extent(axis)).collect();
        positions_per_axis.push(positions(&runs, &extents));
        runs_per_axis.push(runs);
    }

    let placements = instance
        .items()
        .iter()
        .enumerate()
        .map(|(i, item)| Placement {
            item: i + 1,
            position: positions_per_axis.iter().map(|p| p[i]).collect(),
            extents: item.extents().to_vec(),
            runs: runs_per_axis.iter().map(|r| r[i]).collect(),
        })
        .collect();

    let packing = Packing {
        container: instance.container().capacities().to_vec(),
        placements,
    };
    log::debug!("Interpreted model into {} placements", n);
    Ok(packing)
}
