//! Minimal infeasible item sets per axis.
//!
//! A set of items is infeasible on an axis when their extents along it sum
//! to more than the container capacity. Any packing must then make at least
//! one pair of the set overlap on that axis. Only inclusion-minimal sets are
//! needed; every infeasible set contains one.
//!
//! Candidates are visited by size, lexicographically within a size. The
//! worklist only holds feasible sets: a candidate is a feasible set extended
//! by a larger index, because an infeasible prefix would make the candidate
//! a superset of a recorded set anyway. Containment in a recorded set is
//! answered by a trie over sorted index tuples.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{PackError, Result};
use crate::instance::Item;

/// Result of enumerating one axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfeasibleSets {
    axis: usize,
    capacity: u64,
    /// Items (1-based) that alone exceed the capacity
    oversized: Vec<usize>,
    /// Minimal infeasible sets of size >= 2, sorted item indices
    minimal: Vec<Vec<usize>>,
}

impl InfeasibleSets {
    pub fn axis(&self) -> usize {
        self.axis
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn oversized(&self) -> &[usize] {
        &self.oversized
    }

    pub fn minimal(&self) -> &[Vec<usize>] {
        &self.minimal
    }

    pub fn len(&self) -> usize {
        self.minimal.len()
    }

    /// No subset restricts this axis
    pub fn is_empty(&self) -> bool {
        self.minimal.is_empty() && self.oversized.is_empty()
    }
}

/// Trie of sorted index tuples answering "is any stored set a subset of this one?".
#[derive(Debug, Default)]
struct SubsetTrie {
    nodes: Vec<TrieNode>,
}

#[derive(Debug, Default)]
struct TrieNode {
    children: BTreeMap<usize, usize>,
    terminal: bool,
}

impl SubsetTrie {
    fn new() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
        }
    }

    fn insert(&mut self, set: &[usize]) {
        let mut node = 0;
        for &index in set {
            node = match self.nodes[node].children.get(&index) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(TrieNode::default());
                    self.nodes[node].children.insert(index, child);
                    child
                }
            };
        }
        self.nodes[node].terminal = true;
    }

    /// `set` must be sorted
    fn contains_subset_of(&self, set: &[usize]) -> bool {
        self.search(0, set, 0)
    }

    fn search(&self, node: usize, set: &[usize], start: usize) -> bool {
        let node_ref = &self.nodes[node];
        if node_ref.terminal {
            return true;
        }

        for position in start..set.len() {
            if let Some(&child) = node_ref.children.get(&set[position]) {
                if self.search(child, set, position + 1) {
                    return true;
                }
            }
        }

        false
    }
}

/// Enumerate the minimal infeasible sets of one axis.
///
/// `axis` is 1-based; item indices in the result are 1-based positions in
/// `items`.
pub fn enumerate(axis: usize, items: &[Item], capacity: u64) -> Result<InfeasibleSets> {
    if items.is_empty() {
        return Err(PackError::malformed("cannot enumerate subsets of an empty item list"));
    }
    let dimension = items[0].dimension();
    if axis == 0 || axis > dimension {
        return Err(PackError::AxisOutOfRange { axis, dimension });
    }

    let extent = |index: usize| items[index - 1].extent(axis);
    let n = items.len();

    let mut trie = SubsetTrie::new();
    let mut oversized = Vec::new();
    let mut minimal = Vec::new();
    let mut frontier: Vec<(Vec<usize>, u64)> = Vec::new();

    for index in 1..=n {
        if extent(index) > capacity {
            oversized.push(index);
            trie.insert(&[index]);
        } else {
            frontier.push((vec![index], extent(index)));
        }
    }

    let mut size = 1;
    while !frontier.is_empty() {
        size += 1;
        let mut next = Vec::new();

        for (set, sum) in &frontier {
            let last = set[set.len() - 1];
            for index in last + 1..=n {
                let mut candidate = Vec::with_capacity(size);
                candidate.extend_from_slice(set);
                candidate.push(index);

                if trie.contains_subset_of(&candidate) {
                    continue;
                }

                let total = sum.saturating_add(extent(index));
                if total > capacity {
                    trie.insert(&candidate);
                    minimal.push(candidate);
                } else {
                    next.push((candidate, total));
                }
            }
        }

        log::trace!(
            "Axis {}: {} feasible sets of size {}, {} minimal infeasible so far",
            axis,
            next.len(),
            size,
            minimal.len()
        );
        frontier = next;
    }

    log::debug!(
        "Axis {}: {} minimal infeasible sets, {} oversized items",
        axis,
        minimal.len(),
        oversized.len()
    );

    Ok(InfeasibleSets {
        axis,
        capacity,
        oversized,
        minimal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(extents: &[u64]) -> Vec<Item> {
        extents.iter().map(|&e| Item::new(vec![e])).collect()
    }

    /// Reference: all subsets by size then lexicographic, minimality by scan
    fn brute_force(extents: &[u64], capacity: u64) -> Vec<Vec<usize>> {
        let n = extents.len();
        let mut found: Vec<Vec<usize>> = Vec::new();
        for size in 2..=n {
            let mut subsets: Vec<Vec<usize>> = (0u32..(1 << n))
                .filter(|mask| mask.count_ones() as usize == size)
                .map(|mask| (1..=n).filter(|i| mask & (1 << (i - 1)) != 0).collect())
                .collect();
            subsets.sort();
            for subset in subsets {
                if subset.iter().any(|&i| extents[i - 1] > capacity) {
                    continue;
                }
                if found.iter().any(|f| f.iter().all(|i| subset.contains(i))) {
                    continue;
                }
                let sum: u64 = subset.iter().map(|&i| extents[i - 1]).sum();
                if sum > capacity {
                    found.push(subset);
                }
            }
        }
        found
    }

    #[test]
    fn test_no_infeasible_sets() {
        let result = enumerate(1, &items(&[1, 1, 1]), 10).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.len(), 0);
    }

    #[test]
    fn test_pairs() {
        // Every pair overflows a capacity of 4
        let result = enumerate(1, &items(&[3, 3, 3]), 4).unwrap();
        assert_eq!(result.minimal(), &[vec![1, 2], vec![1, 3], vec![2, 3]]);
        assert!(result.oversized().is_empty());
    }

    #[test]
    fn test_minimality_pruning() {
        // {1,2} overflows; {1,3,4} overflows but {1,2,x} must not be reported
        let result = enumerate(1, &items(&[3, 2, 1, 1]), 4).unwrap();
        assert_eq!(result.minimal(), &[vec![1, 2], vec![1, 3, 4]]);
    }

    #[test]
    fn test_oversized_items_are_separate() {
        let result = enumerate(1, &items(&[5, 2, 3]), 4).unwrap();
        assert_eq!(result.oversized(), &[1]);
        assert_eq!(result.minimal(), &[vec![2, 3]]);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_second_axis() {
        let items = vec![Item::new(vec![1, 4]), Item::new(vec![1, 3])];
        let result = enumerate(2, &items, 6).unwrap();
        assert_eq!(result.axis(), 2);
        assert_eq!(result.capacity(), 6);
        assert_eq!(result.minimal(), &[vec![1, 2]]);

        let result = enumerate(1, &items, 6).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_matches_brute_force() {
        let cases: &[(&[u64], u64)] = &[
            (&[3, 1, 4, 1, 5, 2, 6], 8),
            (&[2, 2, 2, 2, 2, 2], 7),
            (&[9, 1, 1, 1, 1, 8, 2], 10),
            (&[5, 4, 3, 2, 1], 6),
        ];
        for &(extents, capacity) in cases {
            let result = enumerate(1, &items(extents), capacity).unwrap();
            assert_eq!(result.minimal(), brute_force(extents, capacity).as_slice());
        }
    }

    #[test]
    fn test_deterministic() {
        let list = items(&[4, 7, 2, 9, 3, 3, 5]);
        let first = enumerate(1, &list, 11).unwrap();
        let second = enumerate(1, &list, 11).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_input_validation() {
        assert!(matches!(
            enumerate(1, &[], 4),
            Err(PackError::MalformedInstance { .. })
        ));
        assert!(matches!(
            enumerate(2, &items(&[1]), 4),
            Err(PackError::AxisOutOfRange { axis: 2, dimension: 1 })
        ));
        assert!(matches!(
            enumerate(0, &items(&[1]), 4),
            Err(PackError::AxisOutOfRange { .. })
        ));
    }

    #[test]
    fn test_trie_subset_queries() {
        let mut trie = SubsetTrie::new();
        trie.insert(&[2, 5]);
        trie.insert(&[1, 3, 4]);

        assert!(trie.contains_subset_of(&[1, 2, 5]));
        assert!(trie.contains_subset_of(&[1, 2, 3, 4]));
        assert!(!trie.contains_subset_of(&[1, 2, 3]));
        assert!(!trie.contains_subset_of(&[5]));
    }
}
