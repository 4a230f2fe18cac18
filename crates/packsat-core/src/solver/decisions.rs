use crate::cnf::Literal;

/// Tracks the partial assignment built during search.
///
/// Each decision records:
/// - Whether a variable is true (+) or false (-)
/// - At what decision level it was decided
/// - Which clause forced it, if any
///
/// The decision_map stores: 0 = undecided, >0 = true at level N-1, <0 = false at level N-1
#[derive(Debug)]
pub struct Decisions {
    /// Index is the variable number, value encodes both polarity and level
    decision_map: Vec<i32>,

    /// Assignments in the order they were made [(literal, clause_id)]
    decision_queue: Vec<(Literal, Option<u32>)>,

    /// Current decision level
    level: u32,
}

impl Decisions {
    /// Create a new empty decisions tracker
    pub fn new() -> Self {
        Self {
            decision_map: Vec::new(),
            decision_queue: Vec::new(),
            level: 0,
        }
    }

    /// Create a tracker for variables `1..=num_vars`
    pub fn with_capacity(num_vars: usize) -> Self {
        Self {
            decision_map: vec![0; num_vars + 1],
            decision_queue: Vec::with_capacity(num_vars),
            level: 0,
        }
    }

    #[inline]
    fn ensure_capacity(&mut self, var: usize) {
        if var >= self.decision_map.len() {
            self.decision_map.resize(var + 1, 0);
        }
    }

    #[inline]
    fn entry(&self, literal: Literal) -> i32 {
        self.decision_map
            .get(literal.unsigned_abs() as usize)
            .copied()
            .unwrap_or(0)
    }

    /// Get the current decision level
    #[inline]
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Increment the decision level
    #[inline]
    pub fn increment_level(&mut self) {
        self.level += 1;
    }

    /// Assign a literal at the current level
    ///
    /// Returns false if this conflicts with an existing decision
    pub fn decide(&mut self, literal: Literal, clause_id: Option<u32>) -> bool {
        let var = literal.unsigned_abs() as usize;
        self.ensure_capacity(var);

        let existing = self.decision_map[var];
        if existing != 0 {
            return (existing > 0) == (literal > 0);
        }

        // Store level+1 so that level 0 doesn't become 0 (which means undecided)
        let level_value = (self.level + 1) as i32;
        self.decision_map[var] = if literal > 0 { level_value } else { -level_value };
        self.decision_queue.push((literal, clause_id));

        true
    }

    /// Value of a literal: `None` while undecided
    #[inline]
    pub fn value(&self, literal: Literal) -> Option<bool> {
        match self.entry(literal) {
            0 => None,
            decision => Some((decision > 0) == (literal > 0)),
        }
    }

    /// Check if a literal is satisfied by current decisions
    #[inline]
    pub fn satisfied(&self, literal: Literal) -> bool {
        self.value(literal) == Some(true)
    }

    /// Check if a literal conflicts with current decisions
    #[inline]
    pub fn conflict(&self, literal: Literal) -> bool {
        self.value(literal) == Some(false)
    }

    /// Check if a variable has been decided (either way)
    #[inline]
    pub fn decided(&self, var: u32) -> bool {
        self.entry(var as Literal) != 0
    }

    #[inline]
    pub fn undecided(&self, var: u32) -> bool {
        !self.decided(var)
    }

    /// Get the decision level for a literal's variable
    #[inline]
    pub fn decision_level(&self, literal: Literal) -> Option<u32> {
        match self.entry(literal) {
            0 => None,
            decision => Some(decision.unsigned_abs() - 1),
        }
    }

    /// Revert all decisions at levels > target_level
    pub fn revert_to_level(&mut self, target_level: u32) {
        // Levels only grow along the queue, so the tail holds everything above target
        while let Some(&(literal, _)) = self.decision_queue.last() {
            if self.decision_level(literal).is_some_and(|l| l <= target_level) {
                break;
            }
            self.decision_map[literal.unsigned_abs() as usize] = 0;
            self.decision_queue.pop();
        }

        self.level = target_level;
    }

    /// Get the decision queue
    pub fn queue(&self) -> &[(Literal, Option<u32>)] {
        &self.decision_queue
    }

    /// Get the number of decisions
    pub fn len(&self) -> usize {
        self.decision_queue.len()
    }

    /// Check if no decisions have been made
    pub fn is_empty(&self) -> bool {
        self.decision_queue.is_empty()
    }

    /// Values of variables `1..=num_vars`, undecided ones read as false
    pub fn values(&self, num_vars: usize) -> Vec<bool> {
        (1..=num_vars)
            .map(|var| self.decision_map.get(var).is_some_and(|&d| d > 0))
            .collect()
    }
}

impl Default for Decisions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decisions_new() {
        let decisions = Decisions::new();
        assert_eq!(decisions.level(), 0);
        assert!(decisions.is_empty());
    }

    #[test]
    fn test_decisions_decide() {
        let mut decisions = Decisions::new();

        assert!(decisions.decide(1, Some(0)));
        assert!(decisions.satisfied(1));
        assert!(!decisions.satisfied(-1));
        assert_eq!(decisions.value(1), Some(true));

        assert!(decisions.decide(-2, Some(1)));
        assert!(decisions.satisfied(-2));
        assert!(!decisions.satisfied(2));
        assert_eq!(decisions.value(2), Some(false));
        assert_eq!(decisions.value(3), None);
    }

    #[test]
    fn test_decisions_conflict() {
        let mut decisions = Decisions::new();

        decisions.decide(1, None);

        // Trying to decide opposite should fail
        assert!(!decisions.decide(-1, None));
        // Same polarity again is fine and not queued twice
        assert!(decisions.decide(1, None));
        assert_eq!(decisions.len(), 1);

        assert!(decisions.conflict(-1));
        assert!(!decisions.conflict(1));
    }

    #[test]
    fn test_decisions_levels() {
        let mut decisions = Decisions::new();
        decisions.decide(4, None);
        assert_eq!(decisions.decision_level(4), Some(0));

        decisions.increment_level();
        decisions.decide(1, None);
        assert_eq!(decisions.decision_level(-1), Some(1));

        decisions.increment_level();
        decisions.decide(-2, None);
        assert_eq!(decisions.decision_level(2), Some(2));
    }

    #[test]
    fn test_decisions_revert() {
        let mut decisions = Decisions::with_capacity(4);
        decisions.decide(4, None);

        decisions.increment_level();
        decisions.decide(1, None);

        decisions.increment_level();
        decisions.decide(2, None);
        decisions.decide(-3, Some(7));

        decisions.revert_to_level(1);

        assert!(decisions.decided(4));
        assert!(decisions.decided(1));
        assert!(decisions.undecided(2));
        assert!(decisions.undecided(3));
        assert_eq!(decisions.level(), 1);
        assert_eq!(decisions.queue(), &[(4, None), (1, None)]);

        decisions.revert_to_level(0);
        assert_eq!(decisions.len(), 1);
    }

    #[test]
    fn test_decisions_values() {
        let mut decisions = Decisions::new();
        decisions.decide(1, None);
        decisions.decide(-3, None);
        assert_eq!(decisions.values(4), vec![true, false, false, false]);
    }
}
