use super::Solution;
use crate::game::StrategyProfile;

/// Equilibria collected from several paths, without duplicates.
///
/// Two profiles are the same equilibrium when no entry differs by more than
/// the set's tolerance.
#[derive(Debug, Clone)]
pub struct EquilibriumSet {
    equilibria: Vec<StrategyProfile>,
    tolerance: f64,
}

impl Default for EquilibriumSet {
    fn default() -> Self {
        EquilibriumSet::new(1e-6)
    }
}

impl EquilibriumSet {
    pub fn new(tolerance: f64) -> Self {
        EquilibriumSet {
            equilibria: Vec::new(),
            tolerance,
        }
    }

    /// Adds `sigma` unless an equal equilibrium is already known. Returns
    /// whether it was new.
    pub fn insert(&mut self, sigma: StrategyProfile) -> bool {
        if self.contains(&sigma) {
            return false;
        }
        self.equilibria.push(sigma);
        true
    }

    pub fn contains(&self, sigma: &StrategyProfile) -> bool {
        self.equilibria
            .iter()
            .any(|known| known.abs_diff_eq(sigma, self.tolerance))
    }

    /// Adds every equilibrium of `solution` and returns how many were new.
    pub fn extend_from(&mut self, solution: &Solution) -> usize {
        solution
            .equilibria
            .iter()
            .filter(|sigma| self.insert((*sigma).clone()))
            .count()
    }

    pub fn len(&self) -> usize {
        self.equilibria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equilibria.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StrategyProfile> {
        self.equilibria.iter()
    }

    pub fn into_vec(self) -> Vec<StrategyProfile> {
        self.equilibria
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gnm::{PathStats, Termination};
    use ndarray::array;

    #[test]
    fn deduplicates() {
        let mut set = EquilibriumSet::default();
        assert!(set.insert(array![1., 0., 1., 0.]));
        assert!(!set.insert(array![1. - 1e-9, 1e-9, 1., 0.]));
        assert!(set.insert(array![0.75, 0.25, 0.25, 0.75]));

        let solution = Solution {
            equilibria: vec![array![0., 1., 0., 1.], array![0.75, 0.25, 0.25, 0.75]],
            termination: Termination::NoMoreBoundaries,
            stats: PathStats::default(),
        };
        assert_eq!(set.extend_from(&solution), 1);
        assert_eq!(set.len(), 3);
        assert!(set.contains(&array![0., 1., 0., 1.]));
    }
}
