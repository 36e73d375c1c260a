use std::ops::Range;

use ndarray::prelude::*;

use super::{GameError, retraction};
use crate::linalg::{Matrix, Vector};

/// Mixed strategy profile: one probability block per player, laid out over the
/// flattened action space `[0, M)`.
pub type StrategyProfile = Vector;

/// A finite game in strategic form.
///
/// Every pure action of every player is flattened into one index space
/// `[0, num_actions())`, and player `n` owns the contiguous range
/// `first_action(n)..last_action(n)`. Implementors provide the layout and the
/// payoffs; retraction, regret and the deviation payoffs come for free.
///
/// Several solves may query the same game from different threads, so
/// implementors must be `Sync`.
pub trait Game: Sync {
    fn num_players(&self) -> usize;

    fn num_actions(&self) -> usize;

    fn first_action(&self, player: usize) -> usize;

    /// One past the last action of `player`.
    fn last_action(&self, player: usize) -> usize;

    /// Expected payoff of `player` under the profile `sigma`.
    fn mixed_payoff(&self, player: usize, sigma: &StrategyProfile) -> f64;

    /// Writes the payoff Jacobian at `sigma` into `dest`.
    ///
    /// For actions `i` and `j` owned by different players, `dest[[i, j]]` is the
    /// payoff to the owner of `i` when they play `i`, the owner of `j` plays `j`
    /// and everybody else follows `sigma`. Inside each player's own block only
    /// the diagonal is filled, with `fuzz, 2·fuzz, …` to break ties.
    fn payoff_matrix(&self, sigma: &StrategyProfile, fuzz: f64, dest: &mut Matrix);

    fn num_player_actions(&self, player: usize) -> usize {
        self.last_action(player) - self.first_action(player)
    }

    fn player_actions(&self, player: usize) -> Range<usize> {
        self.first_action(player)..self.last_action(player)
    }

    /// Player owning `action`.
    fn owner(&self, action: usize) -> usize {
        (0..self.num_players())
            .find(|&player| action < self.last_action(player))
            .unwrap_or(self.num_players())
    }

    fn retract(&self, z: &Vector) -> StrategyProfile {
        let mut sigma = StrategyProfile::zeros(self.num_actions());
        self.retract_into(z, &mut sigma);
        sigma
    }

    fn retract_into(&self, z: &Vector, dest: &mut StrategyProfile) {
        retraction::retract(self, z, dest);
    }

    fn retract_jacobian(&self, support: &[bool], dest: &mut Matrix) {
        retraction::retract_jacobian(self, support, dest);
    }

    /// Rescales each player's block to sum to one.
    fn normalize_strategy(&self, sigma: &mut StrategyProfile) {
        for player in 0..self.num_players() {
            let mut block = sigma.slice_mut(s![self.player_actions(player)]);
            let total = block.sum();
            if total > 0. {
                block /= total;
            }
        }
    }

    /// Payoff of every pure action against the others' part of `sigma`,
    /// read off the payoff Jacobian `dg` taken at `sigma`.
    ///
    /// Own-player blocks are skipped, so the tie-breaking fuzz never enters.
    fn deviation_payoffs(&self, dg: &Matrix, sigma: &StrategyProfile, dest: &mut Vector) {
        let others = (self.num_players() - 1) as f64;
        for player in 0..self.num_players() {
            let own = self.player_actions(player);
            for i in own.clone() {
                let row = dg.row(i);
                let total = row.dot(sigma);
                let mine = row.slice(s![own.clone()]).dot(&sigma.slice(s![own.clone()]));
                dest[i] = (total - mine) / others;
            }
        }
    }

    /// Payoff to the owner of `action` for switching to it while the others keep
    /// playing `sigma`.
    fn pure_deviation_payoff(&self, action: usize, sigma: &StrategyProfile) -> f64 {
        let player = self.owner(action);
        let mut deviation = sigma.clone();
        deviation.slice_mut(s![self.player_actions(player)]).fill(0.);
        deviation[action] = 1.;
        self.mixed_payoff(player, &deviation)
    }

    /// Largest gain any player gets from a unilateral pure deviation.
    fn max_regret(&self, sigma: &StrategyProfile) -> f64 {
        (0..self.num_players())
            .map(|player| {
                let current = self.mixed_payoff(player, sigma);
                self.player_actions(player)
                    .map(|action| self.pure_deviation_payoff(action, sigma) - current)
                    .fold(0., f64::max)
            })
            .fold(0., f64::max)
    }

    fn is_equilibrium(&self, sigma: &StrategyProfile, tolerance: f64) -> bool {
        self.max_regret(sigma) <= tolerance
    }

    /// Checks that the action ranges are nonempty and partition `[0, M)`.
    fn check_layout(&self) -> Result<(), GameError> {
        if self.num_players() == 0 {
            return Err(GameError::NoPlayers);
        }
        let mut next = 0;
        for player in 0..self.num_players() {
            if self.first_action(player) != next {
                return Err(GameError::InvalidLayout(format!(
                    "player {player} starts at {}, expected {next}",
                    self.first_action(player)
                )));
            }
            if self.last_action(player) <= self.first_action(player) {
                return Err(GameError::NoActions(player));
            }
            next = self.last_action(player);
        }
        if next != self.num_actions() {
            return Err(GameError::InvalidLayout(format!(
                "ranges cover {next} actions, the game has {}",
                self.num_actions()
            )));
        }
        Ok(())
    }
}

/// Writes the tie-breaking sequence `fuzz, 2·fuzz, …` on the diagonal of every
/// own-player block.
pub(crate) fn fill_fuzz<G>(game: &G, fuzz: f64, dest: &mut Matrix)
where
    G: Game + ?Sized,
{
    for player in 0..game.num_players() {
        for (k, i) in game.player_actions(player).enumerate() {
            dest[[i, i]] = fuzz * (k + 1) as f64;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::NormalFormGame;
    use approx::assert_abs_diff_eq;

    fn three_player() -> NormalFormGame {
        NormalFormGame::from_fn(&[2, 2, 2], |a| {
            vec![
                (if a[0] == a[1] { 1. } else { 0. }) + 0.5 * a[0] as f64,
                (if a[1] != a[2] { 1. } else { 0. }) + 0.3 * a[1] as f64,
                (if a[2] == a[0] { 2. } else { 0. }) - 0.4 * a[2] as f64,
            ]
        })
        .unwrap()
    }

    #[test]
    fn owner() {
        let game = three_player();
        assert_eq!(game.owner(0), 0);
        assert_eq!(game.owner(3), 1);
        assert_eq!(game.owner(5), 2);
        assert_eq!(game.player_actions(1), 2..4);
        assert!(game.check_layout().is_ok());
    }

    #[test]
    fn deviation_payoffs() {
        let game = three_player();
        let sigma = array![0.3, 0.7, 0.6, 0.4, 0.1, 0.9];
        let mut dg = Matrix::zeros((6, 6));
        game.payoff_matrix(&sigma, 1e-3, &mut dg);

        let mut v = Vector::zeros(6);
        game.deviation_payoffs(&dg, &sigma, &mut v);
        for i in 0..6 {
            assert_abs_diff_eq!(v[i], game.pure_deviation_payoff(i, &sigma), epsilon = 1e-12);
        }
        assert_abs_diff_eq!(dg[[0, 0]], 1e-3);
        assert_abs_diff_eq!(dg[[1, 1]], 2e-3);
        assert_abs_diff_eq!(dg[[0, 1]], 0.);
    }

    #[test]
    fn regret() {
        let game = three_player();
        let sigma = array![0.4, 0.6, 0.75, 0.25, 0.35, 0.65];
        assert!(game.max_regret(&sigma) < 1e-12);
        assert!(game.is_equilibrium(&sigma, 1e-9));

        let pure = array![1., 0., 1., 0., 1., 0.];
        // Player 1 gains 1.3 by breaking the match with player 2.
        assert_abs_diff_eq!(game.max_regret(&pure), 1.3, epsilon = 1e-12);
    }

    #[test]
    fn normalize() {
        let game = three_player();
        let mut sigma = array![2., 2., 0.5, 0., 1., 3.];
        game.normalize_strategy(&mut sigma);
        assert_abs_diff_eq!(sigma, array![0.5, 0.5, 1., 0., 0.25, 0.75], epsilon = 1e-15);
    }
}
