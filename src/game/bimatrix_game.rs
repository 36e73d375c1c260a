use ndarray::prelude::*;

use super::{Game, GameError, StrategyProfile, strategic_game::fill_fuzz};
use crate::linalg::Matrix;

/// Two-player game given by the payoff tables of the row and column players.
#[derive(Debug, Clone)]
pub struct BimatrixGame {
    payoff: (Array2<f64>, Array2<f64>),
}

#[derive(Debug)]
pub struct Strategy(pub Array1<f64>, pub Array1<f64>);

impl PartialEq for Strategy {
    fn eq(&self, other: &Strategy) -> bool {
        self.0.abs_diff_eq(&other.0, 1e-9) && self.1.abs_diff_eq(&other.1, 1e-9)
    }
}

impl Strategy {
    /// Splits a flattened profile into the row and column strategies.
    pub fn from_profile(sigma: &StrategyProfile, rows: usize) -> Self {
        Strategy(
            sigma.slice(s![..rows]).to_owned(),
            sigma.slice(s![rows..]).to_owned(),
        )
    }

    pub fn to_profile(&self) -> StrategyProfile {
        let mut sigma = StrategyProfile::zeros(self.0.len() + self.1.len());
        sigma.slice_mut(s![..self.0.len()]).assign(&self.0);
        sigma.slice_mut(s![self.0.len()..]).assign(&self.1);
        sigma
    }
}

impl BimatrixGame {
    pub fn new(p1: Array2<f64>, p2: Array2<f64>) -> Result<Self, GameError> {
        if p1.shape() != p2.shape() {
            return Err(GameError::ShapeMismatch(format!(
                "{:?} and {:?}",
                p1.shape(),
                p2.shape()
            )));
        }
        if p1.nrows() == 0 {
            return Err(GameError::NoActions(0));
        }
        if p1.ncols() == 0 {
            return Err(GameError::NoActions(1));
        }
        if p1.iter().chain(p2.iter()).any(|u| !u.is_finite()) {
            return Err(GameError::InvalidPayoff("non-finite entry".to_string()));
        }
        Ok(BimatrixGame { payoff: (p1, p2) })
    }

    pub fn num_strategies(&self) -> (usize, usize) {
        self.payoff.0.dim()
    }

    pub fn num_strategies_player(&self, player: usize) -> usize {
        self.payoff.0.shape()[player]
    }

    pub fn total_strategies(&self) -> usize {
        self.payoff.0.nrows() + self.payoff.0.ncols()
    }

    pub fn strategy_payoff(&self, strategy: &Strategy) -> (f64, f64) {
        let payoff0 = self.payoff.0.dot(&strategy.1).dot(&strategy.0);
        let payoff1 = self.payoff.1.dot(&strategy.1).dot(&strategy.0);

        (payoff0, payoff1)
    }

    pub fn payoff_table(&self, player: usize) -> &Array2<f64> {
        if player == 0 {
            &self.payoff.0
        } else {
            &self.payoff.1
        }
    }

    pub fn regret(&self, strategy: &Strategy) -> (f64, f64) {
        let strategy_payoff = self.strategy_payoff(strategy);
        let payoff0 = self.payoff.0.dot(&strategy.1);
        let payoff1 = strategy.0.dot(&self.payoff.1);

        let max_payoff0 = payoff0.fold(f64::NEG_INFINITY, |m, &u| m.max(u));
        let max_payoff1 = payoff1.fold(f64::NEG_INFINITY, |m, &u| m.max(u));
        (
            max_payoff0 - strategy_payoff.0,
            max_payoff1 - strategy_payoff.1,
        )
    }

    pub fn is_ne(&self, strategy: &Strategy) -> bool {
        let r = self.regret(strategy);

        r.0 < 1e-9 && r.1 < 1e-9
    }
}

impl Game for BimatrixGame {
    fn num_players(&self) -> usize {
        2
    }

    fn num_actions(&self) -> usize {
        self.total_strategies()
    }

    fn first_action(&self, player: usize) -> usize {
        if player == 0 { 0 } else { self.payoff.0.nrows() }
    }

    fn last_action(&self, player: usize) -> usize {
        if player == 0 {
            self.payoff.0.nrows()
        } else {
            self.total_strategies()
        }
    }

    fn mixed_payoff(&self, player: usize, sigma: &StrategyProfile) -> f64 {
        let rows = self.payoff.0.nrows();
        let row = sigma.slice(s![..rows]);
        let col = sigma.slice(s![rows..]);
        row.dot(&self.payoff_table(player).dot(&col))
    }

    fn payoff_matrix(&self, _sigma: &StrategyProfile, fuzz: f64, dest: &mut Matrix) {
        let rows = self.payoff.0.nrows();
        dest.fill(0.);
        dest.slice_mut(s![..rows, rows..]).assign(&self.payoff.0);
        dest.slice_mut(s![rows.., ..rows]).assign(&self.payoff.1.t());
        fill_fuzz(self, fuzz, dest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn bimatrixgame_new() {
        let a = array![[2., 1.], [1., 2.]];
        let b = array![[2., 1.], [1., 2.], [3., 4.]];

        assert!(matches!(
            BimatrixGame::new(a, b),
            Err(GameError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn regret() {
        let a = array![[1. / 3., 0.], [1., 1.]];
        let b = array![[1. / 3., 1.], [0., 1.]];
        let game = BimatrixGame::new(a, b).unwrap();

        let s = Strategy(array![0., 1.], array![0., 1.]);

        assert!(game.is_ne(&s));
        assert!(game.is_equilibrium(&s.to_profile(), 1e-9));

        let r = Strategy(array![0., 1.], array![0.5, 0.5]);
        assert_eq!(game.regret(&r), (0., 0.5));
        assert_abs_diff_eq!(game.max_regret(&r.to_profile()), 0.5);
    }

    #[test]
    fn payoff_matrix() {
        let a = array![[1., 2., 3.], [4., 5., 6.]];
        let b = array![[7., 8., 9.], [10., 11., 12.]];
        let game = BimatrixGame::new(a, b).unwrap();
        let mut dg = Matrix::zeros((5, 5));
        game.payoff_matrix(&Array1::zeros(5), 0.5, &mut dg);

        assert_eq!(game.player_actions(1), 2..5);
        assert_eq!(dg[[1, 3]], 5.);
        assert_eq!(dg[[3, 1]], 11.);
        assert_eq!(dg[[4, 0]], 9.);
        assert_eq!(dg[[1, 1]], 1.);
        assert_eq!(dg[[4, 4]], 1.5);
        assert_eq!(dg[[0, 1]], 0.);
    }

    #[test]
    fn profile_round_trip() {
        let sigma = array![0.2, 0.8, 0.1, 0.6, 0.3];
        let s = Strategy::from_profile(&sigma, 2);

        assert_eq!(s, Strategy(array![0.2, 0.8], array![0.1, 0.6, 0.3]));
        assert_eq!(s.to_profile(), sigma);
    }
}
