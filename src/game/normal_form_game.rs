use itertools::Itertools;
use ndarray::{IxDyn, prelude::*};
use ndarray_rand::RandomExt;
use ndarray_rand::rand::Rng;
use ndarray_rand::rand_distr::Uniform;

use super::{Game, GameError, StrategyProfile, strategic_game::fill_fuzz};
use crate::linalg::Matrix;

/// N-player game given by one payoff table per player.
///
/// Each table is indexed by the pure profile `[a_0, …, a_{N-1}]`, where `a_n`
/// counts from zero within player `n`'s own actions.
#[derive(Debug, Clone)]
pub struct NormalFormGame {
    payoffs: Vec<ArrayD<f64>>,
    offsets: Vec<usize>,
}

impl NormalFormGame {
    pub fn new(payoffs: Vec<ArrayD<f64>>) -> Result<Self, GameError> {
        let Some(first) = payoffs.first() else {
            return Err(GameError::NoPlayers);
        };
        let shape = first.shape().to_vec();
        if shape.len() != payoffs.len() {
            return Err(GameError::PlayerCountMismatch {
                expected: shape.len(),
                found: payoffs.len(),
            });
        }
        if let Some(player) = shape.iter().position(|&n| n == 0) {
            return Err(GameError::NoActions(player));
        }
        for (player, table) in payoffs.iter().enumerate() {
            if table.shape() != shape.as_slice() {
                return Err(GameError::ShapeMismatch(format!(
                    "table of player {player} has shape {:?}, expected {:?}",
                    table.shape(),
                    shape
                )));
            }
            if let Some((profile, u)) = table.indexed_iter().find(|(_, u)| !u.is_finite()) {
                return Err(GameError::InvalidPayoff(format!(
                    "player {player} gets {u} at {:?}",
                    profile.slice()
                )));
            }
        }

        let offsets = std::iter::once(0)
            .chain(shape.iter().scan(0, |acc, &n| {
                *acc += n;
                Some(*acc)
            }))
            .collect();
        Ok(NormalFormGame { payoffs, offsets })
    }

    /// Builds a game from a function returning the payoff vector of every pure
    /// profile.
    pub fn from_fn<F>(shape: &[usize], payoff: F) -> Result<Self, GameError>
    where
        F: Fn(&[usize]) -> Vec<f64>,
    {
        if shape.is_empty() {
            return Err(GameError::NoPlayers);
        }
        let mut payoffs = vec![ArrayD::zeros(IxDyn(shape)); shape.len()];
        for profile in shape.iter().map(|&n| 0..n).multi_cartesian_product() {
            let u = payoff(&profile);
            if u.len() != shape.len() {
                return Err(GameError::PlayerCountMismatch {
                    expected: shape.len(),
                    found: u.len(),
                });
            }
            for (table, value) in payoffs.iter_mut().zip(u) {
                table[IxDyn(&profile)] = value;
            }
        }
        NormalFormGame::new(payoffs)
    }

    /// Game with payoffs drawn uniformly from `[0, 10)`.
    pub fn random<R>(shape: &[usize], rng: &mut R) -> Result<Self, GameError>
    where
        R: Rng + ?Sized,
    {
        let payoffs = (0..shape.len())
            .map(|_| ArrayD::random_using(IxDyn(shape), Uniform::new(0., 10.), rng))
            .collect();
        NormalFormGame::new(payoffs)
    }

    pub fn shape(&self) -> &[usize] {
        self.payoffs[0].shape()
    }

    pub fn payoff(&self, player: usize, profile: &[usize]) -> f64 {
        self.payoffs[player][IxDyn(profile)]
    }

    pub fn payoff_table(&self, player: usize) -> &ArrayD<f64> {
        &self.payoffs[player]
    }

    fn probability(&self, sigma: &StrategyProfile, profile: &[usize], skip: &[usize]) -> f64 {
        profile
            .iter()
            .enumerate()
            .filter(|(player, _)| !skip.contains(player))
            .map(|(player, &a)| sigma[self.offsets[player] + a])
            .product()
    }
}

impl Game for NormalFormGame {
    fn num_players(&self) -> usize {
        self.payoffs.len()
    }

    fn num_actions(&self) -> usize {
        self.offsets[self.payoffs.len()]
    }

    fn first_action(&self, player: usize) -> usize {
        self.offsets[player]
    }

    fn last_action(&self, player: usize) -> usize {
        self.offsets[player + 1]
    }

    fn mixed_payoff(&self, player: usize, sigma: &StrategyProfile) -> f64 {
        self.payoffs[player]
            .indexed_iter()
            .map(|(profile, u)| u * self.probability(sigma, profile.slice(), &[]))
            .sum()
    }

    fn payoff_matrix(&self, sigma: &StrategyProfile, fuzz: f64, dest: &mut Matrix) {
        dest.fill(0.);
        let n = self.num_players();
        for player in 0..n {
            for (profile, u) in self.payoffs[player].indexed_iter() {
                let profile = profile.slice();
                let row = self.offsets[player] + profile[player];
                for other in (0..n).filter(|&other| other != player) {
                    let col = self.offsets[other] + profile[other];
                    dest[[row, col]] += u * self.probability(sigma, profile, &[player, other]);
                }
            }
        }
        fill_fuzz(self, fuzz, dest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray_rand::rand::SeedableRng;
    use ndarray_rand::rand::rngs::StdRng;

    #[test]
    fn from_fn() {
        let game = NormalFormGame::from_fn(&[2, 3], |a| vec![a[0] as f64, a[1] as f64]).unwrap();

        assert_eq!(game.num_players(), 2);
        assert_eq!(game.num_actions(), 5);
        assert_eq!(game.shape(), &[2, 3]);
        assert_eq!(game.player_actions(1), 2..5);
        assert_eq!(game.payoff(1, &[1, 2]), 2.);
        assert_eq!(game.payoff_table(0)[IxDyn(&[1, 0])], 1.);
    }

    #[test]
    fn invalid_games() {
        assert_eq!(NormalFormGame::new(vec![]).unwrap_err(), GameError::NoPlayers);
        assert!(matches!(
            NormalFormGame::from_fn(&[2, 2], |_| vec![0.]),
            Err(GameError::PlayerCountMismatch {
                expected: 2,
                found: 1
            })
        ));
        assert!(matches!(
            NormalFormGame::from_fn(&[2, 2], |_| vec![0., f64::NAN]),
            Err(GameError::InvalidPayoff(_))
        ));
        assert_eq!(
            NormalFormGame::from_fn(&[2, 0], |_| vec![0., 0.]).unwrap_err(),
            GameError::NoActions(1)
        );
        let a = ArrayD::zeros(IxDyn(&[2, 2]));
        let b = ArrayD::zeros(IxDyn(&[2, 3]));
        assert!(matches!(
            NormalFormGame::new(vec![a, b]),
            Err(GameError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn mixed_payoff() {
        let game = NormalFormGame::from_fn(&[2, 2], |a| {
            let u = if a[0] == a[1] { 1. } else { -1. };
            vec![u, -u]
        })
        .unwrap();
        let sigma = array![0.25, 0.75, 0.5, 0.5];

        assert_abs_diff_eq!(game.mixed_payoff(0, &sigma), 0.);
        let sigma = array![1., 0., 0.8, 0.2];
        assert_abs_diff_eq!(game.mixed_payoff(0, &sigma), 0.6, epsilon = 1e-15);
        assert_abs_diff_eq!(game.mixed_payoff(1, &sigma), -0.6, epsilon = 1e-15);
    }

    #[test]
    fn payoff_matrix_two_players() {
        let game = NormalFormGame::from_fn(&[2, 3], |a| {
            vec![(a[0] * 3 + a[1]) as f64, (10 + a[0] * 3 + a[1]) as f64]
        })
        .unwrap();
        let sigma = array![0.5, 0.5, 0.2, 0.3, 0.5];
        let mut dg = Matrix::zeros((5, 5));
        game.payoff_matrix(&sigma, 0.1, &mut dg);

        // Player 0 block against player 1 is the first table.
        assert_abs_diff_eq!(dg[[1, 4]], 5.);
        // Player 1 block against player 0 is the second table transposed.
        assert_abs_diff_eq!(dg[[4, 1]], 15.);
        assert_abs_diff_eq!(dg[[2, 2]], 0.1);
        assert_abs_diff_eq!(dg[[4, 4]], 0.3, epsilon = 1e-15);
        assert_abs_diff_eq!(dg[[2, 3]], 0.);
    }

    #[test]
    fn random() {
        let mut rng = StdRng::seed_from_u64(3);
        let game = NormalFormGame::random(&[2, 3, 2], &mut rng).unwrap();

        assert_eq!(game.num_actions(), 7);
        for player in 0..3 {
            assert!(game.payoff_table(player).iter().all(|&u| (0. ..10.).contains(&u)));
        }
        let mut rng = StdRng::seed_from_u64(3);
        let again = NormalFormGame::random(&[2, 3, 2], &mut rng).unwrap();
        assert_eq!(game.payoff_table(2), again.payoff_table(2));
    }
}
