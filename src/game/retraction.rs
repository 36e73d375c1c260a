//! Euclidean retraction onto the product of the players' probability simplices.
//!
//! Between two support boundaries the retraction is affine: every active action
//! is shifted by the same amount, chosen so that the player's block sums to one.
//! The helpers below work with that fixed-support form as well as with the full
//! projection.
use std::ops::Range;

use ndarray::{Zip, prelude::*};

use super::Game;
use crate::linalg::{Matrix, Vector};

/// Projects `z` onto the probability simplex, writing the result into `dest`.
pub fn project_simplex(z: ArrayView1<f64>, mut dest: ArrayViewMut1<f64>) {
    if z.is_empty() {
        return;
    }
    let mut sorted = z.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));

    let mut sum = 0.;
    let mut shift = sorted[0] - 1.;
    for (k, x) in sorted.iter().enumerate() {
        sum += x;
        let count = (k + 1) as f64;
        if sum - count * x <= 1. {
            shift = (sum - 1.) / count;
        } else {
            break;
        }
    }

    Zip::from(&mut dest)
        .and(&z)
        .for_each(|d, &x| *d = (x - shift).max(0.));
}

pub fn retract<G>(game: &G, z: &Vector, dest: &mut Vector)
where
    G: Game + ?Sized,
{
    for player in 0..game.num_players() {
        let actions = game.player_actions(player);
        project_simplex(z.slice(s![actions.clone()]), dest.slice_mut(s![actions]));
    }
}

/// Jacobian of the retraction for a fixed support: block diagonal, with
/// `1 - 1/k` on the diagonal and `-1/k` off it among the `k` active actions of
/// each player, and zero wherever an inactive action is involved.
pub fn retract_jacobian<G>(game: &G, support: &[bool], dest: &mut Matrix)
where
    G: Game + ?Sized,
{
    dest.fill(0.);
    for player in 0..game.num_players() {
        let active: Vec<usize> = game.player_actions(player).filter(|&i| support[i]).collect();
        let k = active.len() as f64;
        for &i in &active {
            for &j in &active {
                dest[[i, j]] = if i == j { 1. - 1. / k } else { -1. / k };
            }
        }
    }
}

/// Uniform shift `(Σ z_i - 1) / k` over the `k` active actions in `actions`.
///
/// Every player keeps at least one active action, so `k` is never zero.
pub fn support_shift(z: &Vector, support: &[bool], actions: Range<usize>) -> f64 {
    let (sum, count) = actions
        .filter(|&i| support[i])
        .fold((0., 0_usize), |(sum, count), i| (sum + z[i], count + 1));
    (sum - 1.) / count as f64
}

/// Mean of `dz` over the active actions in `actions`: the rate at which the
/// shift moves along a direction `dz`.
pub fn support_mean(dz: &Vector, support: &[bool], actions: Range<usize>) -> f64 {
    let (sum, count) = actions
        .filter(|&i| support[i])
        .fold((0., 0_usize), |(sum, count), i| (sum + dz[i], count + 1));
    sum / count as f64
}

/// Signed distance `z_i - w` of every action to its player's shift. Active
/// actions stay active while it is nonnegative, inactive ones stay inactive
/// while it is nonpositive.
pub fn support_gaps<G>(game: &G, z: &Vector, support: &[bool], dest: &mut Vector)
where
    G: Game + ?Sized,
{
    for player in 0..game.num_players() {
        let actions = game.player_actions(player);
        let shift = support_shift(z, support, actions.clone());
        for i in actions {
            dest[i] = z[i] - shift;
        }
    }
}

/// Retraction restricted to `support`: the affine branch of `retract` for that
/// support, clipped at zero and renormalized.
pub fn restricted_retract<G>(game: &G, z: &Vector, support: &[bool], dest: &mut Vector)
where
    G: Game + ?Sized,
{
    for player in 0..game.num_players() {
        let actions = game.player_actions(player);
        let shift = support_shift(z, support, actions.clone());
        let mut total = 0.;
        for i in actions.clone() {
            dest[i] = if support[i] {
                (z[i] - shift).max(0.)
            } else {
                0.
            };
            total += dest[i];
        }
        if total > 0. {
            dest.slice_mut(s![actions]).mapv_inplace(|p| p / total);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::NormalFormGame;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn layout() -> NormalFormGame {
        NormalFormGame::from_fn(&[2, 3, 4], |_| vec![0., 0., 0.]).unwrap()
    }

    #[test]
    fn simplex_projection() {
        let mut dest = Vector::zeros(3);
        project_simplex(array![0.5, 0.2, 0.3].view(), dest.view_mut());
        assert_abs_diff_eq!(dest, array![0.5, 0.2, 0.3], epsilon = 1e-15);

        project_simplex(array![2., 0., 0.].view(), dest.view_mut());
        assert_abs_diff_eq!(dest, array![1., 0., 0.], epsilon = 1e-15);

        project_simplex(array![1., 1., -3.].view(), dest.view_mut());
        assert_abs_diff_eq!(dest, array![0.5, 0.5, 0.], epsilon = 1e-15);
    }

    #[test]
    fn jacobian_blocks() {
        let game = layout();
        let support = [true, false, true, true, false, false, true, true, true];
        let mut r = Matrix::zeros((9, 9));
        game.retract_jacobian(&support, &mut r);

        assert_abs_diff_eq!(r[[0, 0]], 0.);
        assert_abs_diff_eq!(r[[2, 2]], 0.5);
        assert_abs_diff_eq!(r[[2, 3]], -0.5);
        assert_abs_diff_eq!(r[[7, 8]], -1. / 3.);
        assert_abs_diff_eq!(r[[8, 8]], 2. / 3.);
        assert_abs_diff_eq!(r[[4, 4]], 0.);
        assert_abs_diff_eq!(r[[3, 6]], 0.);
        // Each active row sums to zero, so R annihilates uniform shifts.
        for i in 0..9 {
            assert_abs_diff_eq!(r.row(i).sum(), 0., epsilon = 1e-15);
        }
    }

    #[test]
    fn restricted_matches_full() {
        let game = layout();
        let z = array![0.9, 0.4, 0.3, 0.5, -1., 0.6, 0.2, 0.1, -0.4];
        let sigma = game.retract(&z);
        let support: Vec<bool> = sigma.iter().map(|&p| p > 0.).collect();

        let mut restricted = Vector::zeros(9);
        restricted_retract(&game, &z, &support, &mut restricted);
        assert_abs_diff_eq!(restricted, sigma, epsilon = 1e-12);

        let mut gaps = Vector::zeros(9);
        support_gaps(&game, &z, &support, &mut gaps);
        for i in 0..9 {
            if support[i] {
                assert_abs_diff_eq!(gaps[i], sigma[i], epsilon = 1e-12);
            } else {
                assert!(gaps[i] <= 0.);
            }
        }
    }

    proptest! {
        #[test]
        fn retraction_idempotent(z in proptest::collection::vec(-5.0..5.0f64, 9)) {
            let game = layout();
            let z = Vector::from(z);
            let sigma = game.retract(&z);
            let again = game.retract(&sigma);

            prop_assert!(sigma.abs_diff_eq(&again, 1e-12));
            for player in 0..game.num_players() {
                let block = sigma.slice(s![game.player_actions(player)]);
                prop_assert!(block.iter().all(|&p| p >= 0.));
                prop_assert!((block.sum() - 1.).abs() < 1e-12);
            }
        }
    }
}
