use log::debug;

use super::SolveConfig;
use super::workspace::Workspace;
use crate::game::Game;
use crate::linalg::{MatrixExt, Vector};

/// Newton steps are skipped once the adjoint dwarfs the determinant by this
/// factor: near a turning point of λ they would slide along the path instead of
/// onto it.
const CONDITION_LIMIT: f64 = 1e8;

/// Pulls `z` back onto the path at fixed `lambda` and fixed `support`.
///
/// Runs at most `lnm_max` Newton iterations on `z - σ - v - λ·g = 0` and returns
/// the final residual. A residual that grows makes the method restore the
/// previous point and halve the step. Two failures in a row, a singular
/// Jacobian or a badly conditioned one end the refinement early. `ws.r` must
/// hold the retraction Jacobian of `support`, and on return `ws` describes `z`.
pub(crate) fn local_newton<G>(
    game: &G,
    ws: &mut Workspace,
    z: &mut Vector,
    support: &[bool],
    lambda: f64,
    ray: &Vector,
    config: &SolveConfig,
) -> f64
where
    G: Game + ?Sized,
{
    let fuzz = config.fuzz;
    let mut previous: Option<f64> = None;
    let mut scale = 1.;
    let mut failures = 0;

    for iteration in 0..config.lnm_max {
        ws.evaluate(game, z, support, fuzz);
        let mut error = ws.residual(z, lambda, ray);
        if error < fuzz {
            debug!("LNM converged after {iteration} iterations ({error:.3e})");
            return error;
        }

        if let Some(last) = previous {
            if !error.is_finite() || error > last {
                failures += 1;
                z.assign(&ws.backup);
                ws.evaluate(game, z, support, fuzz);
                if failures >= 2 {
                    debug!("LNM diverged twice, keeping residual {last:.3e}");
                    ws.residual(z, lambda, ray);
                    return last;
                }
                scale *= 0.5;
                error = ws.residual(z, lambda, ray);
            } else {
                failures = 0;
            }
        }

        ws.build_jacobian();
        let det = match ws.jac.adjoint() {
            Ok(det) if det != 0. => det,
            _ => {
                debug!("LNM stopped on a singular Jacobian ({error:.3e})");
                return error;
            }
        };
        if ws.jac.max_abs() > CONDITION_LIMIT * det.abs() {
            debug!("LNM stopped on an ill-conditioned Jacobian ({error:.3e})");
            return error;
        }

        ws.backup.assign(z);
        previous = Some(error);
        ws.jac.multiply_into(&ws.residual, &mut ws.step);
        z.scaled_add(-scale / det, &ws.step);
    }

    ws.evaluate(game, z, support, fuzz);
    ws.residual(z, lambda, ray)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::NormalFormGame;
    use crate::linalg::VectorExt;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn cyclic() -> NormalFormGame {
        NormalFormGame::from_fn(&[2, 2, 2], |a| {
            vec![
                (if a[0] == a[1] { 1. } else { 0. }) + 0.5 * a[0] as f64,
                (if a[1] != a[2] { 1. } else { 0. }) + 0.3 * a[1] as f64,
                (if a[2] == a[0] { 2. } else { 0. }) - 0.4 * a[2] as f64,
            ]
        })
        .unwrap()
    }

    /// Lifts an interior profile to the `z` that represents it at `λ = 0`.
    fn lift(game: &NormalFormGame, sigma: &Vector, ws: &mut Workspace) -> Vector {
        game.payoff_matrix(sigma, 0., &mut ws.dg);
        let mut payoffs = Vector::zeros(6);
        game.deviation_payoffs(&ws.dg, sigma, &mut payoffs);
        sigma + &payoffs
    }

    #[test]
    fn converges_to_mixed_equilibrium() {
        let game = cyclic();
        let config = SolveConfig::default();
        let support = [true; 6];
        let ray = Vector::zeros(6);
        let mut ws = Workspace::new(6);
        game.retract_jacobian(&support, &mut ws.r);

        let equilibrium = array![0.4, 0.6, 0.75, 0.25, 0.35, 0.65];
        let mut z = lift(&game, &equilibrium, &mut ws);
        z += &array![0.01, -0.02, 0.015, 0.0, -0.01, 0.02];

        let error = local_newton(&game, &mut ws, &mut z, &support, 0., &ray, &config);
        assert!(error < config.fuzz);
        assert_abs_diff_eq!(ws.sigma, equilibrium, epsilon = 1e-9);
        assert!(ws.sigma.all_finite());
    }

    #[test]
    fn respects_iteration_limit() {
        let game = cyclic();
        let config = SolveConfig {
            lnm_max: 0,
            ..Default::default()
        };
        let support = [true; 6];
        let ray = Vector::zeros(6);
        let mut ws = Workspace::new(6);
        game.retract_jacobian(&support, &mut ws.r);

        let mut z = lift(&game, &array![0.5, 0.5, 0.5, 0.5, 0.5, 0.5], &mut ws);
        let before = z.clone();
        let error = local_newton(&game, &mut ws, &mut z, &support, 0., &ray, &config);
        assert!(error > 1e-3);
        assert_eq!(z, before);
    }
}
