use ndarray_rand::RandomExt;
use ndarray_rand::rand::Rng;
use ndarray_rand::rand_distr::Uniform;

use super::SolveError;
use crate::game::Game;
use crate::linalg::{Vector, VectorExt};

/// Checks that `ray` can perturb `game` and returns, for every player, the
/// action where the ray peaks. That pure profile is the starting point of the
/// path.
pub fn validate_ray<G>(game: &G, ray: &Vector) -> Result<Vec<usize>, SolveError>
where
    G: Game + ?Sized,
{
    if ray.len() != game.num_actions() {
        return Err(SolveError::RayDimension {
            expected: game.num_actions(),
            found: ray.len(),
        });
    }
    if !ray.all_finite() {
        return Err(SolveError::NonFiniteRay);
    }
    if ray.norm2() == 0. {
        return Err(SolveError::ZeroRay);
    }

    (0..game.num_players())
        .map(|player| {
            let actions = game.player_actions(player);
            let best = actions
                .clone()
                .max_by(|&i, &j| ray[i].total_cmp(&ray[j]))
                .ok_or(SolveError::DegenerateRay { player })?;
            if actions.filter(|&i| ray[i] == ray[best]).count() > 1 {
                return Err(SolveError::DegenerateRay { player });
            }
            Ok(best)
        })
        .collect()
}

/// Draws a ray with entries uniform in `[-1, 1)`, redrawing on ties.
pub fn random_ray<G, R>(game: &G, rng: &mut R) -> Vector
where
    G: Game + ?Sized,
    R: Rng + ?Sized,
{
    loop {
        let ray = Vector::random_using(game.num_actions(), Uniform::new(-1., 1.), rng);
        if validate_ray(game, &ray).is_ok() {
            return ray;
        }
    }
}

/// Factor `c` such that, once the ray is scaled by anything above `c`, every
/// player's starting action is the strict best response at `λ = 1`.
///
/// `payoffs` are the deviation payoffs against the pure profile `start`.
pub(crate) fn dominance_factor<G>(game: &G, ray: &Vector, start: &[usize], payoffs: &Vector) -> f64
where
    G: Game + ?Sized,
{
    start
        .iter()
        .enumerate()
        .flat_map(|(player, &s)| {
            game.player_actions(player)
                .filter(move |&j| j != s)
                .map(move |j| (payoffs[j] - payoffs[s]) / (ray[s] - ray[j]))
        })
        .fold(0., f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::NormalFormGame;
    use ndarray::array;
    use ndarray_rand::rand::SeedableRng;
    use ndarray_rand::rand::rngs::StdRng;

    fn game() -> NormalFormGame {
        NormalFormGame::from_fn(&[2, 3], |a| vec![a[0] as f64, a[1] as f64]).unwrap()
    }

    #[test]
    fn start_profile() {
        let start = validate_ray(&game(), &array![0.1, 0.3, -0.2, 0.9, 0.4]).unwrap();
        assert_eq!(start, vec![1, 3]);
    }

    #[test]
    fn degenerate_rays() {
        let game = game();
        assert!(matches!(
            validate_ray(&game, &array![0.1, 0.3, 0.9, -0.2, 0.9]),
            Err(SolveError::DegenerateRay { player: 1 })
        ));
        assert!(matches!(
            validate_ray(&game, &array![0.1, 0.3]),
            Err(SolveError::RayDimension {
                expected: 5,
                found: 2
            })
        ));
        assert!(matches!(
            validate_ray(&game, &array![0.1, f64::NAN, 0., 0., 0.]),
            Err(SolveError::NonFiniteRay)
        ));
        assert!(matches!(
            validate_ray(&game, &Vector::zeros(5)),
            Err(SolveError::ZeroRay)
        ));
    }

    #[test]
    fn random_rays_are_generic() {
        let game = game();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            let ray = random_ray(&game, &mut rng);
            assert!(validate_ray(&game, &ray).is_ok());
            assert!(ray.iter().all(|&g| (-1. ..1.).contains(&g)));
        }
    }

    #[test]
    fn dominance() {
        let game = game();
        let ray = array![1., 0., 0., 0.5, 0.];
        // Player 0 gains 1 by leaving action 0, player 1 gains 2 by leaving action 3.
        let payoffs = array![0., 1., 0., 0., 2.];
        let c = dominance_factor(&game, &ray, &[0, 3], &payoffs);
        assert_eq!(c, 4.);
    }
}
