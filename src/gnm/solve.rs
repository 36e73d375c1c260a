use log::info;
use rayon::prelude::*;

use super::path::Path;
use super::{PathStats, SolveConfig, SolveError, Termination};
use crate::game::{Game, StrategyProfile};
use crate::linalg::Vector;

/// Outcome of one path: the equilibria met along it, in order, and why it
/// stopped.
#[derive(Debug, Clone)]
pub struct Solution {
    pub equilibria: Vec<StrategyProfile>,
    pub termination: Termination,
    pub stats: PathStats,
}

/// Traces the homotopy path defined by `ray` and returns the equilibria of
/// `game` found on it.
///
/// `on_step` sees the starting profile (`"start"`), the profile at every
/// support boundary (labelled with the current λ) and every equilibrium
/// (`"NE"`). Invalid input is rejected before the first step. Once tracing has
/// started the solve always returns `Ok`, and numerical breakdowns show up in
/// [`Solution::termination`].
pub fn gnm_solve<G, F>(
    game: &G,
    ray: Vector,
    config: &SolveConfig,
    mut on_step: F,
) -> Result<Solution, SolveError>
where
    G: Game + ?Sized,
    F: FnMut(&StrategyProfile, &str),
{
    let mut path = Path::start(game, ray, config)?;
    let termination = path.run(&mut on_step);
    let solution = path.finish(termination);
    info!(
        "Path finished: {} after {} iterations, {} equilibria",
        solution.termination,
        solution.stats.iterations,
        solution.equilibria.len()
    );
    Ok(solution)
}

/// Traces one path per ray in parallel. Results keep the order of `rays`.
pub fn gnm_solve_many<G>(
    game: &G,
    rays: Vec<Vector>,
    config: &SolveConfig,
) -> Vec<Result<Solution, SolveError>>
where
    G: Game + ?Sized,
{
    rays.into_par_iter()
        .map(|ray| gnm_solve(game, ray, config, |_, _| {}))
        .collect()
}
