use log::{debug, info, warn};

use super::lnm::local_newton;
use super::ray::{dominance_factor, validate_ray};
use super::workspace::Workspace;
use super::{PathStats, Solution, SolveConfig, SolveError, Termination};
use crate::game::{Game, StrategyProfile, retraction};
use crate::linalg::{MatrixExt, Vector, VectorExt};

/// A support flip about to happen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Crossing {
    pub action: usize,
    /// The step that reached the boundary had zero length.
    pub empty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum PathState {
    Tracing,
    AtBoundary(Crossing),
    Terminal(Termination),
}

/// One homotopy path: the point `(z, λ)`, the support it is traced on and the
/// bookkeeping needed to step it forward.
///
/// Along the path `z = σ + v(σ) + λ·g`, where `σ` is `z` retracted onto the
/// support and `v` are the deviation payoffs at `σ`.
pub(crate) struct Path<'a, G>
where
    G: Game + ?Sized,
{
    game: &'a G,
    config: &'a SolveConfig,
    ws: Workspace,
    ray: Vector,
    z: Vector,
    lambda: f64,
    support: Vec<bool>,
    dz: Vector,
    dlambda: f64,
    /// Sign applied to `(Adj(J)·g, det J)`; fixed at the first step.
    orientation: Option<f64>,
    /// Last flipped action. Excluded from the boundary search.
    flipped: Option<usize>,
    /// Flip whose direction the next tangent must be oriented against.
    pending: Option<usize>,
    steps_per_region: usize,
    steps_left: usize,
    region_substeps: usize,
    empty_flips: usize,
    index: i32,
    stats: PathStats,
    equilibria: Vec<StrategyProfile>,
}

impl<'a, G> Path<'a, G>
where
    G: Game + ?Sized,
{
    /// Places the path at `λ = 1`, on the pure profile where each player's part
    /// of `ray` peaks. The ray is normalized, then stretched until that profile
    /// is the unique equilibrium of the perturbed game.
    pub fn start(
        game: &'a G,
        mut ray: Vector,
        config: &'a SolveConfig,
    ) -> Result<Self, SolveError> {
        config.validate()?;
        game.check_layout()?;
        if game.num_players() < 2 {
            return Err(SolveError::TooFewPlayers(game.num_players()));
        }
        let start = validate_ray(game, &ray)?;
        let m = game.num_actions();
        let norm = ray.norm();
        ray /= norm;

        let mut ws = Workspace::new(m);
        let mut support = vec![false; m];
        for &action in &start {
            ws.sigma[action] = 1.;
            support[action] = true;
        }
        game.payoff_matrix(&ws.sigma, 0., &mut ws.dg);
        game.deviation_payoffs(&ws.dg, &ws.sigma, &mut ws.payoffs);
        let c = dominance_factor(game, &ray, &start, &ws.payoffs);
        if c > 0. {
            ray *= 2. * c;
        }
        let z = &ws.sigma + &ws.payoffs + &ray;
        game.retract_jacobian(&support, &mut ws.r);
        debug!("Path starts at pure profile {start:?}, ray scaled by {:.4}", 2. * c);

        let steps_per_region = config.steps_per_region(game.num_players());
        Ok(Path {
            game,
            config,
            ws,
            ray,
            z,
            lambda: 1.,
            support,
            dz: Vector::zeros(m),
            dlambda: 0.,
            orientation: None,
            flipped: None,
            pending: None,
            steps_per_region,
            steps_left: steps_per_region,
            region_substeps: 0,
            empty_flips: 0,
            index: 1,
            stats: PathStats::default(),
            equilibria: Vec::new(),
        })
    }

    pub fn run<F>(&mut self, on_step: &mut F) -> Termination
    where
        F: FnMut(&StrategyProfile, &str),
    {
        on_step(&self.ws.sigma, "start");
        let mut state = PathState::Tracing;
        loop {
            state = match state {
                PathState::Tracing => self.trace(on_step),
                PathState::AtBoundary(crossing) => self.cross(crossing, on_step),
                PathState::Terminal(termination) => return termination,
            };
        }
    }

    pub fn finish(mut self, termination: Termination) -> Solution {
        self.stats.max_region_substeps = self.stats.max_region_substeps.max(self.region_substeps);
        Solution {
            equilibria: self.equilibria,
            termination,
            stats: self.stats,
        }
    }

    fn trace<F>(&mut self, on_step: &mut F) -> PathState
    where
        F: FnMut(&StrategyProfile, &str),
    {
        self.stats.iterations += 1;
        if self
            .config
            .max_steps
            .is_some_and(|max| self.stats.iterations > max)
        {
            return PathState::Terminal(Termination::StepBudget);
        }

        self.tangent();
        if !self.dz.all_finite() || !self.dlambda.is_finite() {
            return PathState::Terminal(Termination::NonFinite);
        }

        let (distance, target) = self.next_boundary();
        if distance == 0. {
            self.steps_left = 1;
        }
        let h = distance / self.steps_left as f64;

        if self.crosses_zero(h) {
            return self.refine_equilibrium(on_step);
        }
        let Some(target) = target else {
            return PathState::Terminal(Termination::NoMoreBoundaries);
        };
        if self.lambda < self.config.lambda_min && self.dlambda < 0. {
            return PathState::Terminal(Termination::LambdaBelowMinimum {
                lambda: self.lambda,
            });
        }

        self.advance(h, target)
    }

    /// Oriented tangent `(dz, dλ)` at the current point. A singular Jacobian
    /// leaves the previous tangent in place.
    fn tangent(&mut self) {
        let game = self.game;
        self.ws.evaluate(game, &self.z, &self.support, self.config.fuzz);
        self.ws.build_jacobian();
        let det = match self.ws.jac.adjoint() {
            Ok(det) => det,
            Err(err) => {
                warn!("{err} Keeping the previous tangent at λ = {:.6}", self.lambda);
                return;
            }
        };
        self.ws.jac.multiply_into(&self.ray, &mut self.dz);

        let orientation = match (self.orientation, self.pending.take()) {
            (None, _) => {
                if det > 0. {
                    -1.
                } else {
                    1.
                }
            }
            (Some(current), None) => current,
            (Some(current), Some(action)) => self.orientation_after_flip(action, current),
        };
        self.orientation = Some(orientation);
        self.dz *= orientation;
        self.dlambda = orientation * det;
    }

    /// After `action` flips, the path must move into the new region: the gap of
    /// an action that entered the support has to grow, the gap of one that left
    /// has to shrink. `self.dz` is still unoriented here.
    fn orientation_after_flip(&self, action: usize, current: f64) -> f64 {
        let actions = self.game.player_actions(self.game.owner(action));
        let rate = self.dz[action] - retraction::support_mean(&self.dz, &self.support, actions);
        let wanted = if self.support[action] { 1. } else { -1. };
        if rate == 0. {
            warn!("Cannot orient the path after flipping action {action}");
            current
        } else if rate * wanted > 0. {
            1.
        } else {
            -1.
        }
    }

    /// Path length to the closest support boundary along the tangent, and the
    /// action that flips there.
    fn next_boundary(&self) -> (f64, Option<usize>) {
        let mut distance = f64::INFINITY;
        let mut target = None;
        for player in 0..self.game.num_players() {
            let actions = self.game.player_actions(player);
            let shift = retraction::support_shift(&self.z, &self.support, actions.clone());
            let drift = retraction::support_mean(&self.dz, &self.support, actions.clone());
            for i in actions {
                if Some(i) == self.flipped {
                    continue;
                }
                let gap = self.z[i] - shift;
                let rate = self.dz[i] - drift;
                let time = if self.support[i] && rate < 0. {
                    gap.max(0.) / -rate
                } else if !self.support[i] && rate > 0. {
                    (-gap).max(0.) / rate
                } else {
                    continue;
                };
                if time < distance {
                    distance = time;
                    target = Some(i);
                }
            }
        }
        (distance, target)
    }

    fn crosses_zero(&self, h: f64) -> bool {
        let (lambda, dlambda) = (self.lambda, self.dlambda);
        (lambda != 0. && dlambda != 0. && lambda * (lambda + h * dlambda) < 0.)
            || (h.is_infinite() && lambda * dlambda < 0.)
    }

    /// Steps exactly to `λ = 0` and refines the point there. A profile whose
    /// residual falls below `fuzz` is an equilibrium of the game.
    fn refine_equilibrium<F>(&mut self, on_step: &mut F) -> PathState
    where
        F: FnMut(&StrategyProfile, &str),
    {
        let game = self.game;
        self.z.scaled_add(-self.lambda / self.dlambda, &self.dz);
        self.lambda = 0.;
        self.stats.lnm_final += 1;
        let error = local_newton(
            game,
            &mut self.ws,
            &mut self.z,
            &self.support,
            0.,
            &self.ray,
            self.config,
        );
        if !self.z.all_finite() || !self.ws.sigma.all_finite() {
            return PathState::Terminal(Termination::NonFinite);
        }

        if error < self.config.fuzz {
            let mut sigma = self.ws.sigma.clone();
            game.normalize_strategy(&mut sigma);
            info!(
                "Equilibrium {} found (residual {error:.3e}, index {})",
                self.equilibria.len() + 1,
                self.index
            );
            on_step(&sigma, "NE");
            self.equilibria.push(sigma);
            self.index = -self.index;
        } else {
            warn!("Discarding equilibrium candidate with residual {error:.3e}");
        }
        PathState::Tracing
    }

    /// Takes one sub-step of length `h` towards the boundary of `target`.
    ///
    /// Off two-player games the path bends, so another action may cross its
    /// boundary first. Such a crossing is located by secant interpolation of
    /// its gap, and the step is cut short there.
    fn advance(&mut self, h: f64, target: usize) -> PathState {
        let game = self.game;
        self.ws.next_z.assign(&self.z);
        self.ws.next_z.scaled_add(h, &self.dz);
        retraction::support_gaps(game, &self.z, &self.support, &mut self.ws.gaps);
        retraction::support_gaps(game, &self.ws.next_z, &self.support, &mut self.ws.next_gaps);

        let last_substep = self.steps_left == 1;
        let mut overshoot: Option<(f64, usize)> = None;
        for i in 0..game.num_actions() {
            if last_substep && i == target {
                continue;
            }
            let active = self.support[i];
            let violated = |gap: f64| if active { gap < 0. } else { gap > 0. };
            let (old, new) = (self.ws.gaps[i], self.ws.next_gaps[i]);
            if violated(new) && !violated(old) {
                let fraction = old / (old - new);
                if fraction < overshoot.map_or(1., |(f, _)| f) {
                    overshoot = Some((fraction, i));
                }
            }
        }

        let length = match overshoot {
            Some((fraction, action)) => {
                debug!("Action {action} crosses its boundary early, at {fraction:.4} of the step");
                self.z.scaled_add(fraction * h, &self.dz);
                self.steps_left = 1;
                fraction * h
            }
            None => {
                self.z.assign(&self.ws.next_z);
                h
            }
        };
        let previous = self.lambda;
        self.lambda += length * self.dlambda;
        self.steps_left -= 1;
        self.stats.substeps += 1;
        self.region_substeps += 1;

        if !self.z.all_finite() || !self.lambda.is_finite() {
            return PathState::Terminal(Termination::NonFinite);
        }
        // λ may pass the minimum inside one sub-step and turn back before the
        // next iteration.
        if previous >= self.config.lambda_min && self.lambda < self.config.lambda_min {
            return PathState::Terminal(Termination::LambdaBelowMinimum {
                lambda: self.lambda,
            });
        }
        if let Some((_, action)) = overshoot {
            return PathState::AtBoundary(Crossing {
                action,
                empty: false,
            });
        }
        if self.steps_left == 0 {
            return PathState::AtBoundary(Crossing {
                action: target,
                empty: h == 0.,
            });
        }

        if game.num_players() > 2 && self.stats.substeps % self.config.lnm_freq == 0 {
            self.stats.lnm_periodic += 1;
            local_newton(
                game,
                &mut self.ws,
                &mut self.z,
                &self.support,
                self.lambda,
                &self.ray,
                self.config,
            );
        }
        self.check_drift()
    }

    fn cross<F>(&mut self, crossing: Crossing, on_step: &mut F) -> PathState
    where
        F: FnMut(&StrategyProfile, &str),
    {
        let game = self.game;
        let Crossing { action, empty } = crossing;
        if empty {
            self.empty_flips += 1;
            if self.empty_flips > 2 * game.num_actions() {
                return PathState::Terminal(Termination::Stalled);
            }
        } else {
            self.empty_flips = 0;
        }

        self.support[action] = !self.support[action];
        self.flipped = Some(action);
        self.pending = Some(action);
        self.steps_left = self.steps_per_region;
        self.stats.boundaries += 1;
        self.stats.max_region_substeps = self.stats.max_region_substeps.max(self.region_substeps);
        self.region_substeps = 0;

        game.retract_jacobian(&self.support, &mut self.ws.r);
        self.ws.evaluate(game, &self.z, &self.support, self.config.fuzz);
        debug!(
            "Action {action} {} the support at λ = {:.6}",
            if self.support[action] { "enters" } else { "leaves" },
            self.lambda
        );
        on_step(&self.ws.sigma, &self.lambda.to_string());

        self.check_drift()
    }

    /// Measures how far the point has drifted off the path and corrects it: by
    /// a local Newton pass when the path is nonlinear, then by refitting the
    /// ray if wobbling is allowed.
    fn check_drift(&mut self) -> PathState {
        let game = self.game;
        let threshold = self.config.threshold;
        self.ws.evaluate(game, &self.z, &self.support, self.config.fuzz);
        let mut error = self.ws.residual(&self.z, self.lambda, &self.ray);

        if error > threshold && game.num_players() > 2 {
            self.stats.lnm_recovery += 1;
            error = local_newton(
                game,
                &mut self.ws,
                &mut self.z,
                &self.support,
                self.lambda,
                &self.ray,
                self.config,
            );
        }
        if !error.is_finite() {
            return PathState::Terminal(Termination::NonFinite);
        }
        if error > threshold {
            if !self.config.wobble || self.lambda == 0. {
                return PathState::Terminal(Termination::ErrorThreshold { residual: error });
            }
            self.stats.wobbles += 1;
            warn!(
                "Residual {error:.3e} above threshold, refitting the ray at λ = {:.6}",
                self.lambda
            );
            self.ray.assign(&self.z);
            self.ray -= &self.ws.sigma;
            self.ray -= &self.ws.payoffs;
            self.ray /= self.lambda;
        }
        PathState::Tracing
    }
}
