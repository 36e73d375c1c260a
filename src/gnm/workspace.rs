use ndarray::linalg::general_mat_mul;

use crate::game::{Game, StrategyProfile, retraction};
use crate::linalg::{Matrix, Vector, VectorExt};

/// Buffers owned by one solve and reused at every step.
///
/// `sigma`, `dg` and `payoffs` always describe the point last passed to
/// [`Workspace::evaluate`]; `r` is the retraction Jacobian of the current
/// support and `jac` holds either `J` or, after an adjoint, `Adj(J)`.
pub(crate) struct Workspace {
    pub sigma: StrategyProfile,
    pub payoffs: Vector,
    pub dg: Matrix,
    pub r: Matrix,
    pub jac: Matrix,
    pub residual: Vector,
    pub step: Vector,
    pub backup: Vector,
    pub gaps: Vector,
    pub next_gaps: Vector,
    pub next_z: Vector,
}

impl Workspace {
    pub fn new(num_actions: usize) -> Self {
        let m = num_actions;
        Workspace {
            sigma: Vector::zeros(m),
            payoffs: Vector::zeros(m),
            dg: Matrix::zeros((m, m)),
            r: Matrix::zeros((m, m)),
            jac: Matrix::zeros((m, m)),
            residual: Vector::zeros(m),
            step: Vector::zeros(m),
            backup: Vector::zeros(m),
            gaps: Vector::zeros(m),
            next_gaps: Vector::zeros(m),
            next_z: Vector::zeros(m),
        }
    }

    /// Retracts `z` onto `support` and evaluates the payoff Jacobian and the
    /// deviation payoffs there.
    pub fn evaluate<G>(&mut self, game: &G, z: &Vector, support: &[bool], fuzz: f64)
    where
        G: Game + ?Sized,
    {
        retraction::restricted_retract(game, z, support, &mut self.sigma);
        game.payoff_matrix(&self.sigma, fuzz, &mut self.dg);
        game.deviation_payoffs(&self.dg, &self.sigma, &mut self.payoffs);
    }

    /// Stores `z - σ - v - λ·g` in `residual` and returns its largest entry.
    pub fn residual(&mut self, z: &Vector, lambda: f64, ray: &Vector) -> f64 {
        self.residual.assign(z);
        self.residual -= &self.sigma;
        self.residual -= &self.payoffs;
        self.residual.scaled_add(-lambda, ray);
        self.residual.max_abs()
    }

    /// Writes `J = I - (I + DG)·R` into `jac`.
    pub fn build_jacobian(&mut self) {
        general_mat_mul(-1., &self.dg, &self.r, 0., &mut self.jac);
        self.jac -= &self.r;
        self.jac.diag_mut().mapv_inplace(|x| x + 1.);
    }
}
