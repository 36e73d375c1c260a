use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use super::SolveError;

/// Tuning knobs of one GNM solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveConfig {
    /// Sub-steps per support region. Ignored for two players, whose path is
    /// piecewise linear and crosses each region in one step.
    pub steps: usize,
    /// Residual below which a point counts as exactly on the path. Also scales
    /// the tie-breaking perturbation of the payoff Jacobian.
    pub fuzz: f64,
    /// Sub-steps between two local Newton corrections (three or more players).
    pub lnm_freq: usize,
    /// Iterations allowed to one local Newton correction.
    pub lnm_max: usize,
    /// The path is abandoned once λ drops below this value while decreasing.
    pub lambda_min: f64,
    /// Refit the perturbation ray to the live point instead of giving up when
    /// the residual exceeds `threshold`. Trades the convergence guarantee for
    /// robustness.
    pub wobble: bool,
    pub threshold: f64,
    /// Driver iterations after which the solve stops with whatever it found.
    pub max_steps: Option<usize>,
}

impl Default for SolveConfig {
    fn default() -> Self {
        SolveConfig {
            steps: 100,
            fuzz: 1e-12,
            lnm_freq: 3,
            lnm_max: 10,
            lambda_min: -10.,
            wobble: false,
            threshold: 1e-2,
            max_steps: None,
        }
    }
}

impl SolveConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SolveError> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|err| SolveError::ConfigFile(err, path.as_ref().display().to_string()))?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SolveError> {
        if self.steps == 0 {
            return Err(SolveError::InvalidConfig("steps must be at least 1".into()));
        }
        if self.lnm_freq == 0 {
            return Err(SolveError::InvalidConfig("lnm_freq must be at least 1".into()));
        }
        if !(self.fuzz > 0. && self.fuzz.is_finite()) {
            return Err(SolveError::InvalidConfig(format!(
                "fuzz must be positive, got {}",
                self.fuzz
            )));
        }
        if !(self.threshold > 0. && self.threshold.is_finite()) {
            return Err(SolveError::InvalidConfig(format!(
                "threshold must be positive, got {}",
                self.threshold
            )));
        }
        if !(self.lambda_min.is_finite() && self.lambda_min < 1.) {
            return Err(SolveError::InvalidConfig(format!(
                "lambda_min must be below 1, got {}",
                self.lambda_min
            )));
        }
        Ok(())
    }

    /// Sub-steps spent crossing one support region of a game with
    /// `num_players` players.
    pub fn steps_per_region(&self, num_players: usize) -> usize {
        if num_players <= 2 { 1 } else { self.steps }
    }
}
