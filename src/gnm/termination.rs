use std::fmt;

use serde::Serialize;

/// Why a path stopped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Termination {
    /// No support boundary lies ahead and λ moves away from zero.
    NoMoreBoundaries,
    /// λ dropped below the configured minimum while decreasing.
    LambdaBelowMinimum { lambda: f64 },
    /// The residual exceeded the threshold and wobbling was disabled.
    ErrorThreshold { residual: f64 },
    NonFinite,
    /// Too many consecutive zero-length boundary crossings.
    Stalled,
    StepBudget,
}

impl Termination {
    pub fn reason(&self) -> &'static str {
        match self {
            Termination::NoMoreBoundaries => "no more support boundaries",
            Termination::LambdaBelowMinimum { .. } => "lambda below minimum",
            Termination::ErrorThreshold { .. } => "accumulated error above threshold",
            Termination::NonFinite => "non-finite values on the path",
            Termination::Stalled => "stalled on degenerate support boundaries",
            Termination::StepBudget => "step budget exhausted",
        }
    }

    /// Whether the path broke down rather than running out.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Termination::ErrorThreshold { .. } | Termination::NonFinite | Termination::Stalled
        )
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::LambdaBelowMinimum { lambda } => {
                write!(f, "{} ({lambda:.4})", self.reason())
            }
            Termination::ErrorThreshold { residual } => {
                write!(f, "{} ({residual:.3e})", self.reason())
            }
            _ => f.write_str(self.reason()),
        }
    }
}

/// Counters collected along one path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PathStats {
    pub iterations: usize,
    pub substeps: usize,
    pub boundaries: usize,
    /// Most sub-steps spent inside a single support region.
    pub max_region_substeps: usize,
    pub lnm_periodic: usize,
    pub lnm_recovery: usize,
    pub lnm_final: usize,
    pub wobbles: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(
            Termination::NoMoreBoundaries.to_string(),
            "no more support boundaries"
        );
        assert_eq!(
            Termination::ErrorThreshold { residual: 0.5 }.to_string(),
            "accumulated error above threshold (5.000e-1)"
        );
        assert!(Termination::Stalled.is_error());
        assert!(!Termination::LambdaBelowMinimum { lambda: -11. }.is_error());
        assert!(!Termination::StepBudget.is_error());
    }
}
