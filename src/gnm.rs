//! Global Newton Method: follows a homotopy path from the unique equilibrium of
//! a heavily perturbed game down to equilibria of the game itself.
mod config;
pub use self::config::*;

mod termination;
pub use self::termination::*;

mod ray;
pub use self::ray::*;

mod workspace;

mod lnm;

mod path;

mod solve;
pub use self::solve::*;

mod equilibrium_set;
pub use self::equilibrium_set::*;

mod solve_error;
pub use solve_error::SolveError;
