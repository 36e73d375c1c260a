//! Nash equilibria of finite N-player games by the Global Newton Method.
//!
//! A solve starts from the unique equilibrium of the game perturbed by a large
//! bonus `g` and follows the equilibria of the games perturbed by `λ·g` while
//! `λ` shrinks. Every time the path reaches `λ = 0` it meets an equilibrium of
//! the game itself.
//!
//! ```no_run
//! use gnmsolver::{BimatrixGame, SolveConfig, gnm_solve};
//! use ndarray::array;
//!
//! let game = BimatrixGame::new(array![[3., 0.], [0., 1.]], array![[1., 0.], [0., 3.]]).unwrap();
//! let solution = gnm_solve(&game, array![1., 0.3, 0.8, 0.1], &SolveConfig::default(), |_, _| {})
//!     .unwrap();
//! println!("{:?}", solution.equilibria);
//! ```
pub mod game;
pub mod gnm;
pub mod linalg;

pub use game::{BimatrixGame, Game, GameError, NormalFormGame, Strategy, StrategyProfile};
pub use gnm::{
    EquilibriumSet, PathStats, Solution, SolveConfig, SolveError, Termination, gnm_solve,
    gnm_solve_many, random_ray, validate_ray,
};
pub use linalg::{LinalgError, Matrix, MatrixExt, Vector, VectorExt};
