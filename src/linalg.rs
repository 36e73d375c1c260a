//! Dense vectors and matrices over `f64` used by the homotopy engine.
mod vector;
pub use self::vector::*;

mod matrix;
pub use self::matrix::*;

mod linalg_error;
pub use linalg_error::LinalgError;
