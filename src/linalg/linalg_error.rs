use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinalgError {
    #[error("Matrix is not square: {0}x{1}")]
    NotSquare(usize, usize),

    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Matrix is singular.")]
    Singular,
}
