use ndarray::linalg::general_mat_vec_mul;
use ndarray::prelude::*;

use super::{LinalgError, Vector, vector};

pub type Matrix = Array2<f64>;

pub trait MatrixExt {
    fn multiply(&self, v: &Vector) -> Vector;

    /// Writes `self · v` into `out` without allocating.
    fn multiply_into(&self, v: &Vector, out: &mut Vector);

    fn max_abs(&self) -> f64;

    /// Replaces the matrix by its classical adjoint and returns its determinant.
    ///
    /// The elimination uses full pivoting. A matrix of rank `n - 1` has a
    /// determinant of zero and a nonzero rank-one adjoint, built from its right
    /// and left null vectors. Only when two or more pivots vanish is there no
    /// adjoint to speak of, and `LinalgError::Singular` is returned with the
    /// matrix left untouched.
    fn adjoint(&mut self) -> Result<f64, LinalgError>;

    /// Solves `self · x = b` by LU decomposition with partial pivoting.
    fn solve(&self, b: &Vector) -> Result<Vector, LinalgError>;
}

fn square_dim(a: &Matrix) -> Result<usize, LinalgError> {
    let (rows, cols) = a.dim();
    if rows != cols {
        return Err(LinalgError::NotSquare(rows, cols));
    }
    Ok(rows)
}

impl MatrixExt for Matrix {
    fn multiply(&self, v: &Vector) -> Vector {
        self.dot(v)
    }

    fn multiply_into(&self, v: &Vector, out: &mut Vector) {
        general_mat_vec_mul(1., self, v, 0., out);
    }

    fn max_abs(&self) -> f64 {
        vector::max_abs(self.iter())
    }

    fn adjoint(&mut self) -> Result<f64, LinalgError> {
        let n = square_dim(self)?;
        if n == 0 {
            return Ok(1.);
        }

        // After the loop `lu` holds L (unit, strictly below the diagonal) and U of
        // P·A·Q, where row k of `lu` is row `rows[k]` of A and column k is column
        // `cols[k]`.
        let mut lu = self.clone();
        let mut rows: Vec<usize> = (0..n).collect();
        let mut cols: Vec<usize> = (0..n).collect();
        let mut sign = 1.;
        let mut rank_deficient = false;

        for k in 0..n {
            let mut pivot = None;
            let mut largest = 0.;
            for i in k..n {
                for j in k..n {
                    let a = lu[[i, j]].abs();
                    if a > largest {
                        largest = a;
                        pivot = Some((i, j));
                    }
                }
            }
            let Some((p, q)) = pivot else {
                if k == n - 1 {
                    rank_deficient = true;
                    break;
                }
                return Err(LinalgError::Singular);
            };
            if p != k {
                for j in 0..n {
                    lu.swap([p, j], [k, j]);
                }
                rows.swap(p, k);
                sign = -sign;
            }
            if q != k {
                for i in 0..n {
                    lu.swap([i, q], [i, k]);
                }
                cols.swap(q, k);
                sign = -sign;
            }
            let pivot = lu[[k, k]];
            for i in k + 1..n {
                let l = lu[[i, k]] / pivot;
                lu[[i, k]] = l;
                for j in k + 1..n {
                    lu[[i, j]] -= l * lu[[k, j]];
                }
            }
        }

        let leading: f64 = (0..n - 1).map(|k| lu[[k, k]]).product();

        if rank_deficient {
            // U·x = 0 with x[n-1] = 1, and r solves Lᵀ·r = e_{n-1}.
            let mut x = vec![0.; n];
            x[n - 1] = 1.;
            for i in (0..n - 1).rev() {
                let s: f64 = (i + 1..n).map(|m| lu[[i, m]] * x[m]).sum();
                x[i] = -s / lu[[i, i]];
            }
            let mut r = vec![0.; n];
            r[n - 1] = 1.;
            for i in (0..n - 1).rev() {
                r[i] = -(i + 1..n).map(|m| lu[[m, i]] * r[m]).sum::<f64>();
            }
            for i in 0..n {
                for j in 0..n {
                    self[[cols[i], rows[j]]] = sign * leading * x[i] * r[j];
                }
            }
            return Ok(0.);
        }

        let det_u = leading * lu[[n - 1, n - 1]];
        let mut y = vec![0.; n];
        let mut x = vec![0.; n];
        for j in 0..n {
            for i in 0..n {
                let unit = if i == j { 1. } else { 0. };
                let s: f64 = (0..i).map(|m| lu[[i, m]] * y[m]).sum();
                y[i] = unit - s;
            }
            for i in (0..n).rev() {
                let s: f64 = (i + 1..n).map(|m| lu[[i, m]] * x[m]).sum();
                x[i] = (y[i] - s) / lu[[i, i]];
            }
            for i in 0..n {
                self[[cols[i], rows[j]]] = sign * det_u * x[i];
            }
        }

        Ok(sign * det_u)
    }

    fn solve(&self, b: &Vector) -> Result<Vector, LinalgError> {
        let n = square_dim(self)?;
        if b.len() != n {
            return Err(LinalgError::DimensionMismatch {
                expected: n,
                found: b.len(),
            });
        }

        let mut lu = self.clone();
        let mut x = b.clone();
        for k in 0..n {
            let p = (k..n)
                .max_by(|&i, &j| lu[[i, k]].abs().total_cmp(&lu[[j, k]].abs()))
                .unwrap_or(k);
            if !(lu[[p, k]].abs() >= f64::MIN_POSITIVE) {
                return Err(LinalgError::Singular);
            }
            if p != k {
                for j in 0..n {
                    lu.swap([p, j], [k, j]);
                }
                x.swap(p, k);
            }
            let pivot = lu[[k, k]];
            for i in k + 1..n {
                let l = lu[[i, k]] / pivot;
                lu[[i, k]] = l;
                for j in k + 1..n {
                    lu[[i, j]] -= l * lu[[k, j]];
                }
                x[i] -= l * x[k];
            }
        }
        for i in (0..n).rev() {
            let s: f64 = (i + 1..n).map(|m| lu[[i, m]] * x[m]).sum();
            x[i] = (x[i] - s) / lu[[i, i]];
        }

        Ok(x)
    }
}
