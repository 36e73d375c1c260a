use ndarray::{ArrayBase, Data, Ix1, prelude::*};

pub type Vector = Array1<f64>;

pub trait VectorExt {
    fn norm(&self) -> f64;

    /// Squared euclidean norm.
    fn norm2(&self) -> f64;

    /// Largest absolute entry. `NaN` entries propagate.
    fn max_abs(&self) -> f64;

    fn all_finite(&self) -> bool;
}

impl<S> VectorExt for ArrayBase<S, Ix1>
where
    S: Data<Elem = f64>,
{
    fn norm(&self) -> f64 {
        self.norm2().sqrt()
    }

    fn norm2(&self) -> f64 {
        self.dot(self)
    }

    fn max_abs(&self) -> f64 {
        max_abs(self.iter())
    }

    fn all_finite(&self) -> bool {
        self.iter().all(|x| x.is_finite())
    }
}

pub(crate) fn max_abs<'a>(values: impl Iterator<Item = &'a f64>) -> f64 {
    values.fold(0., |m, x| {
        if x.is_nan() || x.abs() > m {
            x.abs()
        } else {
            m
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn norms() {
        let v = array![3., -4.];
        assert_abs_diff_eq!(v.norm(), 5.);
        assert_abs_diff_eq!(v.norm2(), 25.);
        assert_abs_diff_eq!(v.max_abs(), 4.);
        assert_abs_diff_eq!(v.slice(s![..1]).norm(), 3.);
    }

    #[test]
    fn nan_is_never_small() {
        let v = array![1., f64::NAN, 0.];
        assert!(v.max_abs().is_nan());
        assert!(!(v.max_abs() < 1e-12));
        assert!(!v.all_finite());
        assert!(array![1., 2.].all_finite());
    }
}
