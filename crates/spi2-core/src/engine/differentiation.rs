use super::error::EngineError;
use nalgebra::DMatrix;

/// A vector-valued function of the design vector.
pub type VectorFunction<'a> = dyn Fn(&[f64]) -> Result<Vec<f64>, EngineError> + 'a;

/// Computes Jacobians of vector-valued functions of the design vector.
pub trait Differentiator {
    /// Returns the `m x n` Jacobian of `f` at `x`, where `m` is the output length.
    ///
    /// # Errors
    ///
    /// Propagates errors from `f` and returns [`EngineError::NonFinite`] if any entry is
    /// not finite.
    fn jacobian(&self, f: &VectorFunction<'_>, x: &[f64]) -> Result<DMatrix<f64>, EngineError>;
}

/// Central finite differences with a step relative to each coordinate's magnitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CentralDifference {
    pub relative_step: f64,
}

impl CentralDifference {
    pub fn new(relative_step: f64) -> Self {
        Self { relative_step }
    }
}

impl Differentiator for CentralDifference {
    fn jacobian(&self, f: &VectorFunction<'_>, x: &[f64]) -> Result<DMatrix<f64>, EngineError> {
        let mut shifted = x.to_vec();
        let mut jacobian: Option<DMatrix<f64>> = None;

        for (column, &xi) in x.iter().enumerate() {
            let h = self.relative_step * xi.abs().max(1.0);
            shifted[column] = xi + h;
            let forward = f(&shifted)?;
            shifted[column] = xi - h;
            let backward = f(&shifted)?;
            shifted[column] = xi;

            let jac = jacobian.get_or_insert_with(|| DMatrix::zeros(forward.len(), x.len()));
            for (row, (fp, fm)) in forward.iter().zip(&backward).enumerate() {
                jac[(row, column)] = (fp - fm) / (2.0 * h);
            }
        }

        let jacobian = match jacobian {
            Some(j) => j,
            None => DMatrix::zeros(f(x)?.len(), 0),
        };
        if jacobian.iter().any(|v| !v.is_finite()) {
            return Err(EngineError::NonFinite {
                what: "jacobian entry".to_string(),
                iteration: 0,
            });
        }
        Ok(jacobian)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-6;

    #[test]
    fn jacobian_of_smooth_function_matches_analytic() {
        let f = |x: &[f64]| -> Result<Vec<f64>, EngineError> {
            Ok(vec![x[0] * x[0] + 3.0 * x[1], x[0].sin() * x[1]])
        };
        let x = [1.5, -2.0];
        let j = CentralDifference::new(1e-6).jacobian(&f, &x).unwrap();
        assert_eq!(j.shape(), (2, 2));
        assert!((j[(0, 0)] - 3.0).abs() < TOLERANCE);
        assert!((j[(0, 1)] - 3.0).abs() < TOLERANCE);
        assert!((j[(1, 0)] - 1.5_f64.cos() * -2.0).abs() < TOLERANCE);
        assert!((j[(1, 1)] - 1.5_f64.sin()).abs() < TOLERANCE);
    }

    #[test]
    fn empty_input_gives_empty_columns() {
        let f = |_: &[f64]| -> Result<Vec<f64>, EngineError> { Ok(vec![1.0, 2.0]) };
        let j = CentralDifference::new(1e-6).jacobian(&f, &[]).unwrap();
        assert_eq!(j.shape(), (2, 0));
    }

    #[test]
    fn non_finite_entries_are_fatal() {
        let f = |x: &[f64]| -> Result<Vec<f64>, EngineError> {
            Ok(vec![if x[0] > 0.0 { f64::INFINITY } else { 0.0 }])
        };
        let err = CentralDifference::new(1e-6).jacobian(&f, &[0.0]).unwrap_err();
        assert!(matches!(err, EngineError::NonFinite { .. }));
    }

    #[test]
    fn function_errors_propagate() {
        let f = |_: &[f64]| -> Result<Vec<f64>, EngineError> {
            Err(EngineError::Solver("boom".to_string()))
        };
        assert!(matches!(
            CentralDifference::new(1e-6).jacobian(&f, &[1.0]),
            Err(EngineError::Solver(_))
        ));
    }
}
