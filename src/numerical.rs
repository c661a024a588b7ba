//! Central-difference derivatives on manifolds.
//!
//! Used to verify the analytic Jacobians of the pose type. Inputs are
//! perturbed through their retraction and outputs are compared in the local
//! coordinates of the unperturbed output, so a numerical Jacobian has the same
//! meaning as the analytic one under the right perturbation model:
//!
//! ```text
//! J[:, j] = (local(y₀, f(x ⊕ h eⱼ)) - local(y₀, f(x ⊕ -h eⱼ))) / 2h
//! ```
//!
//! # Example
//!
//! ```rust
//! use apex_sim3::numerical::NumericalDerivative;
//! use apex_sim3::geometry::ScaledPose3;
//! use apex_sim3::manifold::LieGroup;
//! use nalgebra::Vector3;
//!
//! let pose = ScaledPose3::random();
//! let point = Vector3::new(1.0, 2.0, 3.0);
//! let jacobian = NumericalDerivative::new()
//!     .first(|p: &ScaledPose3, x: &Vector3<f64>| p.transform_from(x, None, None), &pose, &point)
//!     .unwrap();
//! assert_eq!(jacobian.shape(), (3, 7));
//! ```

use crate::error::{PoseError, PoseResult};
use crate::geometry::ScaledPose3;
use crate::manifold::sim3::Sim3Tangent;
use crate::manifold::so3::{SO3Tangent, SO3};
use crate::manifold::{Chart, CoordinatesMode, Tangent};
use nalgebra::{DMatrix, DVector, Vector3};
use tracing::{debug, trace, warn};

/// Default finite-difference step.
pub const DEFAULT_DELTA: f64 = 1e-5;

/// Values that can be perturbed along tangent directions and compared in
/// local coordinates.
pub trait Perturbable: Clone {
    /// Dimension of the tangent space
    const DOF: usize;

    /// Move along `delta` (length `DOF`).
    fn perturbed(&self, delta: &DVector<f64>) -> PoseResult<Self>;

    /// Tangent vector taking `self` to `other`.
    fn offset_to(&self, other: &Self) -> PoseResult<DVector<f64>>;
}

fn ensure_dimension(expected: usize, delta: &DVector<f64>) -> PoseResult<()> {
    if delta.len() != expected {
        return Err(PoseError::InvalidInput(format!(
            "perturbation has dimension {}, expected {expected}",
            delta.len()
        )));
    }
    Ok(())
}

impl Perturbable for f64 {
    const DOF: usize = 1;

    fn perturbed(&self, delta: &DVector<f64>) -> PoseResult<Self> {
        ensure_dimension(Self::DOF, delta)?;
        Ok(self + delta[0])
    }

    fn offset_to(&self, other: &Self) -> PoseResult<DVector<f64>> {
        Ok(DVector::from_element(1, other - self))
    }
}

impl Perturbable for Vector3<f64> {
    const DOF: usize = 3;

    fn perturbed(&self, delta: &DVector<f64>) -> PoseResult<Self> {
        ensure_dimension(Self::DOF, delta)?;
        Ok(self + Vector3::new(delta[0], delta[1], delta[2]))
    }

    fn offset_to(&self, other: &Self) -> PoseResult<DVector<f64>> {
        Ok(DVector::from_column_slice((other - self).as_slice()))
    }
}

impl Perturbable for Sim3Tangent {
    const DOF: usize = 7;

    fn perturbed(&self, delta: &DVector<f64>) -> PoseResult<Self> {
        let step = Sim3Tangent::try_from(delta)?;
        Ok(Sim3Tangent::from_vector(self.coeffs() + step.coeffs()))
    }

    fn offset_to(&self, other: &Self) -> PoseResult<DVector<f64>> {
        Ok(DVector::from(Sim3Tangent::from_vector(other.coeffs() - self.coeffs())))
    }
}

impl Perturbable for SO3 {
    const DOF: usize = 3;

    fn perturbed(&self, delta: &DVector<f64>) -> PoseResult<Self> {
        ensure_dimension(<Self as Perturbable>::DOF, delta)?;
        let step = SO3Tangent::new(Vector3::new(delta[0], delta[1], delta[2]));
        Ok(self.retract(&step, CoordinatesMode::Expmap)?)
    }

    fn offset_to(&self, other: &Self) -> PoseResult<DVector<f64>> {
        let tangent = self.local_coordinates(other, CoordinatesMode::Expmap)?;
        Ok(DVector::from_column_slice(tangent.axis_angle().as_slice()))
    }
}

impl Perturbable for ScaledPose3 {
    const DOF: usize = 7;

    fn perturbed(&self, delta: &DVector<f64>) -> PoseResult<Self> {
        let step = Sim3Tangent::try_from(delta)?;
        Ok(self.retract(&step, CoordinatesMode::Expmap)?)
    }

    fn offset_to(&self, other: &Self) -> PoseResult<DVector<f64>> {
        let tangent = self.local_coordinates(other, CoordinatesMode::Expmap)?;
        Ok(DVector::from(tangent))
    }
}

/// Central-difference differentiator.
///
/// # Example
/// ```rust
/// use apex_sim3::numerical::NumericalDerivative;
///
/// let differentiator = NumericalDerivative::new().with_delta(1e-6);
/// assert_eq!(differentiator.delta(), 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericalDerivative {
    delta: f64,
}

impl Default for NumericalDerivative {
    fn default() -> Self {
        Self {
            delta: DEFAULT_DELTA,
        }
    }
}

impl NumericalDerivative {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the finite-difference step.
    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Jacobian of a single-argument function.
    ///
    /// # Errors
    /// `InvalidInput` for a non-positive step, `Computation` when a column
    /// comes out NaN or infinite, and any error raised while retracting the
    /// input or taking local coordinates of the output.
    pub fn unary<X, Y, F>(&self, f: F, x: &X) -> PoseResult<DMatrix<f64>>
    where
        X: Perturbable,
        Y: Perturbable,
        F: Fn(&X) -> Y,
    {
        if !(self.delta > 0.0 && self.delta.is_finite()) {
            return Err(PoseError::InvalidInput(format!(
                "finite-difference step must be positive, got {}",
                self.delta
            )));
        }

        debug!(
            rows = Y::DOF,
            cols = X::DOF,
            delta = self.delta,
            "computing central-difference Jacobian"
        );

        let y0 = f(x);
        let mut jacobian = DMatrix::zeros(Y::DOF, X::DOF);

        for j in 0..X::DOF {
            let mut step = DVector::zeros(X::DOF);
            step[j] = self.delta;

            let forward = y0.offset_to(&f(&x.perturbed(&step)?))?;
            let backward = y0.offset_to(&f(&x.perturbed(&-step)?))?;
            let column = (forward - backward) / (2.0 * self.delta);
            if column.iter().any(|value| !value.is_finite()) {
                warn!(column = j, "finite-difference column is not finite");
                return Err(PoseError::Computation(format!(
                    "finite-difference column {j} is not finite"
                )));
            }

            trace!(column = j, norm = column.norm(), "finite-difference column");
            jacobian.set_column(j, &column);
        }

        Ok(jacobian)
    }

    /// Jacobian of a two-argument function with respect to the first argument.
    pub fn first<X1, X2, Y, F>(&self, f: F, x1: &X1, x2: &X2) -> PoseResult<DMatrix<f64>>
    where
        X1: Perturbable,
        Y: Perturbable,
        F: Fn(&X1, &X2) -> Y,
    {
        self.unary(|x: &X1| f(x, x2), x1)
    }

    /// Jacobian of a two-argument function with respect to the second argument.
    pub fn second<X1, X2, Y, F>(&self, f: F, x1: &X1, x2: &X2) -> PoseResult<DMatrix<f64>>
    where
        X2: Perturbable,
        Y: Perturbable,
        F: Fn(&X1, &X2) -> Y,
    {
        self.unary(|x: &X2| f(x1, x), x2)
    }
}

/// Random tangent vector, convenient for randomized Jacobian checks.
pub fn random_tangent() -> Sim3Tangent {
    <Sim3Tangent as Tangent<ScaledPose3>>::random()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifold::LieGroup;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_scalar_derivative() -> TestResult {
        let jacobian = NumericalDerivative::new().unary(|x: &f64| x * x * x, &2.0)?;
        assert_eq!(jacobian.shape(), (1, 1));
        assert!((jacobian[(0, 0)] - 12.0).abs() < 1e-8);
        Ok(())
    }

    #[test]
    fn test_linear_map_derivative() -> TestResult {
        let matrix = nalgebra::Matrix3::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 10.0);
        let jacobian =
            NumericalDerivative::new().unary(|x: &Vector3<f64>| matrix * x, &Vector3::zeros())?;
        for i in 0..3 {
            for j in 0..3 {
                assert!((jacobian[(i, j)] - matrix[(i, j)]).abs() < 1e-9);
            }
        }
        Ok(())
    }

    #[test]
    fn test_so3_inverse_derivative() -> TestResult {
        let rotation = SO3::rodrigues(0.3, -0.2, 0.5);
        let jacobian = NumericalDerivative::new().unary(|r: &SO3| r.inverse(None), &rotation)?;

        let mut analytic = nalgebra::Matrix3::zeros();
        rotation.inverse(Some(&mut analytic));
        for i in 0..3 {
            for j in 0..3 {
                assert!((jacobian[(i, j)] - analytic[(i, j)]).abs() < 1e-8);
            }
        }
        Ok(())
    }

    #[test]
    fn test_rejects_invalid_step() {
        for delta in [0.0, -1e-5, f64::NAN] {
            let result = NumericalDerivative::new()
                .with_delta(delta)
                .unary(|x: &f64| *x, &1.0);
            assert!(matches!(result, Err(PoseError::InvalidInput(_))));
        }
    }

    #[test]
    fn test_dimension_mismatch_is_reported() {
        let result = 1.0f64.perturbed(&DVector::zeros(2));
        assert!(matches!(result, Err(PoseError::InvalidInput(_))));

        let result = ScaledPose3::identity().perturbed(&DVector::zeros(6));
        match result {
            Err(PoseError::Manifold(msg)) => assert!(msg.contains("expected 7, got 6")),
            other => panic!("Expected manifold error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_finite_column_is_reported() -> TestResult {
        let result = NumericalDerivative::new().unary(|x: &f64| x.sqrt(), &-1.0);
        assert!(matches!(result, Err(PoseError::Computation(_))));

        let jacobian = NumericalDerivative::new().unary(|x: &f64| x.sqrt(), &4.0)?;
        assert!((jacobian[(0, 0)] - 0.25).abs() < 1e-8);
        Ok(())
    }
}
