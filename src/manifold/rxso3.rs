//! RxSO(3) - Rotation and uniform scale in 3D
//!
//! RxSO(3) is the direct product ℝ₊ × SO(3): the upper-left block `sR` of a
//! similarity transform. Its tangent space is so(3) ⊕ ℝ, written as (ω, σ) with
//! σ = log(s), and exp/log factor into the SO(3) maps and the scalar exp/ln.
//!
//! Sim(3) uses this type to keep rotation and scale together so that scale is
//! applied exactly once whenever two similarity elements are composed.

use crate::manifold::so3::{SO3Tangent, SO3};
use crate::manifold::{LieGroup, Tangent};
use nalgebra::{Matrix3, Vector3};
use std::{
    fmt,
    fmt::{Display, Formatter},
    ops::Mul,
};

/// Rotation combined with a strictly positive scale factor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RxSO3 {
    rotation: SO3,
    scale: f64,
}

impl Display for RxSO3 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RxSO3(rotation: {}, scale: {:.4})",
            self.rotation, self.scale
        )
    }
}

impl RxSO3 {
    /// Create a new element.
    ///
    /// # Panics
    /// If `scale` is not strictly positive and finite.
    pub fn new(rotation: SO3, scale: f64) -> Self {
        assert!(scale > 0.0 && scale.is_finite(), "Scale must be positive");
        RxSO3 { rotation, scale }
    }

    pub fn identity() -> Self {
        RxSO3 {
            rotation: SO3::identity(),
            scale: 1.0,
        }
    }

    pub fn rotation(&self) -> SO3 {
        self.rotation
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// The 3×3 matrix `sR`.
    pub fn matrix(&self) -> Matrix3<f64> {
        self.scale * self.rotation.rotation_matrix()
    }

    /// (sR)⁻¹ = (1/s) Rᵀ
    pub fn inverse(&self) -> Self {
        RxSO3 {
            rotation: self.rotation.inverse(None),
            scale: 1.0 / self.scale,
        }
    }

    /// Exponential map: R = Exp(ω), s = e^σ.
    pub fn exp(omega: &Vector3<f64>, sigma: f64) -> Self {
        RxSO3::new(SO3Tangent::new(*omega).exp(), sigma.exp())
    }

    /// Logarithmic map returning (ω, σ).
    pub fn log(&self) -> (Vector3<f64>, f64) {
        (self.rotation.log().axis_angle(), self.scale.ln())
    }

    /// Apply `sR` to a vector.
    pub fn act(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.scale * self.rotation.act(vector)
    }

    /// Apply `(sR)⁻¹` to a vector.
    pub fn inverse_act(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.unrotate(vector) / self.scale
    }

    pub fn equals(&self, other: &RxSO3, tolerance: f64) -> bool {
        self.rotation.equals(&other.rotation, tolerance)
            && (self.scale - other.scale).abs() < tolerance
    }
}

impl Mul for RxSO3 {
    type Output = RxSO3;

    fn mul(self, rhs: RxSO3) -> RxSO3 {
        RxSO3 {
            rotation: self.rotation.compose(&rhs.rotation, None, None),
            scale: self.scale * rhs.scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    #[test]
    fn test_rxso3_exp_log() {
        let omega = Vector3::new(0.2, -0.1, 0.4);
        let sigma = -0.7;

        let element = RxSO3::exp(&omega, sigma);
        assert!((element.scale() - sigma.exp()).abs() < TOLERANCE);

        let (omega_back, sigma_back) = element.log();
        assert!((omega_back - omega).norm() < TOLERANCE);
        assert!((sigma_back - sigma).abs() < TOLERANCE);
    }

    #[test]
    fn test_rxso3_compose_and_inverse() {
        let a = RxSO3::new(SO3::rodrigues(0.3, 0.0, 0.0), 2.0);
        let b = RxSO3::new(SO3::rodrigues(0.0, 0.5, 0.1), 0.25);

        let ab = a * b;
        assert!((ab.scale() - 0.5).abs() < TOLERANCE);
        assert!((ab.matrix() - a.matrix() * b.matrix()).norm() < TOLERANCE);

        assert!((a * a.inverse()).equals(&RxSO3::identity(), TOLERANCE));
    }

    #[test]
    fn test_rxso3_act_roundtrip() {
        let element = RxSO3::new(SO3::rodrigues(0.1, 0.2, 0.3), 3.0);
        let v = Vector3::new(1.0, -2.0, 0.5);
        assert!((element.act(&v) - element.matrix() * v).norm() < TOLERANCE);
        assert!((element.inverse_act(&element.act(&v)) - v).norm() < TOLERANCE);
    }

    #[test]
    #[should_panic(expected = "Scale must be positive")]
    fn test_rxso3_rejects_zero_scale() {
        let _ = RxSO3::new(SO3::identity(), 0.0);
    }

    #[test]
    #[should_panic(expected = "Scale must be positive")]
    fn test_rxso3_rejects_nan_scale() {
        let _ = RxSO3::new(SO3::identity(), f64::NAN);
    }
}
