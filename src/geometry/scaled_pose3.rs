//! Scaled 3D pose: a 7-DOF similarity transform used as an estimation variable.
//!
//! `ScaledPose3` wraps a [`Sim3`] element and adds everything an optimizer
//! needs from a pose variable:
//! - group operations with analytic Jacobians ([`LieGroup`])
//! - retraction and local coordinates ([`Chart`])
//! - point and pose transforms, and range measurements, with Jacobians
//!   with respect to both the pose and the operand
//!
//! All Jacobians use the right perturbation model `p ∘ Exp(δ)` with the
//! tangent ordered as [ρ(3), ω(3), σ(1)].
//!
//! ```text
//! transform_from:  y = s R x + t      ∂y/∂p = [sR, -sR[x]×, sRx],  ∂y/∂x = sR
//! transform_to:    q = Rᵀ(x - t)/s    ∂q/∂p = [-I, [q]×, -q],     ∂q/∂x = Rᵀ/s
//! range:           r = ‖q‖            ∂r/∂· = (q/r)ᵀ ∂q/∂·
//! ```

use crate::manifold::rxso3::RxSO3;
use crate::manifold::se2::SE2;
use crate::manifold::sim3::{Sim3, Sim3Tangent};
use crate::manifold::so3::SO3;
use crate::manifold::{
    skew, Chart, CoordinatesMode, LieGroup, ManifoldError, ManifoldResult, Matrix3x7, Matrix7,
    RowVector7, Tangent, Vector7,
};
use nalgebra::{Matrix3, Matrix4, RowVector3, Vector3};
use rand::Rng;
use std::{
    fmt,
    fmt::{Display, Formatter},
    ops::Mul,
};
use tracing::warn;

/// 3D pose with rotation, translation and a strictly positive uniform scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaledPose3 {
    sim3: Sim3,
}

/// Prints the rotation, the scale and the translation on three lines.
impl Display for ScaledPose3 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let t = self.translation();
        writeln!(f, "{}", self.rotation())?;
        writeln!(f, "{}", self.scale())?;
        write!(f, "[{}, {}, {}]", t.x, t.y, t.z)
    }
}

impl ScaledPose3 {
    /// Create a pose from rotation, translation and scale.
    ///
    /// # Panics
    /// If `scale` is not strictly positive and finite. Use
    /// [`ScaledPose3::try_new`] for unchecked input.
    pub fn new(rotation: SO3, translation: Vector3<f64>, scale: f64) -> Self {
        ScaledPose3 {
            sim3: Sim3::new(rotation, translation, scale),
        }
    }

    /// Fallible constructor rejecting non-positive or non-finite scales.
    pub fn try_new(rotation: SO3, translation: Vector3<f64>, scale: f64) -> ManifoldResult<Self> {
        if !(scale > 0.0 && scale.is_finite()) {
            return Err(ManifoldError::InvalidElement(format!(
                "scale must be positive and finite, got {scale}"
            )));
        }
        Ok(Self::new(rotation, translation, scale))
    }

    /// Rigid pose with unit scale.
    pub fn from_rotation_translation(rotation: SO3, translation: Vector3<f64>) -> Self {
        Self::new(rotation, translation, 1.0)
    }

    pub fn from_sim3(sim3: Sim3) -> Self {
        ScaledPose3 { sim3 }
    }

    pub fn sim3(&self) -> Sim3 {
        self.sim3
    }

    pub fn rxso3(&self) -> RxSO3 {
        self.sim3.rxso3()
    }

    pub fn rotation(&self) -> SO3 {
        self.sim3.rotation()
    }

    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        self.sim3.rotation_matrix()
    }

    pub fn scale(&self) -> f64 {
        self.sim3.scale()
    }

    pub fn translation(&self) -> Vector3<f64> {
        self.sim3.translation()
    }

    /// 4×4 homogeneous matrix `[sR t; 0 1]`.
    pub fn matrix(&self) -> Matrix4<f64> {
        self.sim3.matrix()
    }

    /// Exponential map from the tangent space at the identity.
    pub fn expmap(tangent: &Sim3Tangent) -> Self {
        ScaledPose3 {
            sim3: Sim3::exp(tangent),
        }
    }

    /// Logarithmic map, the inverse of [`ScaledPose3::expmap`] on the
    /// principal branch.
    pub fn logmap(&self) -> Sim3Tangent {
        self.sim3.log()
    }

    /// Transport a tangent vector by this pose: `Ad(p) ξ`.
    ///
    /// Satisfies `p ∘ Exp(ξ) ∘ p⁻¹ = Exp(Ad(p) ξ)`.
    pub fn adjoint_act(&self, tangent: &Sim3Tangent) -> Sim3Tangent {
        Sim3Tangent::from_vector(self.adjoint_map() * tangent.coeffs())
    }

    /// Map a point from the local frame to the world frame: `s R x + t`.
    ///
    /// # Arguments
    /// * `point` - Point in the local frame
    /// * `jacobian_pose` - Optional 3×7 Jacobian with respect to the pose
    /// * `jacobian_point` - Optional 3×3 Jacobian with respect to the point
    pub fn transform_from(
        &self,
        point: &Vector3<f64>,
        jacobian_pose: Option<&mut Matrix3x7<f64>>,
        jacobian_point: Option<&mut Matrix3<f64>>,
    ) -> Vector3<f64> {
        let scaled_rotation = self.rxso3().matrix();

        if let Some(jac_pose) = jacobian_pose {
            jac_pose
                .fixed_view_mut::<3, 3>(0, 0)
                .copy_from(&scaled_rotation);
            jac_pose
                .fixed_view_mut::<3, 3>(0, 3)
                .copy_from(&(scaled_rotation * skew(&(-point))));
            jac_pose
                .fixed_view_mut::<3, 1>(0, 6)
                .copy_from(&(scaled_rotation * point));
        }

        if let Some(jac_point) = jacobian_point {
            *jac_point = scaled_rotation;
        }

        self.sim3.act(point)
    }

    /// Map a point from the world frame into the local frame: `Rᵀ (x - t) / s`.
    ///
    /// # Arguments
    /// * `point` - Point in the world frame
    /// * `jacobian_pose` - Optional 3×7 Jacobian with respect to the pose
    /// * `jacobian_point` - Optional 3×3 Jacobian with respect to the point
    pub fn transform_to(
        &self,
        point: &Vector3<f64>,
        jacobian_pose: Option<&mut Matrix3x7<f64>>,
        jacobian_point: Option<&mut Matrix3<f64>>,
    ) -> Vector3<f64> {
        let local = self.sim3.inverse_act(point);

        if let Some(jac_pose) = jacobian_pose {
            jac_pose
                .fixed_view_mut::<3, 3>(0, 0)
                .copy_from(&(-Matrix3::identity()));
            jac_pose
                .fixed_view_mut::<3, 3>(0, 3)
                .copy_from(&skew(&local));
            jac_pose.fixed_view_mut::<3, 1>(0, 6).copy_from(&(-local));
        }

        if let Some(jac_point) = jacobian_point {
            *jac_point = self.rotation_matrix().transpose() / self.scale();
        }

        local
    }

    /// This pose expressed in the coordinates of `frame`: `frame⁻¹ ∘ self`.
    pub fn transform_pose_to(&self, frame: &ScaledPose3) -> ScaledPose3 {
        ScaledPose3 {
            sim3: frame.sim3.inverse().compose(&self.sim3),
        }
    }

    /// Distance from the pose origin to a world point, measured in the
    /// pose's scaled frame: `‖transform_to(x)‖`.
    ///
    /// # Notes
    /// When `point` coincides with the pose origin the distance is 0 and any
    /// requested Jacobian is filled with NaN, since the direction q/‖q‖ is
    /// undefined there. Callers building range factors should keep landmarks
    /// away from the sensor origin.
    pub fn range(
        &self,
        point: &Vector3<f64>,
        jacobian_pose: Option<&mut RowVector7<f64>>,
        jacobian_point: Option<&mut RowVector3<f64>>,
    ) -> f64 {
        if jacobian_pose.is_none() && jacobian_point.is_none() {
            return self.sim3.inverse_act(point).norm();
        }

        let mut pose_jac = Matrix3x7::zeros();
        let mut point_jac = Matrix3::zeros();
        let local = self.transform_to(point, Some(&mut pose_jac), Some(&mut point_jac));

        let distance = local.norm();
        let direction = local.transpose() / distance;

        if let Some(jac_pose) = jacobian_pose {
            *jac_pose = direction * pose_jac;
        }

        if let Some(jac_point) = jacobian_point {
            *jac_point = direction * point_jac;
        }

        distance
    }

    /// Range to the translation of another pose.
    ///
    /// Perturbing `other` by `Exp(δ)` moves its translation by `s R δ_ρ`, so
    /// only the first three columns of the second Jacobian are non-zero.
    pub fn range_to_pose(
        &self,
        other: &ScaledPose3,
        jacobian_self: Option<&mut RowVector7<f64>>,
        jacobian_other: Option<&mut RowVector7<f64>>,
    ) -> f64 {
        let target = other.translation();

        match jacobian_other {
            None => self.range(&target, jacobian_self, None),
            Some(jac_other) => {
                let mut jac_point = RowVector3::zeros();
                let distance = self.range(&target, jacobian_self, Some(&mut jac_point));

                jac_other.fill(0.0);
                jac_other
                    .fixed_view_mut::<1, 3>(0, 0)
                    .copy_from(&(jac_point * other.rxso3().matrix()));

                distance
            }
        }
    }

    /// Rotation matrices element-wise, translations component-wise and the
    /// scales all agree within `tolerance`.
    pub fn equals(&self, other: &ScaledPose3, tolerance: f64) -> bool {
        self.rotation().equals(&other.rotation(), tolerance)
            && (self.translation() - other.translation())
                .iter()
                .all(|value| value.abs() <= tolerance)
            && (self.scale() - other.scale()).abs() < tolerance
    }
}

impl LieGroup for ScaledPose3 {
    type TangentVector = Sim3Tangent;
    type JacobianMatrix = Matrix7<f64>;
    type LieAlgebra = Matrix4<f64>;

    const DIM: usize = 3;
    const DOF: usize = 7;
    const REP_SIZE: usize = 8;

    fn identity() -> Self {
        ScaledPose3 {
            sim3: Sim3::identity(),
        }
    }

    /// Inverse with `∂(p⁻¹)/∂p = -Ad(p)`.
    fn inverse(&self, jacobian: Option<&mut Self::JacobianMatrix>) -> Self {
        if let Some(jac) = jacobian {
            *jac = -self.adjoint_map();
        }

        ScaledPose3 {
            sim3: self.sim3.inverse(),
        }
    }

    /// Composition with `∂(p₁p₂)/∂p₁ = Ad(p₂⁻¹)` and `∂(p₁p₂)/∂p₂ = I`.
    fn compose(
        &self,
        other: &Self,
        jacobian_self: Option<&mut Self::JacobianMatrix>,
        jacobian_other: Option<&mut Self::JacobianMatrix>,
    ) -> Self {
        if let Some(jac_self) = jacobian_self {
            *jac_self = other.sim3.inverse().adjoint();
        }

        if let Some(jac_other) = jacobian_other {
            *jac_other = Matrix7::identity();
        }

        ScaledPose3 {
            sim3: self.sim3.compose(&other.sim3),
        }
    }

    fn between(
        &self,
        other: &Self,
        jacobian_self: Option<&mut Self::JacobianMatrix>,
        jacobian_other: Option<&mut Self::JacobianMatrix>,
    ) -> Self {
        let result = ScaledPose3 {
            sim3: self.sim3.inverse().compose(&other.sim3),
        };

        if let Some(jac_self) = jacobian_self {
            *jac_self = -result.sim3.inverse().adjoint();
        }

        if let Some(jac_other) = jacobian_other {
            *jac_other = Matrix7::identity();
        }

        result
    }

    fn log(&self) -> Sim3Tangent {
        self.logmap()
    }

    fn adjoint_map(&self) -> Matrix7<f64> {
        self.sim3.adjoint()
    }

    fn random() -> Self {
        let mut rng = rand::rng();

        let translation = Vector3::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
        );
        let scale = rng.random_range(0.5..2.0);

        Self::new(SO3::random(), translation, scale)
    }

    fn is_valid(&self, tolerance: f64) -> bool {
        self.rotation().is_valid(tolerance) && self.scale() > 0.0 && self.scale().is_finite()
    }

    fn is_approx(&self, other: &Self, tolerance: f64) -> bool {
        self.equals(other, tolerance)
    }
}

impl Tangent<ScaledPose3> for Sim3Tangent {
    fn exp(&self) -> ScaledPose3 {
        ScaledPose3::expmap(self)
    }

    fn hat(&self) -> Matrix4<f64> {
        Sim3Tangent::hat(self)
    }

    fn vee(algebra: &Matrix4<f64>) -> Self {
        Sim3Tangent::vee(algebra)
    }

    fn lie_bracket(&self, other: &Self) -> Self {
        Sim3Tangent::lie_bracket(self, other)
    }

    fn zero() -> Self {
        Sim3Tangent::from_vector(Vector7::zeros())
    }

    fn random() -> Self {
        let mut rng = rand::rng();
        Sim3Tangent::new(
            Vector3::new(
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
            ),
            Vector3::new(
                rng.random_range(-0.5..0.5),
                rng.random_range(-0.5..0.5),
                rng.random_range(-0.5..0.5),
            ),
            rng.random_range(-0.5..0.5),
        )
    }

    fn is_zero(&self, tolerance: f64) -> bool {
        self.coeffs().norm() < tolerance
    }
}

impl Chart for ScaledPose3 {
    type TangentVector = Sim3Tangent;

    /// `p ∘ Exp(ξ)`
    fn retract(&self, tangent: &Sim3Tangent, mode: CoordinatesMode) -> ManifoldResult<Self> {
        match mode {
            CoordinatesMode::Expmap => Ok(self.compose(&Self::expmap(tangent), None, None)),
            other => {
                warn!(mode = %other, "unsupported chart mode for retract");
                Err(ManifoldError::UnsupportedChartMode(other))
            }
        }
    }

    /// `Log(p⁻¹ ∘ q)`
    fn local_coordinates(
        &self,
        other: &Self,
        mode: CoordinatesMode,
    ) -> ManifoldResult<Sim3Tangent> {
        match mode {
            CoordinatesMode::Expmap => Ok(self.between(other, None, None).logmap()),
            other_mode => {
                warn!(mode = %other_mode, "unsupported chart mode for local");
                Err(ManifoldError::UnsupportedChartMode(other_mode))
            }
        }
    }
}

impl From<Sim3> for ScaledPose3 {
    fn from(sim3: Sim3) -> Self {
        ScaledPose3::from_sim3(sim3)
    }
}

/// Embeds a planar pose: rotation about z, translation (x, y, 0), unit scale.
impl From<&SE2> for ScaledPose3 {
    fn from(pose: &SE2) -> Self {
        ScaledPose3::from_rotation_translation(
            SO3::rodrigues(0.0, 0.0, pose.angle()),
            Vector3::new(pose.x(), pose.y(), 0.0),
        )
    }
}

impl Mul for ScaledPose3 {
    type Output = ScaledPose3;

    fn mul(self, rhs: ScaledPose3) -> ScaledPose3 {
        self.compose(&rhs, None, None)
    }
}

impl Mul<Vector3<f64>> for ScaledPose3 {
    type Output = Vector3<f64>;

    fn mul(self, rhs: Vector3<f64>) -> Vector3<f64> {
        self.transform_from(&rhs, None, None)
    }
}
