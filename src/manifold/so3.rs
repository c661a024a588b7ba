//! SO(3) - Special Orthogonal Group in 3D
//!
//! This module implements the Special Orthogonal group SO(3), which represents
//! rotations in 3D space. It is the rotation collaborator of the similarity
//! pose: axis-angle ("rodrigues") construction, matrix round trip, exp/log and
//! element-wise comparison all live here.
//!
//! SO(3) elements are represented using nalgebra's UnitQuaternion internally.
//! SO(3) tangent elements are represented as axis-angle vectors in R³,
//! where the direction gives the axis of rotation and the magnitude gives the angle.
//!
//! The logarithm is total: it goes through `atan2` on the quaternion and always
//! returns an angle in [0, π]. At exactly π the axis sign is arbitrary, which is
//! the only singular configuration of the chart.

use crate::manifold::{
    skew, Chart, CoordinatesMode, LieGroup, ManifoldError, ManifoldResult, Tangent,
};
use nalgebra::{Matrix3, Quaternion, Rotation3, Unit, UnitQuaternion, Vector3};
use std::{
    fmt,
    fmt::{Display, Formatter},
};
use tracing::warn;

/// SO(3) group element representing rotations in 3D.
///
/// Internally represented using nalgebra's UnitQuaternion<f64> for efficient rotations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SO3 {
    /// Internal representation as a unit quaternion
    quaternion: UnitQuaternion<f64>,
}

impl Display for SO3 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let r = self.rotation_matrix();
        write!(
            f,
            "[{:.4}, {:.4}, {:.4}; {:.4}, {:.4}, {:.4}; {:.4}, {:.4}, {:.4}]",
            r[(0, 0)],
            r[(0, 1)],
            r[(0, 2)],
            r[(1, 0)],
            r[(1, 1)],
            r[(1, 2)],
            r[(2, 0)],
            r[(2, 1)],
            r[(2, 2)]
        )
    }
}

/// SO(3) tangent space element representing elements in the Lie algebra so(3).
///
/// Internally represented as axis-angle vectors in R³ where:
/// - Direction: axis of rotation (unit vector)
/// - Magnitude: angle of rotation (radians)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SO3Tangent {
    /// Internal data: axis-angle vector [θx, θy, θz]
    data: Vector3<f64>,
}

impl Display for SO3Tangent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "so3(axis-angle: [{:.4}, {:.4}, {:.4}])",
            self.data.x, self.data.y, self.data.z
        )
    }
}

impl SO3 {
    /// Create a new SO(3) element from a unit quaternion.
    pub fn new(quaternion: UnitQuaternion<f64>) -> Self {
        SO3 { quaternion }
    }

    /// Create SO(3) from Euler angles, R = Rz(yaw) · Ry(pitch) · Rx(roll).
    pub fn from_euler_angles(roll: f64, pitch: f64, yaw: f64) -> Self {
        SO3::new(UnitQuaternion::from_euler_angles(roll, pitch, yaw))
    }

    /// Create SO(3) from a unit axis and an angle.
    pub fn from_axis_angle(axis: &Vector3<f64>, angle: f64) -> Self {
        let unit_axis = Unit::new_normalize(*axis);
        SO3::new(UnitQuaternion::from_axis_angle(&unit_axis, angle))
    }

    /// Create SO(3) from a rotation vector (Rodrigues parameters).
    pub fn from_scaled_axis(axis_angle: Vector3<f64>) -> Self {
        SO3Tangent::new(axis_angle).exp()
    }

    /// Rodrigues construction from the three rotation-vector components.
    pub fn rodrigues(wx: f64, wy: f64, wz: f64) -> Self {
        Self::from_scaled_axis(Vector3::new(wx, wy, wz))
    }

    /// Create SO(3) from a 3×3 rotation matrix.
    ///
    /// The matrix is assumed orthonormal; it is not re-orthogonalized.
    pub fn from_rotation_matrix(matrix: &Matrix3<f64>) -> Self {
        let rotation = Rotation3::from_matrix_unchecked(*matrix);
        SO3::new(UnitQuaternion::from_rotation_matrix(&rotation))
    }

    /// Get the quaternion representation.
    pub fn quaternion(&self) -> UnitQuaternion<f64> {
        self.quaternion
    }

    /// Get the rotation matrix (3x3).
    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        self.quaternion.to_rotation_matrix().into_inner()
    }

    /// Rotate a vector.
    pub fn act(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.quaternion * vector
    }

    /// Rotate a vector by the inverse rotation.
    pub fn unrotate(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.quaternion.inverse_transform_vector(vector)
    }

    /// Element-wise comparison of the rotation matrices.
    pub fn equals(&self, other: &SO3, tolerance: f64) -> bool {
        let difference = self.rotation_matrix() - other.rotation_matrix();
        difference.iter().all(|value| value.abs() <= tolerance)
    }
}

impl LieGroup for SO3 {
    type TangentVector = SO3Tangent;
    type JacobianMatrix = Matrix3<f64>;
    type LieAlgebra = Matrix3<f64>;

    const DIM: usize = 3;
    const DOF: usize = 3;
    const REP_SIZE: usize = 4;

    fn identity() -> Self {
        SO3 {
            quaternion: UnitQuaternion::identity(),
        }
    }

    /// SO3 inverse.
    ///
    /// # Notes
    /// R⁻¹ = Rᵀ, J_R⁻¹_R = -Adj(R) = -R
    fn inverse(&self, jacobian: Option<&mut Self::JacobianMatrix>) -> Self {
        if let Some(jac) = jacobian {
            *jac = -self.rotation_matrix();
        }

        SO3 {
            quaternion: self.quaternion.inverse(),
        }
    }

    /// SO3 composition.
    ///
    /// # Notes
    /// J_QR_Q = Adj(R⁻¹) = Rᵀ, J_QR_R = I
    fn compose(
        &self,
        other: &Self,
        jacobian_self: Option<&mut Self::JacobianMatrix>,
        jacobian_other: Option<&mut Self::JacobianMatrix>,
    ) -> Self {
        if let Some(jac_self) = jacobian_self {
            *jac_self = other.rotation_matrix().transpose();
        }

        if let Some(jac_other) = jacobian_other {
            *jac_other = Matrix3::identity();
        }

        SO3 {
            quaternion: self.quaternion * other.quaternion,
        }
    }

    fn between(
        &self,
        other: &Self,
        jacobian_self: Option<&mut Self::JacobianMatrix>,
        jacobian_other: Option<&mut Self::JacobianMatrix>,
    ) -> Self {
        let result = self.inverse(None).compose(other, None, None);

        if let Some(jac_self) = jacobian_self {
            *jac_self = -result.rotation_matrix().transpose();
        }

        if let Some(jac_other) = jacobian_other {
            *jac_other = Matrix3::identity();
        }

        result
    }

    /// Logarithmic map for unit quaternions.
    ///
    /// θu = Log(q) = (2 / ||v||) * v * atan2(||v||, w)
    fn log(&self) -> SO3Tangent {
        let q = self.quaternion.quaternion();
        let sin_angle_squared = q.i * q.i + q.j * q.j + q.k * q.k;

        let log_coeff = if sin_angle_squared > f64::EPSILON {
            let sin_angle = sin_angle_squared.sqrt();
            let cos_angle = q.w;

            // q and -q are the same rotation; pick the representative with w >= 0
            let two_angle = 2.0
                * if cos_angle < 0.0 {
                    f64::atan2(-sin_angle, -cos_angle)
                } else {
                    f64::atan2(sin_angle, cos_angle)
                };

            two_angle / sin_angle
        } else {
            // Small-angle approximation, sign follows w
            2.0 / q.w
        };

        SO3Tangent::new(Vector3::new(q.i * log_coeff, q.j * log_coeff, q.k * log_coeff))
    }

    fn adjoint_map(&self) -> Matrix3<f64> {
        self.rotation_matrix()
    }

    fn random() -> Self {
        SO3::from_scaled_axis(Vector3::new(
            rand::random::<f64>() * 2.0 - 1.0,
            rand::random::<f64>() * 2.0 - 1.0,
            rand::random::<f64>() * 2.0 - 1.0,
        ))
    }

    fn is_valid(&self, tolerance: f64) -> bool {
        let q = self.quaternion.quaternion();
        (q.norm() - 1.0).abs() < tolerance
    }

    fn is_approx(&self, other: &Self, tolerance: f64) -> bool {
        self.equals(other, tolerance)
    }
}

impl Chart for SO3 {
    type TangentVector = SO3Tangent;

    fn retract(&self, tangent: &SO3Tangent, mode: CoordinatesMode) -> ManifoldResult<Self> {
        match mode {
            CoordinatesMode::Expmap => Ok(self.compose(&tangent.exp(), None, None)),
            other => {
                warn!(mode = %other, "unsupported chart mode for SO3 retract");
                Err(ManifoldError::UnsupportedChartMode(other))
            }
        }
    }

    fn local_coordinates(&self, other: &Self, mode: CoordinatesMode) -> ManifoldResult<SO3Tangent> {
        match mode {
            CoordinatesMode::Expmap => Ok(self.between(other, None, None).log()),
            other_mode => {
                warn!(mode = %other_mode, "unsupported chart mode for SO3 local");
                Err(ManifoldError::UnsupportedChartMode(other_mode))
            }
        }
    }
}

impl SO3Tangent {
    /// Create a new SO3Tangent from axis-angle vector.
    pub fn new(axis_angle: Vector3<f64>) -> Self {
        SO3Tangent { data: axis_angle }
    }

    /// Get the axis-angle vector.
    pub fn axis_angle(&self) -> Vector3<f64> {
        self.data
    }

    /// Get the angle of rotation.
    pub fn angle(&self) -> f64 {
        self.data.norm()
    }
}

impl Tangent<SO3> for SO3Tangent {
    /// SO3 exponential map.
    ///
    /// q = Exp(θu) = cos(θ/2) + u sin(θ/2)
    fn exp(&self) -> SO3 {
        let theta_squared = self.data.norm_squared();

        let quaternion = if theta_squared > f64::EPSILON {
            UnitQuaternion::from_scaled_axis(self.data)
        } else {
            UnitQuaternion::from_quaternion(Quaternion::new(
                1.0,
                self.data.x / 2.0,
                self.data.y / 2.0,
                self.data.z / 2.0,
            ))
        };

        SO3 { quaternion }
    }

    /// [θ]ₓ = [0 -θz θy; θz 0 -θx; -θy θx 0]
    fn hat(&self) -> Matrix3<f64> {
        skew(&self.data)
    }

    fn vee(algebra: &Matrix3<f64>) -> Self {
        SO3Tangent::new(Vector3::new(algebra[(2, 1)], algebra[(0, 2)], algebra[(1, 0)]))
    }

    fn lie_bracket(&self, other: &Self) -> Self {
        SO3Tangent::new(self.data.cross(&other.data))
    }

    fn zero() -> Self {
        Self::new(Vector3::zeros())
    }

    fn random() -> Self {
        Self::new(Vector3::new(
            rand::random::<f64>() * 0.2 - 0.1,
            rand::random::<f64>() * 0.2 - 0.1,
            rand::random::<f64>() * 0.2 - 0.1,
        ))
    }

    fn is_zero(&self, tolerance: f64) -> bool {
        self.data.norm() < tolerance
    }
}
