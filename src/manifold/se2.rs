//! SE(2) - Special Euclidean Group in 2D
//!
//! Rigid body transformations in the plane, represented as a translation
//! [x, y] and a rotation stored as a unit complex number.
//!
//! Only the operations needed to embed a planar pose into a 3D similarity
//! transform are provided here: construction, accessors, composition and
//! inverse.

use nalgebra::{Matrix3, UnitComplex, Vector2};
use std::{fmt, ops::Mul};

/// SE(2) group element representing rigid body transformations in 2D.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SE2 {
    /// Translation part as 2D column vector
    translation: Vector2<f64>,
    /// Rotation part as a unit complex number
    rotation: UnitComplex<f64>,
}

impl fmt::Display for SE2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SE2(translation: [{:.4}, {:.4}], rotation: {:.4})",
            self.translation.x,
            self.translation.y,
            self.angle()
        )
    }
}

impl SE2 {
    /// Get the identity element of the group.
    pub fn identity() -> Self {
        SE2 {
            translation: Vector2::zeros(),
            rotation: UnitComplex::identity(),
        }
    }

    /// Create SE2 from translation components and angle.
    ///
    /// # Arguments
    /// * `x` - Translation in x
    /// * `y` - Translation in y
    /// * `theta` - Rotation angle in radians
    pub fn from_xy_angle(x: f64, y: f64, theta: f64) -> Self {
        SE2 {
            translation: Vector2::new(x, y),
            rotation: UnitComplex::new(theta),
        }
    }

    pub fn x(&self) -> f64 {
        self.translation.x
    }

    pub fn y(&self) -> f64 {
        self.translation.y
    }

    /// Rotation angle in (-π, π].
    pub fn angle(&self) -> f64 {
        self.rotation.angle()
    }

    pub fn translation(&self) -> Vector2<f64> {
        self.translation
    }

    /// Get the 3x3 homogeneous transformation matrix.
    pub fn matrix(&self) -> Matrix3<f64> {
        let rotation = self.rotation.to_rotation_matrix().into_inner();
        let t = self.translation;
        let mut mat = Matrix3::identity();
        mat.fixed_view_mut::<2, 2>(0, 0).copy_from(&rotation);
        mat.fixed_view_mut::<2, 1>(0, 2).copy_from(&t);
        mat
    }

    /// (R1 R2, R1 t2 + t1)
    pub fn compose(&self, other: &SE2) -> SE2 {
        SE2 {
            translation: self.rotation * other.translation + self.translation,
            rotation: self.rotation * other.rotation,
        }
    }

    /// (Rᵀ, -Rᵀ t)
    pub fn inverse(&self) -> SE2 {
        let rotation_inv = self.rotation.inverse();
        SE2 {
            translation: -(rotation_inv * self.translation),
            rotation: rotation_inv,
        }
    }
}

impl Mul for SE2 {
    type Output = SE2;

    fn mul(self, rhs: SE2) -> SE2 {
        self.compose(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const TOLERANCE: f64 = 1e-12;

    #[test]
    fn test_se2_accessors() {
        let pose = SE2::from_xy_angle(1.0, 2.0, 3.0);
        assert_eq!(pose.x(), 1.0);
        assert_eq!(pose.y(), 2.0);
        assert!((pose.angle() - 3.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_se2_compose_matches_matrix_product() {
        let a = SE2::from_xy_angle(1.0, 2.0, FRAC_PI_2);
        let b = SE2::from_xy_angle(-0.5, 0.3, -0.4);
        assert!(((a * b).matrix() - a.matrix() * b.matrix()).norm() < TOLERANCE);

        let identity = a * a.inverse();
        assert!((identity.matrix() - Matrix3::identity()).norm() < TOLERANCE);
    }

    #[test]
    fn test_se2_display() {
        let pose = SE2::from_xy_angle(1.0, 2.0, 0.5);
        assert_eq!(
            pose.to_string(),
            "SE2(translation: [1.0000, 2.0000], rotation: 0.5000)"
        );
    }
}
