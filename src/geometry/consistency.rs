//! Batch algebraic self-checks for the Sim(3) implementation.
//!
//! Each check runs over a list of cases and returns one [`ConsistencyFailure`]
//! per violated identity; an empty list means every case passed. Failures are
//! also reported through `tracing::warn!` so that they show up in logs when the
//! checks run as part of a larger test or calibration harness.
//!
//! Matrices are stored column-major in the `expected` / `actual` vectors.

use crate::geometry::ScaledPose3;
use crate::manifold::sim3::Sim3Tangent;
use crate::manifold::LieGroup;
use nalgebra::{DVector, Matrix4, Vector3};
use std::fmt;
use tracing::warn;

/// Identity that a consistency check verifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    /// vee(hat(ξ)) = ξ
    HatVee,
    /// [a, b] = vee(hat(a) hat(b) - hat(b) hat(a))
    LieBracket,
    /// Exp(Log(p)) = p
    ExpLog,
    /// p * x = (sR) x + t, read from the homogeneous matrix
    PointAction,
    /// p p⁻¹ = I
    Inverse,
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckKind::HatVee => "hat-vee",
            CheckKind::LieBracket => "lie bracket",
            CheckKind::ExpLog => "exp(log(p))",
            CheckKind::PointAction => "point action",
            CheckKind::Inverse => "inverse",
        };
        write!(f, "{name}")
    }
}

/// One failed case of a consistency check.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsistencyFailure {
    pub kind: CheckKind,
    /// Index of the failing case
    pub case: usize,
    /// Second operand index for pairwise checks
    pub partner: Option<usize>,
    pub expected: DVector<f64>,
    pub actual: DVector<f64>,
    /// Norm of `expected - actual`, NaN if either side is not finite
    pub error: f64,
    pub tolerance: f64,
}

impl fmt::Display for ConsistencyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.partner {
            Some(partner) => write!(
                f,
                "{} check failed for cases ({}, {}): error {:e} > {:e}",
                self.kind, self.case, partner, self.error, self.tolerance
            ),
            None => write!(
                f,
                "{} check failed for case {}: error {:e} > {:e}",
                self.kind, self.case, self.error, self.tolerance
            ),
        }
    }
}

fn compare(
    kind: CheckKind,
    case: usize,
    partner: Option<usize>,
    expected: DVector<f64>,
    actual: DVector<f64>,
    tolerance: f64,
) -> Option<ConsistencyFailure> {
    let error = (&expected - &actual).norm();

    // NaN never passes
    if error <= tolerance {
        return None;
    }

    let failure = ConsistencyFailure {
        kind,
        case,
        partner,
        expected,
        actual,
        error,
        tolerance,
    };
    warn!("{failure}");
    Some(failure)
}

fn tangent_vector(tangent: &Sim3Tangent) -> DVector<f64> {
    DVector::from_column_slice(tangent.coeffs().as_slice())
}

fn matrix_vector(matrix: &Matrix4<f64>) -> DVector<f64> {
    DVector::from_column_slice(matrix.as_slice())
}

/// Check `vee(hat(ξ)) = ξ` for every tangent vector.
pub fn check_hat_vee(tangents: &[Sim3Tangent], tolerance: f64) -> Vec<ConsistencyFailure> {
    tangents
        .iter()
        .enumerate()
        .filter_map(|(i, xi)| {
            compare(
                CheckKind::HatVee,
                i,
                None,
                tangent_vector(xi),
                tangent_vector(&Sim3Tangent::vee(&xi.hat())),
                tolerance,
            )
        })
        .collect()
}

/// Check the closed-form bracket against the matrix commutator for every
/// ordered pair of tangent vectors.
pub fn check_lie_bracket(tangents: &[Sim3Tangent], tolerance: f64) -> Vec<ConsistencyFailure> {
    let mut failures = Vec::new();

    for (i, a) in tangents.iter().enumerate() {
        for (j, b) in tangents.iter().enumerate() {
            let commutator = a.hat() * b.hat() - b.hat() * a.hat();
            failures.extend(compare(
                CheckKind::LieBracket,
                i,
                Some(j),
                tangent_vector(&Sim3Tangent::vee(&commutator)),
                tangent_vector(&a.lie_bracket(b)),
                tolerance,
            ));
        }
    }

    failures
}

/// Check `Exp(Log(p)) = p` on the homogeneous matrices.
pub fn check_exp_log(poses: &[ScaledPose3], tolerance: f64) -> Vec<ConsistencyFailure> {
    poses
        .iter()
        .enumerate()
        .filter_map(|(i, pose)| {
            let recovered = ScaledPose3::expmap(&pose.logmap());
            compare(
                CheckKind::ExpLog,
                i,
                None,
                matrix_vector(&pose.matrix()),
                matrix_vector(&recovered.matrix()),
                tolerance,
            )
        })
        .collect()
}

/// Check the group action on `point` against the homogeneous matrix.
pub fn check_point_action(
    poses: &[ScaledPose3],
    point: &Vector3<f64>,
    tolerance: f64,
) -> Vec<ConsistencyFailure> {
    poses
        .iter()
        .enumerate()
        .filter_map(|(i, pose)| {
            let matrix = pose.matrix();
            let expected: Vector3<f64> = matrix.fixed_view::<3, 3>(0, 0) * point
                + matrix.fixed_view::<3, 1>(0, 3);
            let actual = pose.transform_from(point, None, None);
            compare(
                CheckKind::PointAction,
                i,
                None,
                DVector::from_column_slice(expected.as_slice()),
                DVector::from_column_slice(actual.as_slice()),
                tolerance,
            )
        })
        .collect()
}

/// Check `p p⁻¹ = I` on the homogeneous matrices.
pub fn check_inverse(poses: &[ScaledPose3], tolerance: f64) -> Vec<ConsistencyFailure> {
    poses
        .iter()
        .enumerate()
        .filter_map(|(i, pose)| {
            let product = pose.matrix() * pose.inverse(None).matrix();
            compare(
                CheckKind::Inverse,
                i,
                None,
                matrix_vector(&Matrix4::identity()),
                matrix_vector(&product),
                tolerance,
            )
        })
        .collect()
}
