//! Scenario tests for ScaledPose3
//!
//! Fixed poses and tangent vectors with known answers: exponential maps
//! checked against a truncated matrix series, adjoint identities, motion
//! along body axes, and the homogeneous-matrix meaning of compose, inverse
//! and between.

#![allow(clippy::unwrap_used)]

use pose_test_utils::*;

use apex_sim3::geometry::ScaledPose3;
use apex_sim3::manifold::sim3::Sim3Tangent;
use apex_sim3::manifold::so3::SO3;
use apex_sim3::manifold::{Chart, CoordinatesMode, LieGroup, Vector7};
use nalgebra::{Matrix4, Vector3};
use std::f64::consts::{FRAC_PI_4, SQRT_2};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn tangent(values: [f64; 7]) -> Sim3Tangent {
    Sim3Tangent::from_vector(Vector7::from_column_slice(&values))
}

fn assert_matrix_close(label: &str, actual: &Matrix4<f64>, expected: &Matrix4<f64>, tol: f64) {
    let error = (actual - expected).amax();
    assert!(
        error < tol,
        "{label}: error {error:e} exceeds {tol:e}\nactual: {actual}\nexpected: {expected}"
    );
}

#[test]
fn test_expmap_matches_matrix_series() -> TestResult {
    let xi = tangent([0.4, 0.5, 0.6, 0.1, 0.2, 0.3, 0.1]);
    let pose = ScaledPose3::expmap(&xi);
    let series = ScaledPose3::from_sim3(xi.expm(30)?);

    assert!(pose.equals(&series, 1e-6));
    assert!(pose.logmap().is_approx(&xi, 1e-6));
    Ok(())
}

#[test]
fn test_expmap_matches_matrix_series_at_growing_magnitude() -> TestResult {
    let direction = tangent([-0.4, 0.5, -0.6, 0.1, -0.2, 0.3, 0.1]);

    for theta in [1.0, 2.0, 4.0, 8.0] {
        let xi = direction * theta;
        let pose = ScaledPose3::expmap(&xi);
        let series = ScaledPose3::from_sim3(xi.expm(30)?);

        assert!(pose.equals(&series, 1e-6), "expmap at {theta}");
        assert!(pose.logmap().is_approx(&xi, 1e-6), "logmap at {theta}");
    }
    Ok(())
}

#[test]
fn test_expmap_large_translation() -> TestResult {
    let xi = tangent([100.0, 120.0, -60.0, 0.2, 0.3, -0.8, 0.1]);
    let pose = ScaledPose3::expmap(&xi);
    let series = ScaledPose3::from_sim3(xi.expm(20)?);

    assert_matrix_close("large translation", &pose.matrix(), &series.matrix(), 1e-6);
    assert!(pose.logmap().is_approx(&xi, 1e-6));
    Ok(())
}

#[test]
fn test_adjoint_conjugation() {
    let xi = tangent([0.3, 0.0, 1.0, 0.0, 0.0, 0.3, 0.0]);

    for pose in [pose_t(), pose_t2(), pose_t3(), pose_t4()] {
        let conjugated = pose * ScaledPose3::expmap(&xi) * pose.inverse(None);
        let transported = ScaledPose3::expmap(&pose.adjoint_act(&xi));
        assert!(conjugated.equals(&transported, 1e-6));
    }
}

#[test]
fn test_adjoint_moves_perturbation_across_composition() {
    let x = tangent([0.4, 0.2, 0.8, 0.1, 0.1, 0.1, 0.0]);
    let (t, t2) = (pose_t(), pose_t2());

    let left = t * ScaledPose3::expmap(&x) * t2;
    let transported = t2.inverse(None).adjoint_act(&x);
    let right = t * t2 * ScaledPose3::expmap(&transported);
    assert!(left.equals(&right, 1e-6));
}

#[test]
fn test_compose_is_matrix_product() {
    let (t, t2, t4) = (pose_t(), pose_t2(), pose_t4());

    for (label, a, b) in [("T2 T2", t2, t2), ("T T2", t, t2), ("T4 T2", t4, t2)] {
        let expected = a.matrix() * b.matrix();
        assert_matrix_close(label, &(a * b).matrix(), &expected, 1e-8);
    }
}

#[test]
fn test_inverse_is_matrix_inverse() -> TestResult {
    let t4 = pose_t4();
    let expected = t4.matrix().try_inverse().ok_or("T4 matrix is singular")?;

    assert_matrix_close("T4 inverse", &t4.inverse(None).matrix(), &expected, 1e-9);
    assert!((t4.inverse(None).scale() - 0.5).abs() < 1e-12);
    Ok(())
}

#[test]
fn test_between_is_relative_pose() {
    let (t2, t4) = (pose_t2(), pose_t4());
    let expected = t2.inverse(None) * t4;

    let actual = t2.between(&t4, None, None);
    assert!(actual.equals(&expected, 1e-9));
    assert!((t2 * actual).equals(&t4, 1e-9));
}

#[test]
fn test_local_coordinates_invert_retract() -> TestResult {
    let t = pose_t();
    let d = tangent([0.1; 7]);

    let moved = t.retract(&d, CoordinatesMode::Expmap)?;
    let recovered = t.local_coordinates(&moved, CoordinatesMode::Expmap)?;
    assert!(recovered.is_approx(&d, 1e-9));
    Ok(())
}

#[test]
fn test_local_coordinates_between_scaled_poses() -> TestResult {
    let (t3, t4) = (pose_t3(), pose_t4());

    let d12 = t4.local_coordinates(&t3, CoordinatesMode::Expmap)?;
    let d21 = t3.local_coordinates(&t4, CoordinatesMode::Expmap)?;
    assert!(d12.is_approx(&-d21, 1e-9));
    assert!((d12.sigma() + 2.0f64.ln()).abs() < 1e-12);

    assert!(t4.retract(&d12, CoordinatesMode::Expmap)?.equals(&t3, 1e-9));
    Ok(())
}

#[test]
fn test_unicycle_moves_along_body_axis() -> TestResult {
    let step = Sim3Tangent::basis(0);
    let level = SO3::identity();

    let x1 = ScaledPose3::identity();
    let expected1 = ScaledPose3::from_rotation_translation(level, Vector3::new(1.0, 0.0, 0.0));
    let moved1 = x1.retract(&step, CoordinatesMode::Expmap)?;
    assert!(moved1.equals(&expected1, 1e-9));

    let x2 = ScaledPose3::from_rotation_translation(level, Vector3::new(1.0, 1.0, 0.0));
    let expected2 = ScaledPose3::from_rotation_translation(level, Vector3::new(2.0, 1.0, 0.0));
    let moved2 = x2.retract(&step, CoordinatesMode::Expmap)?;
    assert!(moved2.equals(&expected2, 1e-9));

    let yaw = SO3::from_euler_angles(0.0, 0.0, FRAC_PI_4);
    let x3 = ScaledPose3::from_rotation_translation(yaw, Vector3::new(1.0, 1.0, 0.0));
    let expected3 = ScaledPose3::from_rotation_translation(yaw, Vector3::new(2.0, 2.0, 0.0));
    let moved3 = x3.retract(&(step * SQRT_2), CoordinatesMode::Expmap)?;
    assert!(moved3.equals(&expected3, 1e-9));
    Ok(())
}

#[test]
fn test_unicycle_step_is_scaled_by_pose_scale() -> TestResult {
    let pose = ScaledPose3::new(SO3::identity(), Vector3::new(1.0, 1.0, 0.0), 3.0);
    let moved = pose.retract(&Sim3Tangent::basis(0), CoordinatesMode::Expmap)?;

    assert!((moved.translation() - Vector3::new(4.0, 1.0, 0.0)).norm() < 1e-9);
    assert!((moved.scale() - 3.0).abs() < 1e-12);
    Ok(())
}

#[test]
fn test_range_to_landmarks() {
    let l1 = Vector3::new(1.0, 0.0, 0.0);
    let l3 = Vector3::new(2.0, 2.0, 0.0);

    let x1 = ScaledPose3::identity();
    assert!((x1.range(&l1, None, None) - 1.0).abs() < 1e-9);

    let x2 = ScaledPose3::from_rotation_translation(SO3::identity(), Vector3::new(1.0, 1.0, 0.0));
    assert!((x2.range(&l3, None, None) - SQRT_2).abs() < 1e-9);

    let sx = ScaledPose3::new(SO3::identity(), Vector3::new(1.0, 1.0, 0.0), 2.0);
    assert!((sx.range(&l3, None, None) - SQRT_2 / 2.0).abs() < 1e-9);
}

#[test]
fn test_range_between_scaled_poses() {
    let origin = ScaledPose3::new(SO3::identity(), Vector3::zeros(), 3.0);
    let target = ScaledPose3::new(SO3::identity(), Vector3::new(1.0, 1.0, 0.0), 6.0);

    assert!((target.range_to_pose(&origin, None, None) - SQRT_2 / 6.0).abs() < 1e-12);
    assert!((origin.range_to_pose(&target, None, None) - SQRT_2 / 3.0).abs() < 1e-12);
}
