//! Jacobian cost benchmark for ScaledPose3
//!
//! Measures each measurement function with and without its Jacobian slots
//! requested, plus the basis-perturbation adjoint Jacobian.
//!
//! ## Usage
//!
//! ```bash
//! cargo bench --bench jacobians
//! ```

use apex_sim3::geometry::ScaledPose3;
use apex_sim3::init_logger;
use apex_sim3::manifold::sim3::Sim3Tangent;
use apex_sim3::manifold::so3::SO3;
use apex_sim3::manifold::{LieGroup, Matrix3x7, Matrix7, RowVector7};
use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::{Matrix3, RowVector3, Vector3};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::hint::black_box;
use tracing::info;

fn random_pose(rng: &mut StdRng) -> ScaledPose3 {
    ScaledPose3::new(
        SO3::rodrigues(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
        ),
        Vector3::new(
            rng.random_range(-5.0..5.0),
            rng.random_range(-5.0..5.0),
            rng.random_range(-5.0..5.0),
        ),
        rng.random_range(0.5..2.0),
    )
}

fn bench_transforms(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let pose = random_pose(&mut rng);
    let point = Vector3::new(4.0, -3.0, 12.0);

    c.bench_function("transform_to/no_jacobian", |b| {
        b.iter(|| black_box(&pose).transform_to(black_box(&point), None, None))
    });

    c.bench_function("transform_to/with_jacobians", |b| {
        let mut jac_pose = Matrix3x7::zeros();
        let mut jac_point = Matrix3::zeros();
        b.iter(|| {
            black_box(&pose).transform_to(
                black_box(&point),
                Some(&mut jac_pose),
                Some(&mut jac_point),
            )
        })
    });

    c.bench_function("range/no_jacobian", |b| {
        b.iter(|| black_box(&pose).range(black_box(&point), None, None))
    });

    c.bench_function("range/with_jacobians", |b| {
        let mut jac_pose = RowVector7::zeros();
        let mut jac_point = RowVector3::zeros();
        b.iter(|| {
            black_box(&pose).range(black_box(&point), Some(&mut jac_pose), Some(&mut jac_point))
        })
    });
}

fn bench_group_operations(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let p1 = random_pose(&mut rng);
    let p2 = random_pose(&mut rng);

    c.bench_function("between/no_jacobian", |b| {
        b.iter(|| black_box(&p1).between(black_box(&p2), None, None))
    });

    c.bench_function("between/with_jacobians", |b| {
        let mut jac_1 = Matrix7::zeros();
        let mut jac_2 = Matrix7::zeros();
        b.iter(|| black_box(&p1).between(black_box(&p2), Some(&mut jac_1), Some(&mut jac_2)))
    });

    c.bench_function("expmap_logmap", |b| {
        b.iter(|| ScaledPose3::expmap(&black_box(&p1).logmap()))
    });
}

fn bench_adjoint(c: &mut Criterion) {
    let (omega_xi, omega_y) = (Vector3::new(1.0, 2.0, 3.0), Vector3::new(4.0, 5.0, 6.0));
    let xi = Sim3Tangent::new(Vector3::new(0.01, 0.02, 0.03), omega_xi, 0.1);
    let y = Sim3Tangent::new(Vector3::new(0.04, 0.05, 0.06), omega_y, 0.2);

    c.bench_function("adjoint/no_jacobian", |b| {
        b.iter(|| black_box(&xi).adjoint(black_box(&y), None))
    });

    c.bench_function("adjoint/with_jacobian", |b| {
        let mut jacobian = Matrix7::zeros();
        b.iter(|| black_box(&xi).adjoint(black_box(&y), Some(&mut jacobian)))
    });
}

fn criterion_benchmark(c: &mut Criterion) {
    init_logger();
    info!("Benchmarking ScaledPose3 Jacobian paths");

    bench_transforms(c);
    bench_group_operations(c);
    bench_adjoint(c);
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
