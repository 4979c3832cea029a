//! Benchmarks for the landmark solvers

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use mimic_core::Side;
use mimic_solve::{solve_face, solve_hand, solve_pose, FaceSolveConfig, PoseSolveConfig};
use mimic_test::{synthetic_face, synthetic_hand, synthetic_pose, FaceParams, PoseParams};

fn bench_solve_face(c: &mut Criterion) {
    let face = synthetic_face(&FaceParams {
        mouth_open: 0.5,
        pupil: Some(glam::Vec2::new(0.2, -0.1)),
        ..Default::default()
    });
    let config = FaceSolveConfig::default();

    c.bench_function("solve_face", |b| b.iter(|| black_box(solve_face(black_box(&face), &config))));
}

fn bench_solve_hand(c: &mut Criterion) {
    let hand = synthetic_hand(0.4, 0.6);

    c.bench_function("solve_hand", |b| b.iter(|| black_box(solve_hand(black_box(&hand), Side::Right))));
}

fn bench_solve_pose(c: &mut Criterion) {
    let (world, image) = synthetic_pose(&PoseParams {
        left_arm_raise: 0.8,
        right_arm_raise: 0.3,
    });
    let config = PoseSolveConfig::default();

    c.bench_function("solve_pose", |b| {
        b.iter(|| black_box(solve_pose(black_box(&world), black_box(&image), &config)))
    });
}

criterion_group!(benches, bench_solve_face, bench_solve_hand, bench_solve_pose);
criterion_main!(benches);
