//! Benchmarks for clip remapping and playback

use std::f32::consts::FRAC_PI_2;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::Quat;

use mimic_retarget::ClipRemapper;
use mimic_rig::standard_humanoid;
use mimic_test::{offset_skeleton, random_idle_clip};

fn bench_remap_clip(c: &mut Criterion) {
    let rig = standard_humanoid().unwrap();
    let skeleton = offset_skeleton(Quat::from_rotation_z(FRAC_PI_2)).unwrap();
    let clip = random_idle_clip(1, 300).unwrap();
    let remapper = ClipRemapper::mixamo();

    c.bench_function("remap_clip_300_keys", |b| {
        b.iter(|| black_box(remapper.remap_onto(black_box(&clip), &skeleton, &rig)))
    });
}

fn bench_sample_clip(c: &mut Criterion) {
    let mut rig = standard_humanoid().unwrap();
    let skeleton = offset_skeleton(Quat::IDENTITY).unwrap();
    let clip = random_idle_clip(2, 300).unwrap();
    let remapped = ClipRemapper::mixamo().remap_onto(&clip, &skeleton, &rig).unwrap();

    c.bench_function("apply_remapped_clip", |b| {
        let mut t = 0.0f32;
        b.iter(|| {
            t = (t + 1.0 / 60.0) % remapped.duration.max(f32::EPSILON);
            remapped.apply_at(black_box(t), &mut rig);
        })
    });
}

criterion_group!(benches, bench_remap_clip, bench_sample_clip);
criterion_main!(benches);
