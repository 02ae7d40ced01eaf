use criterion::{Criterion, black_box, criterion_group, criterion_main};

use ember_core::animation::{Animation, Bone, BoneEvaluator, BoneInfo, KeyframeTrack, NodeData};
use ember_core::math::{Mat4, Vec2, Vec3, quat_from_rotation_z};
use ember_core::mesh::{SkinnedMesh, SkinnedVertex};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A chain of `bones` bones, each with `keys` position and rotation keys.
fn chain_clip(bones: usize, keys: usize) -> Animation {
    let times: Vec<f32> = (0..keys).map(|k| k as f32).collect();
    let mut clip = Animation::new("chain", keys as f32, 30.0);
    let mut root: Option<NodeData> = None;

    for index in (0..bones).rev() {
        let name = format!("bone{index}");
        let positions = times.iter().map(|&t| Vec3::new(t * 0.1, 1.0, 0.0)).collect();
        let rotations = times.iter().map(|&t| quat_from_rotation_z(t * 0.05)).collect();
        clip = clip.with_bone(
            Bone::new(name.clone(), index as i32)
                .with_positions(KeyframeTrack::new(times.clone(), positions))
                .with_rotations(KeyframeTrack::new(times.clone(), rotations)),
        );
        let mut node = NodeData::new(name);
        if let Some(child) = root.take() {
            node = node.with_child(child);
        }
        root = Some(node);
    }
    match root {
        Some(root) => clip.with_root(root),
        None => clip,
    }
}

fn grid_mesh(side: usize) -> SkinnedMesh {
    let mut vertices = Vec::with_capacity(side * side);
    for y in 0..side {
        for x in 0..side {
            let mut vertex = SkinnedVertex::new(
                Vec3::new(x as f32, y as f32, 0.0),
                Vec3::z(),
                Vec2::new(x as f32 / side as f32, y as f32 / side as f32),
            );
            vertex.add_bone((y % 4) as i32, 1.0);
            vertices.push(vertex);
        }
    }
    let mut indices = Vec::new();
    for y in 0..side as u32 - 1 {
        for x in 0..side as u32 - 1 {
            let i = y * side as u32 + x;
            indices.extend_from_slice(&[i, i + 1, i + side as u32]);
        }
    }
    let mut mesh = SkinnedMesh::new("grid")
        .with_vertices(vertices)
        .with_indices(indices);
    for bone in 0..4 {
        mesh = mesh.with_bone(format!("bone{bone}"), BoneInfo::new(bone, Mat4::identity()));
    }
    mesh
}

// ---------------------------------------------------------------------------
// Codecs
// ---------------------------------------------------------------------------

fn bench_animation_decode(c: &mut Criterion) {
    let bytes = chain_clip(64, 120).encode();
    c.bench_function("animation_decode_64x120", |b| {
        b.iter(|| Animation::decode(black_box(&bytes)));
    });
}

fn bench_mesh_decode(c: &mut Criterion) {
    let bytes = grid_mesh(128).encode();
    c.bench_function("skinned_mesh_decode_128x128", |b| {
        b.iter(|| SkinnedMesh::decode(black_box(&bytes)));
    });
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

fn bench_evaluate_chain(c: &mut Criterion) {
    let clip = chain_clip(64, 120);
    let bone_info = clip.bone_info();
    let mut evaluator = BoneEvaluator::new();
    c.bench_function("bone_evaluator_update_64", |b| {
        b.iter(|| evaluator.update(black_box(&clip), 1.0 / 60.0, 1.0, Some(&bone_info)));
    });
}

criterion_group!(codecs, bench_animation_decode, bench_mesh_decode);
criterion_group!(evaluation, bench_evaluate_chain);
criterion_main!(codecs, evaluation);
