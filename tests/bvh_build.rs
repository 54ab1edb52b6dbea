//! Structural invariants of the built tree.

mod common;

use rs_bvh::accelerators::simple::{SimpleAccel, MAX_NODE_SIZE};
use rs_bvh::core::bvh::Accelerator;
use rs_bvh::core::geometry::Bounds3f;
use rs_bvh::core::mesh::TriangleMesh;
use rs_bvh::core::rng::Rng;

fn build_random(seed: u64, n: u32) -> (Vec<f32>, Vec<u32>, SimpleAccel) {
    let mut rng = Rng::new();
    rng.set_sequence(seed);
    let (positions, indices) = common::random_mesh(&mut rng, n);
    let mut accel = SimpleAccel::new();
    accel.build(&TriangleMesh::new(&positions, &indices));
    (positions, indices, accel)
}

fn encloses(outer: &Bounds3f, inner: &Bounds3f) -> bool {
    outer.contains(&inner.p_min) && outer.contains(&inner.p_max)
}

#[test]
fn parents_precede_children() {
    let (_, _, accel) = build_random(1, 501);
    let n = accel.nodes.len();
    assert!(n > 1);
    for (i, node) in accel.nodes.iter().enumerate() {
        if node.count == 0 {
            assert!(i + 1 < n, "left child of {} out of range", i);
            assert!(
                i < node.offset as usize && (node.offset as usize) < n,
                "right child of {} out of range",
                i
            );
        }
    }
}

#[test]
fn leaves_partition_the_triangles() {
    let (_, indices, accel) = build_random(2, 777);
    let n_triangles = (indices.len() / 3) as u32;

    let mut seen: Vec<u32> = accel.triangles.iter().map(|t| t.index).collect();
    seen.sort_unstable();
    let expected: Vec<u32> = (0..n_triangles).collect();
    assert_eq!(seen, expected);

    // every owned triangle is covered by exactly one leaf range
    let mut covered = vec![0_u32; accel.triangles.len()];
    for node in &accel.nodes {
        if node.count > 0 {
            for slot in node.offset..node.offset + u32::from(node.count) {
                covered[slot as usize] += 1;
            }
        }
    }
    assert!(covered.iter().all(|&c| c == 1));
}

#[test]
fn leaf_counts_are_bounded() {
    let (_, _, accel) = build_random(3, 333);
    for node in &accel.nodes {
        if node.count > 0 {
            assert!(u32::from(node.count) <= MAX_NODE_SIZE);
        }
    }
}

#[test]
fn tiny_mesh_builds_a_root_leaf() {
    let (_, _, accel) = build_random(4, 3);
    assert_eq!(accel.nodes.len(), 1);
    assert_eq!(accel.nodes[0].count, 3);
    assert_eq!(accel.nodes[0].offset, 0);
}

#[test]
fn node_bounds_enclose_their_subtrees() {
    let (_, _, accel) = build_random(5, 400);
    for (i, node) in accel.nodes.iter().enumerate() {
        if node.count > 0 {
            for tri in &accel.triangles
                [node.offset as usize..node.offset as usize + node.count as usize]
            {
                assert!(node.bounds.contains(&tri.p0), "leaf {} leaks p0", i);
                assert!(node.bounds.contains(&tri.p1), "leaf {} leaks p1", i);
                assert!(node.bounds.contains(&tri.p2), "leaf {} leaks p2", i);
            }
        } else {
            let left = &accel.nodes[i + 1];
            let right = &accel.nodes[node.offset as usize];
            assert!(encloses(&node.bounds, &left.bounds), "node {} leaks left", i);
            assert!(
                encloses(&node.bounds, &right.bounds),
                "node {} leaks right",
                i
            );
        }
    }
}

#[test]
fn rebuild_is_reproducible() {
    let mut rng = Rng::new();
    rng.set_sequence(6);
    let (positions, indices) = common::random_mesh(&mut rng, 600);
    let mesh = TriangleMesh::new(&positions, &indices);

    let mut accel = SimpleAccel::new();
    accel.build(&mesh);
    let nodes = accel.nodes.clone();
    let triangles = accel.triangles.clone();

    accel.build(&mesh);
    assert_eq!(accel.nodes, nodes);
    assert_eq!(accel.triangles, triangles);
}

#[test]
fn empty_mesh_builds_empty_arrays() {
    let positions: Vec<f32> = Vec::new();
    let indices: Vec<u32> = Vec::new();
    let mut accel = SimpleAccel::new();
    accel.build(&TriangleMesh::new(&positions, &indices));
    assert!(accel.nodes.is_empty());
    assert!(accel.triangles.is_empty());
}

/// Ten triangles whose centroids all coincide at the origin: the SAH
/// split cannot separate anything and the builder must fall back to
/// median partitions all the way down to leaves.
#[test]
fn coincident_centroids_fall_back_to_median_splits() {
    let mut positions: Vec<f32> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    for i in 0..10_u32 {
        let s = 1.0 + i as f32;
        positions.extend_from_slice(&[-s, 0.0, -0.1 * s]);
        positions.extend_from_slice(&[s, -s, 0.05 * s]);
        positions.extend_from_slice(&[0.0, s, 0.05 * s]);
        indices.extend_from_slice(&[3 * i, 3 * i + 1, 3 * i + 2]);
    }
    let mut accel = SimpleAccel::new();
    accel.build(&TriangleMesh::new(&positions, &indices));

    let mut seen: Vec<u32> = accel.triangles.iter().map(|t| t.index).collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..10).collect::<Vec<u32>>());
    for node in &accel.nodes {
        if node.count > 0 {
            assert!(u32::from(node.count) <= MAX_NODE_SIZE);
        }
    }
}
