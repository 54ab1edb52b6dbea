//! Helpers shared by the integration tests: seeded random meshes and
//! rays, plus brute-force reference queries over the same kernel the
//! accelerator uses.

use rs_bvh::core::bvh::{Float, Hit};
use rs_bvh::core::geometry::{Point3f, Ray, Vector3f};
use rs_bvh::core::mesh::TriangleMesh;
use rs_bvh::core::rng::Rng;
use rs_bvh::core::triangle::WoopRay;

/// A soup of `n` random triangles: vertices are a random centre in
/// `[-10, 10]^3` plus offsets in `[-1, 1]^3`. Returns flat positions and
/// indices ready for `TriangleMesh::new`.
pub fn random_mesh(rng: &mut Rng, n: u32) -> (Vec<Float>, Vec<u32>) {
    let mut positions = Vec::with_capacity(9 * n as usize);
    let mut indices = Vec::with_capacity(3 * n as usize);
    for ii in 0..n {
        let cx = 20.0 * rng.uniform_float() - 10.0;
        let cy = 20.0 * rng.uniform_float() - 10.0;
        let cz = 20.0 * rng.uniform_float() - 10.0;
        for _ in 0..3 {
            positions.push(cx + 2.0 * rng.uniform_float() - 1.0);
            positions.push(cy + 2.0 * rng.uniform_float() - 1.0);
            positions.push(cz + 2.0 * rng.uniform_float() - 1.0);
        }
        indices.push(3 * ii);
        indices.push(3 * ii + 1);
        indices.push(3 * ii + 2);
    }
    (positions, indices)
}

/// A ray from a random point outside the mesh region toward a random
/// target inside it. The direction is deliberately not normalized.
pub fn random_ray(rng: &mut Rng) -> Ray {
    loop {
        let o = Point3f::new(
            30.0 * rng.uniform_float() - 15.0,
            30.0 * rng.uniform_float() - 15.0,
            15.0,
        );
        let target = Point3f::new(
            10.0 * rng.uniform_float() - 5.0,
            10.0 * rng.uniform_float() - 5.0,
            10.0 * rng.uniform_float() - 5.0,
        );
        let d: Vector3f = target - o;
        if d.length_squared() > 1.0e-4 {
            return Ray {
                o,
                d,
                t_min: 0.0,
                t_max: std::f32::INFINITY,
            };
        }
    }
}

/// Closest hit by testing every triangle in index order with the same
/// watertight kernel the accelerator uses.
pub fn brute_force_closest(mesh: &TriangleMesh, ray: &Ray) -> (Hit, Float) {
    let woop = WoopRay::new(&ray.o, &ray.d);
    let mut t_max = ray.t_max;
    let mut hit = Hit::default();
    for tri in 0..mesh.n_triangles {
        let (p0, p1, p2) = mesh.triangle(tri);
        if let Some(th) = woop.intersect(ray.t_min, t_max, &p0, &p1, &p2) {
            t_max = th.t;
            hit = Hit {
                triangle: tri,
                u: th.u,
                v: th.v,
            };
        }
    }
    (hit, t_max)
}

/// Does any triangle occlude the ray within its interval?
pub fn brute_force_occluded(mesh: &TriangleMesh, ray: &Ray) -> bool {
    let woop = WoopRay::new(&ray.o, &ray.d);
    for tri in 0..mesh.n_triangles {
        let (p0, p1, p2) = mesh.triangle(tri);
        if woop
            .intersect(ray.t_min, ray.t_max, &p0, &p1, &p2)
            .is_some()
        {
            return true;
        }
    }
    false
}
