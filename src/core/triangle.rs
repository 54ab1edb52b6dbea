//! Ray–triangle intersection kernels.
//!
//! The primary kernel is the watertight test of Woop, Benthin and Wald
//! (2013): translate the triangle into ray space, shear so the ray's
//! dominant axis becomes +z, and evaluate 2-D edge functions. Points
//! exactly on a shared edge make one or more edge functions underflow to
//! exactly zero; those are recomputed in double precision so adjacent
//! triangles cannot both reject the point. Do not remove that rescue —
//! it is what makes the test watertight across triangle boundaries.
//!
//! [`intersect_triangle`] is the classic Möller–Trumbore test, kept as an
//! independent reference kernel.

// std
use std::mem;
// bvh
use crate::core::bvh::Float;
use crate::core::geometry::{vec3_cross_vec3, vec3_dot_vec3, vec3_max_dimension, Point3f, Vector3f};

/// A single ray–triangle intersection: parametric distance and the
/// barycentric weights of the triangle's second and third vertex.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TriangleHit {
    pub t: Float,
    pub u: Float,
    pub v: Float,
}

/// A ray prepared for the watertight test: origin plus the shear that
/// maps the dominant direction axis onto +z.
///
/// The preparation cost is paid once per ray and amortized over every
/// triangle tested during traversal.
#[derive(Debug, Copy, Clone)]
pub struct WoopRay {
    pub o: Point3f,
    sx: Float,
    sy: Float,
    sz: Float,
    kx: usize,
    ky: usize,
    kz: usize,
}

impl WoopRay {
    pub fn new(o: &Point3f, d: &Vector3f) -> WoopRay {
        let kz = vec3_max_dimension(d);
        let mut kx = (kz + 1) % 3;
        let mut ky = (kz + 2) % 3;
        if d[kz] < 0.0 {
            // swapping preserves winding
            mem::swap(&mut kx, &mut ky);
        }
        WoopRay {
            o: *o,
            sx: d[kx] / d[kz],
            sy: d[ky] / d[kz],
            sz: 1.0 / d[kz],
            kx,
            ky,
            kz,
        }
    }

    /// Test one triangle against the interval `[t_min, t_max]` (both ends
    /// inclusive). Degenerate triangles (`det == 0`) never hit.
    pub fn intersect(
        &self,
        t_min: Float,
        t_max: Float,
        p0: &Point3f,
        p1: &Point3f,
        p2: &Point3f,
    ) -> Option<TriangleHit> {
        // translate vertices into ray space
        let a: Vector3f = p0 - self.o;
        let b: Vector3f = p1 - self.o;
        let c: Vector3f = p2 - self.o;

        // shear onto the plane perpendicular to the dominant axis
        let ax = a[self.kx] - self.sx * a[self.kz];
        let ay = a[self.ky] - self.sy * a[self.kz];
        let bx = b[self.kx] - self.sx * b[self.kz];
        let by = b[self.ky] - self.sy * b[self.kz];
        let cx = c[self.kx] - self.sx * c[self.kz];
        let cy = c[self.ky] - self.sy * c[self.kz];

        // edge functions
        let mut e0 = cx * by - cy * bx;
        let mut e1 = ax * cy - ay * cx;
        let mut e2 = bx * ay - by * ax;

        if e0 == 0.0 || e1 == 0.0 || e2 == 0.0 {
            // fall back to double precision for all three
            let cxby = cx as f64 * by as f64;
            let cybx = cy as f64 * bx as f64;
            e0 = (cxby - cybx) as Float;
            let axcy = ax as f64 * cy as f64;
            let aycx = ay as f64 * cx as f64;
            e1 = (axcy - aycx) as Float;
            let bxay = bx as f64 * ay as f64;
            let byax = by as f64 * ax as f64;
            e2 = (bxay - byax) as Float;
        }

        // mixed signs mean the ray passes outside an edge; zeros on the
        // edge itself are accepted
        if (e0 < 0.0 || e1 < 0.0 || e2 < 0.0) && (e0 > 0.0 || e1 > 0.0 || e2 > 0.0) {
            return None;
        }

        let det = e0 + e1 + e2;
        if det == 0.0 {
            return None;
        }

        let az = self.sz * a[self.kz];
        let bz = self.sz * b[self.kz];
        let cz = self.sz * c[self.kz];
        let t_scaled = e0 * az + e1 * bz + e2 * cz;

        let inv_det = 1.0 / det;
        let t = t_scaled * inv_det;
        if t < t_min || t > t_max {
            return None;
        }

        Some(TriangleHit {
            t,
            u: e1 * inv_det,
            v: e2 * inv_det,
        })
    }
}

/// Möller–Trumbore ray–triangle intersection.
///
/// Not watertight: rays grazing a shared edge can miss both triangles.
/// Useful as an independent check against the Woop kernel.
pub fn intersect_triangle(
    o: &Point3f,
    d: &Vector3f,
    t_min: Float,
    t_max: Float,
    p0: &Point3f,
    p1: &Point3f,
    p2: &Point3f,
) -> Option<TriangleHit> {
    const EPSILON: Float = 1.0e-5;

    let edge1: Vector3f = p1 - p0;
    let edge2: Vector3f = p2 - p0;

    let h = vec3_cross_vec3(d, &edge2);
    let a = vec3_dot_vec3(&edge1, &h);
    if a > -EPSILON && a < EPSILON {
        // ray parallel to the triangle plane
        return None;
    }
    let f = 1.0 / a;

    let s: Vector3f = o - p0;
    let u = f * vec3_dot_vec3(&s, &h);
    if u < 0.0 || u > 1.0 {
        return None;
    }

    let q = vec3_cross_vec3(&s, &edge1);
    let v = f * vec3_dot_vec3(d, &q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * vec3_dot_vec3(&edge2, &q);
    if t < t_min || t > t_max {
        return None;
    }

    Some(TriangleHit { t, u, v })
}
