//! Ambient occlusion renderer.
//!
//! Progressive: every [`AmbientOcclusion::refine`] call adds one sample
//! per pixel. Primary rays come from a jittered pinhole camera; each hit
//! spawns one hemisphere ray around the geometric normal, tested with the
//! accelerator's any-hit mode, and unoccluded samples accumulate into the
//! film. Ray counts and timings per query kind are collected in
//! [`RenderStats`] so different accelerators can be compared.

// std
use std::f32::consts::PI;
use std::time::{Duration, Instant};
// bvh
use crate::core::bvh::{Accelerator, Float, Hit, TRACE_COHERENT, TRACE_SHADOW, TRIANGLE_INVALID};
use crate::core::film::Film;
use crate::core::geometry::{vec3_cross_vec3, vec3_dot_vec3, Point3f, Ray, Vector3f};
use crate::core::mesh::Mesh;
use crate::core::rng::Rng;

/// Pinhole camera; `fov` is the horizontal field of view in radians.
#[derive(Debug, Copy, Clone)]
pub struct Camera {
    pub from: Point3f,
    pub to: Point3f,
    pub up: Vector3f,
    pub fov: Float,
}

/// Accumulating wall-clock timer.
#[derive(Debug, Default)]
pub struct Timer {
    start: Option<Instant>,
    total: Duration,
}

impl Timer {
    pub fn begin(&mut self) {
        self.start = Some(Instant::now());
    }
    pub fn end(&mut self) {
        if let Some(start) = self.start.take() {
            self.total += start.elapsed();
        }
    }
    pub fn seconds(&self) -> f64 {
        self.total.as_secs_f64()
    }
}

/// Ray counts and trace timings, split by query kind.
#[derive(Debug, Default)]
pub struct RenderStats {
    pub primary_timer: Timer,
    pub primary_count: u64,
    pub shadow_timer: Timer,
    pub shadow_count: u64,
}

/// Progressive ambient-occlusion render of one mesh through one built
/// accelerator.
pub struct AmbientOcclusion<'a> {
    film: Film,
    // camera frame
    origin: Point3f,
    view_x: Vector3f,
    view_y: Vector3f,
    view_z: Vector3f,
    mesh: &'a Mesh,
    accel: &'a dyn Accelerator,
    stats: RenderStats,
    sample: u32,
    // trace buffers, one entry per pixel
    pixels: Vec<(u16, u16)>,
    rays: Vec<Ray>,
    shadows: Vec<Ray>,
    hits: Vec<Hit>,
}

impl<'a> AmbientOcclusion<'a> {
    /// The accelerator must already be built over `mesh`.
    pub fn new(
        mesh: &'a Mesh,
        accel: &'a dyn Accelerator,
        width: u32,
        height: u32,
        camera: &Camera,
    ) -> Self {
        let scale = (0.5 * camera.fov).tan();
        let aspect = height as Float / width as Float;

        let view_z = (camera.to - camera.from).normalize();
        let view_x = vec3_cross_vec3(&view_z, &camera.up).normalize() * scale;
        let view_y = vec3_cross_vec3(&view_z, &view_x).normalize() * (aspect * scale);

        let n_pixels = (width * height) as usize;
        AmbientOcclusion {
            film: Film::new(width, height),
            origin: camera.from,
            view_x,
            view_y,
            view_z,
            mesh,
            accel,
            stats: RenderStats::default(),
            sample: 0,
            pixels: vec![(0, 0); n_pixels],
            rays: vec![
                Ray {
                    o: Point3f::default(),
                    d: Vector3f::new(0.0, 0.0, 1.0),
                    t_min: 0.0,
                    t_max: std::f32::INFINITY,
                };
                n_pixels
            ],
            shadows: vec![
                Ray {
                    o: Point3f::default(),
                    d: Vector3f::new(0.0, 0.0, 1.0),
                    t_min: 0.0,
                    t_max: std::f32::INFINITY,
                };
                n_pixels
            ],
            hits: vec![Hit::default(); n_pixels],
        }
    }

    /// Add one sample per pixel.
    pub fn refine(&mut self) {
        let s = self.sample;
        self.sample += 1;
        let mut rng = Rng::new();
        rng.set_sequence(u64::from(s));

        // jittered camera rays
        let w = self.film.width();
        let h = self.film.height();
        let mut ray_count = 0_usize;
        for y in 0..h {
            for x in 0..w {
                self.pixels[ray_count] = (x as u16, y as u16);

                let fx = rng.uniform_float();
                let fy = rng.uniform_float();
                let sx = 2.0 * (x as Float + fx) / w as Float - 1.0;
                let sy = 2.0 * (y as Float + fy) / h as Float - 1.0;

                let d = (self.view_z + self.view_x * sx + self.view_y * sy).normalize();
                self.rays[ray_count] = Ray {
                    o: self.origin,
                    d,
                    t_min: 0.0,
                    t_max: std::f32::INFINITY,
                };
                ray_count += 1;
            }
        }

        let accel = self.accel;
        self.stats.primary_count += ray_count as u64;
        self.stats.primary_timer.begin();
        accel.trace(
            &mut self.rays[..ray_count],
            &mut self.hits[..ray_count],
            TRACE_COHERENT,
        );
        self.stats.primary_timer.end();

        // one hemisphere ray per surface hit
        let mut shadow_count = 0_usize;
        for ray_idx in 0..ray_count {
            let hit = self.hits[ray_idx];
            if !hit.is_hit() {
                continue;
            }
            let pixel = self.pixels[ray_idx];
            let d = self.rays[ray_idx].d;

            let indices = self.mesh.indices();
            let p0 = self.mesh.position(indices[3 * hit.triangle as usize]);
            let p1 = self.mesh.position(indices[3 * hit.triangle as usize + 1]);
            let p2 = self.mesh.position(indices[3 * hit.triangle as usize + 2]);

            let w0 = 1.0 - (hit.u + hit.v);
            let p = p0 * w0 + p1 * hit.u + p2 * hit.v;

            let mut n = vec3_cross_vec3(&(p1 - p0), &(p2 - p0)).normalize();
            if vec3_dot_vec3(&n, &d) > 0.0 {
                n = -n;
            }
            let (bx, by) = basis(&n);

            let cos_theta = 1.0 - rng.uniform_float();
            let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
            let phi = 2.0 * PI * rng.uniform_float();

            let r = bx * (phi.cos() * sin_theta) + by * (phi.sin() * sin_theta) + n * cos_theta;

            self.shadows[shadow_count] = Ray {
                o: offset_origin(&p, &n),
                d: r,
                t_min: 1.0e-4,
                t_max: std::f32::INFINITY,
            };
            self.pixels[shadow_count] = pixel;
            shadow_count += 1;
        }

        self.stats.shadow_count += shadow_count as u64;
        self.stats.shadow_timer.begin();
        accel.trace(
            &mut self.shadows[..shadow_count],
            &mut self.hits[..shadow_count],
            TRACE_SHADOW,
        );
        self.stats.shadow_timer.end();

        // unoccluded samples brighten the pixel
        for shadow_idx in 0..shadow_count {
            if self.hits[shadow_idx].triangle == TRIANGLE_INVALID {
                let (x, y) = self.pixels[shadow_idx];
                self.film.add(u32::from(x), u32::from(y), 1.0);
            }
        }
    }

    pub fn film(&self) -> &Film {
        &self.film
    }

    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }
}

/// Build an orthonormal tangent basis around a unit normal.
fn basis(n: &Vector3f) -> (Vector3f, Vector3f) {
    let v = if n.x.abs() > n.y.abs() {
        vec3_cross_vec3(n, &Vector3f::new(0.0, 1.0, 0.0))
    } else {
        vec3_cross_vec3(n, &Vector3f::new(1.0, 0.0, 0.0))
    };
    let x = vec3_cross_vec3(&v, n).normalize();
    let y = vec3_cross_vec3(n, &x).normalize();
    (x, y)
}

/// Offset a ray origin along the normal to escape self-intersection
/// (Ray Tracing Gems I, chapter 6): scale the normal into integer ULPs
/// away from the surface, with a plain float nudge near the origin.
fn offset_origin(p: &Point3f, n: &Vector3f) -> Point3f {
    const ORIGIN: Float = 1.0 / 32.0;
    const FLOAT_SCALE: Float = 1.0 / 65536.0;
    const INT_SCALE: Float = 256.0;

    let offset_int = |pk: Float, nk: Float| -> Float {
        let of_i = (INT_SCALE * nk) as i32;
        let bits = pk.to_bits() as i32;
        let bits = bits.wrapping_add(if pk < 0.0 { -of_i } else { of_i });
        f32::from_bits(bits as u32)
    };

    Point3f {
        x: if p.x.abs() < ORIGIN {
            p.x + FLOAT_SCALE * n.x
        } else {
            offset_int(p.x, n.x)
        },
        y: if p.y.abs() < ORIGIN {
            p.y + FLOAT_SCALE * n.y
        } else {
            offset_int(p.y, n.y)
        },
        z: if p.z.abs() < ORIGIN {
            p.z + FLOAT_SCALE * n.z
        } else {
            offset_int(p.z, n.z)
        },
    }
}
