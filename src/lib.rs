//! # rs_bvh
//!
//! [Rust][rust] crate implementing a bounding volume hierarchy (BVH) over
//! static indexed triangle meshes, answering batched closest-hit and
//! any-hit (shadow) ray queries.
//!
//! The accelerator is built top-down with a binned surface-area heuristic
//! into a flat node array (parents precede children, the left child is
//! implicit at `index + 1`), and traversed per ray with near-child-first
//! ordering derived from the ray direction. The triangle test is the
//! watertight shear/edge-function kernel of Woop, Benthin and Wald, with
//! a double-precision rescue for edge functions that underflow to zero.
//!
//! ```rust
//! use rs_bvh::accelerators::simple::SimpleAccel;
//! use rs_bvh::core::bvh::{Accelerator, Hit};
//! use rs_bvh::core::geometry::{Point3f, Ray, Vector3f};
//! use rs_bvh::core::mesh::TriangleMesh;
//!
//!     let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
//!     let indices = [0, 1, 2];
//!     let mesh = TriangleMesh::new(&positions, &indices);
//!
//!     let mut accel = SimpleAccel::new();
//!     accel.build(&mesh);
//!
//!     let mut rays = [Ray {
//!         o: Point3f::new(0.25, 0.25, -1.0),
//!         d: Vector3f::new(0.0, 0.0, 1.0),
//!         t_min: 0.0,
//!         t_max: std::f32::INFINITY,
//!     }];
//!     let mut hits = [Hit::default()];
//!     accel.trace(&mut rays, &mut hits, 0);
//!     assert_eq!(hits[0].triangle, 0);
//!     assert_eq!(rays[0].t_max, 1.0);
//! ```
//!
//! The demo binary renders an ambient-occlusion image of an OBJ mesh; see
//! `src/bin/rs_bvh.rs`.
//!
//! [rust]: https://www.rust-lang.org
#[macro_use]
extern crate impl_ops;

pub mod accelerators;
pub mod core;
pub mod integrators;
