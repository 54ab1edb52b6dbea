//! The core of the crate: geometric types, the accelerator contract, the
//! intersection kernels, and the small supporting pieces (mesh data, film,
//! random numbers) the demo driver builds on.

pub mod bvh;
pub mod film;
pub mod geometry;
pub mod mesh;
pub mod rng;
pub mod triangle;
