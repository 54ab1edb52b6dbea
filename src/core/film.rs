//! Greyscale accumulation film for the demo renderer.

// std
use std::path::Path;
// bvh
use crate::core::bvh::{clamp_t, gamma_correct, Float};

/// A width × height grid of accumulating samples. Pixel (0, 0) is the top
/// left of the written image.
pub struct Film {
    width: u32,
    height: u32,
    pixels: Vec<Float>,
}

impl Film {
    pub fn new(width: u32, height: u32) -> Self {
        Film {
            width,
            height,
            pixels: vec![0.0; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn add(&mut self, x: u32, y: u32, value: Float) {
        self.pixels[(y * self.width + x) as usize] += value;
    }

    /// Write the film as an 8-bit greyscale PNG, normalized to the
    /// brightest sample and gamma encoded.
    pub fn write_png<P: AsRef<Path>>(&self, path: P) -> image::ImageResult<()> {
        let max = self.pixels.iter().cloned().fold(0.0 as Float, Float::max);
        let scale = if max > 0.0 { 1.0 / max } else { 0.0 };

        let mut buffer: Vec<u8> = Vec::with_capacity(self.pixels.len());
        for p in &self.pixels {
            let value = gamma_correct(clamp_t(scale * p, 0.0, 1.0));
            buffer.push((value * 255.0 + 0.5) as u8);
        }

        image::save_buffer(
            path,
            &buffer,
            self.width,
            self.height,
            image::ColorType::L8,
        )
    }
}
