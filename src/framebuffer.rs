//! RGBA pixel buffer for the raster backend.
//!
//! Rows are padded to 64 bytes so the pattern fills in [`Framebuffer::clear`]
//! stay aligned. Translucent spans and luminance statistics use trueno vectors.

use crate::color::Rgba;
use crate::error::{Error, Result};
use trueno::Vector;

/// Row alignment in bytes (one AVX-512 register).
const SIMD_ALIGNMENT: usize = 64;

/// Stride-padded RGBA framebuffer.
///
/// # SIMD Acceleration
///
/// `clear()` and `fill_rect()` copy whole 64-byte patterns; translucent spans
/// and luminance statistics go through trueno vectors, which pick the best
/// backend (SSE2/AVX2/AVX512/NEON) at runtime.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    /// RGBA pixels in row-major order, `stride` bytes per row.
    pixels: Vec<u8>,
    stride: usize,
}

impl Framebuffer {
    /// Create a transparent framebuffer.
    ///
    /// # Errors
    ///
    /// Returns an error if width or height is zero.
    ///
    /// # Example
    ///
    /// ```
    /// use formant_viz::framebuffer::Framebuffer;
    ///
    /// let fb = Framebuffer::new(800, 600).unwrap();
    /// assert_eq!(fb.width(), 800);
    /// assert_eq!(fb.height(), 600);
    /// ```
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }

        let row_bytes = (width as usize) * 4;
        let stride = (row_bytes + SIMD_ALIGNMENT - 1) & !(SIMD_ALIGNMENT - 1);

        Ok(Self { width, height, pixels: vec![0; stride * (height as usize)], stride })
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Row width in bytes, including padding.
    #[must_use]
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// Total number of pixels.
    #[must_use]
    pub const fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Raw pixel data, including row padding.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// One row of pixels without padding.
    #[must_use]
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = (y as usize) * self.stride;
        Some(&self.pixels[start..start + (self.width as usize) * 4])
    }

    /// Clear the framebuffer to a solid color.
    pub fn clear(&mut self, color: Rgba) {
        let [r, g, b, a] = color.to_array();
        let mut pattern = [0u8; SIMD_ALIGNMENT];
        for px in pattern.chunks_exact_mut(4) {
            px.copy_from_slice(&[r, g, b, a]);
        }

        let row_bytes = (self.width as usize) * 4;
        for row in self.pixels.chunks_exact_mut(self.stride) {
            let row = &mut row[..row_bytes];
            let mut chunks = row.chunks_exact_mut(SIMD_ALIGNMENT);
            for chunk in &mut chunks {
                chunk.copy_from_slice(&pattern);
            }
            for px in chunks.into_remainder().chunks_exact_mut(4) {
                px.copy_from_slice(&[r, g, b, a]);
            }
        }
    }

    /// Fill a rectangle with a solid color, clamped to the buffer.
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgba) {
        let x1 = x.min(self.width);
        let y1 = y.min(self.height);
        let x2 = x.saturating_add(w).min(self.width);
        let y2 = y.saturating_add(h).min(self.height);

        if x1 >= x2 || y1 >= y2 {
            return;
        }

        let rgba = color.to_array();
        let span = (x2 - x1) as usize * 4;
        for row_y in y1..y2 {
            let start = self.pixel_index(x1, row_y);
            for px in self.pixels[start..start + span].chunks_exact_mut(4) {
                px.copy_from_slice(&rgba);
            }
        }
    }

    /// Color at a pixel, or `None` out of bounds.
    #[must_use]
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }

        let idx = self.pixel_index(x, y);
        let mut rgba = [0u8; 4];
        rgba.copy_from_slice(&self.pixels[idx..idx + 4]);
        Some(Rgba::from_array(rgba))
    }

    /// Overwrite a pixel; out-of-bounds writes are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        if x >= self.width || y >= self.height {
            return;
        }

        let idx = self.pixel_index(x, y);
        self.pixels[idx..idx + 4].copy_from_slice(&color.to_array());
    }

    /// Composite a color over one pixel.
    ///
    /// Uses the "over" operator:
    /// `out = src * src_alpha + dst * dst_alpha * (1 - src_alpha)`
    pub fn blend_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        if x >= self.width || y >= self.height || color.a == 0 {
            return;
        }

        let idx = self.pixel_index(x, y);
        let src_a = f32::from(color.a) / 255.0;
        let dst_a = f32::from(self.pixels[idx + 3]) / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);

        let blend = |src: u8, dst: u8| -> u8 {
            let out = (f32::from(src) * src_a + f32::from(dst) * dst_a * (1.0 - src_a)) / out_a;
            out.round().clamp(0.0, 255.0) as u8
        };

        self.pixels[idx] = blend(color.r, self.pixels[idx]);
        self.pixels[idx + 1] = blend(color.g, self.pixels[idx + 1]);
        self.pixels[idx + 2] = blend(color.b, self.pixels[idx + 2]);
        self.pixels[idx + 3] = (out_a * 255.0).round() as u8;
    }

    /// Blend a constant color over the run `[x_start, x_end)` of row `y`.
    ///
    /// Polygon interiors are filled span by span. The run goes through one
    /// trueno pass computing `out = src * a + dst * (1 - a)` per channel, with
    /// the destination alpha pushed toward opaque.
    pub fn blend_span(&mut self, y: u32, x_start: u32, x_end: u32, color: Rgba) {
        let x_end = x_end.min(self.width);
        if y >= self.height || x_start >= x_end || color.a == 0 {
            return;
        }
        if color.a == 255 {
            self.fill_rect(x_start, y, x_end - x_start, 1, color);
            return;
        }

        let alpha = f32::from(color.a) / 255.0;
        let start = self.pixel_index(x_start, y);
        let len = (x_end - x_start) as usize * 4;
        let src: Vec<f32> = [color.r, color.g, color.b, 255]
            .iter()
            .map(|&c| f32::from(c))
            .cycle()
            .take(len)
            .collect();
        let dst: Vec<f32> =
            self.pixels[start..start + len].iter().map(|&c| f32::from(c)).collect();

        let src_vec = Vector::from_vec(src);
        let dst_vec = Vector::from_vec(dst);
        if let (Ok(src_scaled), Ok(dst_scaled)) = (
            src_vec.mul(&Vector::from_vec(vec![alpha; len])),
            dst_vec.mul(&Vector::from_vec(vec![1.0 - alpha; len])),
        ) {
            if let Ok(result) = src_scaled.add(&dst_scaled) {
                let run = &mut self.pixels[start..start + len];
                for (out, &v) in run.iter_mut().zip(result.as_slice()) {
                    *out = v.round().clamp(0.0, 255.0) as u8;
                }
            }
        }
    }

    /// Min, max and mean BT.709 luminance over all pixels.
    #[must_use]
    pub fn luminance_stats(&self) -> (f32, f32, f32) {
        let luminances: Vec<f32> = (0..self.height)
            .filter_map(|y| self.row(y))
            .flat_map(|row| row.chunks_exact(4))
            .map(|px| {
                0.2126 * f32::from(px[0]) + 0.7152 * f32::from(px[1]) + 0.0722 * f32::from(px[2])
            })
            .collect();

        let vec = Vector::from_vec(luminances);
        let min = vec.min().unwrap_or(0.0);
        let max = vec.max().unwrap_or(255.0);
        let mean = vec.mean().unwrap_or(127.5);

        (min, max, mean)
    }

    /// Number of pixels exactly equal to `color`.
    #[must_use]
    pub fn count_color(&self, color: Rgba) -> usize {
        let rgba = color.to_array();
        (0..self.height)
            .filter_map(|y| self.row(y))
            .flat_map(|row| row.chunks_exact(4))
            .filter(|px| **px == rgba)
            .count()
    }

    #[inline]
    fn pixel_index(&self, x: u32, y: u32) -> usize {
        (y as usize) * self.stride + (x as usize) * 4
    }

    /// Pixel data without stride padding, as PNG expects.
    #[must_use]
    pub fn to_compact_pixels(&self) -> Vec<u8> {
        let row_bytes = (self.width as usize) * 4;
        if self.stride == row_bytes {
            return self.pixels[..row_bytes * (self.height as usize)].to_vec();
        }

        let mut compact = Vec::with_capacity(row_bytes * (self.height as usize));
        for row in self.pixels.chunks_exact(self.stride) {
            compact.extend_from_slice(&row[..row_bytes]);
        }
        compact
    }
}
