// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Floating-point image planes and separable Gaussian smoothing, shared by the
// similarity scorer and the enhancement filters.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::definitions::Image;
use imageproc::filter::separable_filter_equal;
use smartcropper_core::{Result, SmartCropperError};

/// Single-channel `f32` plane, row-major without padding.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatField {
    image: Image<Luma<f32>>,
}

impl FloatField {
    /// A zero-filled plane.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            image: ImageBuffer::new(width as u32, height as u32),
        }
    }

    /// Wrap existing samples.
    ///
    /// # Panics
    /// Panics if `data.len() != width * height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<f32>) -> Self {
        assert_eq!(data.len(), width * height, "field size mismatch");
        let image = ImageBuffer::from_raw(width as u32, height as u32, data)
            .expect("sample count checked against dimensions");
        Self { image }
    }

    /// Widen an 8-bit grayscale image.
    pub fn from_gray(gray: &GrayImage) -> Self {
        Self {
            image: ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
                Luma([f32::from(gray.get_pixel(x, y).0[0])])
            }),
        }
    }

    pub fn width(&self) -> usize {
        self.image.width() as usize
    }

    pub fn height(&self) -> usize {
        self.image.height() as usize
    }

    pub fn as_slice(&self) -> &[f32] {
        self.image.as_raw()
    }

    pub fn row(&self, y: usize) -> &[f32] {
        let start = y * self.width();
        &self.image.as_raw()[start..start + self.width()]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let width = self.width();
        let start = y * width;
        let samples: &mut [f32] = &mut self.image;
        &mut samples[start..start + width]
    }

    /// Apply `f` to every sample, producing a new plane.
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self {
            image: ImageBuffer::from_fn(self.image.width(), self.image.height(), |x, y| {
                Luma([f(self.image.get_pixel(x, y).0[0])])
            }),
        }
    }

    /// Combine two equally sized planes sample by sample.
    ///
    /// # Panics
    /// Panics if the dimensions differ.
    pub fn zip_map(&self, other: &Self, f: impl Fn(f32, f32) -> f32) -> Self {
        assert_eq!(
            self.image.dimensions(),
            other.image.dimensions(),
            "field dimensions differ"
        );
        Self {
            image: ImageBuffer::from_fn(self.image.width(), self.image.height(), |x, y| {
                Luma([f(
                    self.image.get_pixel(x, y).0[0],
                    other.image.get_pixel(x, y).0[0],
                )])
            }),
        }
    }

    /// Round and saturate back to 8 bits.
    pub fn to_gray(&self) -> GrayImage {
        GrayImage::from_fn(self.image.width(), self.image.height(), |x, y| {
            Luma([saturate_u8(self.image.get_pixel(x, y).0[0])])
        })
    }

    /// Separable correlation with `kernel` along both axes.
    ///
    /// Samples beyond the edge repeat the edge sample (`aaa|abcd|ddd`).
    pub fn blur(&self, kernel: &GaussianKernel) -> Self {
        if self.image.width() == 0 || self.image.height() == 0 {
            return self.clone();
        }
        Self {
            image: separable_filter_equal(&self.image, kernel.weights()),
        }
    }

    /// Arithmetic mean of all samples, accumulated in `f64`.
    pub fn mean(&self) -> f64 {
        let samples = self.as_slice();
        if samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = samples.iter().map(|&v| f64::from(v)).sum();
        sum / samples.len() as f64
    }
}

/// Round to nearest and clamp to `0..=255`.
pub fn saturate_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Normalised 1-D Gaussian weights of odd length.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianKernel {
    weights: Vec<f32>,
}

/// Binomial tables used for small kernels when no sigma is given.
const SMALL_KERNELS: [&[f32]; 4] = [
    &[1.0],
    &[0.25, 0.5, 0.25],
    &[0.0625, 0.25, 0.375, 0.25, 0.0625],
    &[0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125],
];

impl GaussianKernel {
    /// Build a kernel of `size` taps.
    ///
    /// A non-positive `sigma` is derived from the size:
    /// `0.3 * ((size - 1) * 0.5 - 1) + 0.8`, except that sizes up to 7 then
    /// use the fixed binomial tables.
    pub fn new(size: usize, sigma: f64) -> Result<Self> {
        if size == 0 || size % 2 == 0 {
            return Err(SmartCropperError::InvalidParameter(format!(
                "gaussian kernel size must be odd and positive, got {size}"
            )));
        }
        if !sigma.is_finite() {
            return Err(SmartCropperError::InvalidParameter(format!(
                "gaussian sigma must be finite, got {sigma}"
            )));
        }

        if sigma <= 0.0 && size <= 7 {
            return Ok(Self {
                weights: SMALL_KERNELS[size / 2].to_vec(),
            });
        }

        let sigma = if sigma > 0.0 {
            sigma
        } else {
            0.3 * ((size as f64 - 1.0) * 0.5 - 1.0) + 0.8
        };
        let scale = -0.5 / (sigma * sigma);
        let centre = (size as f64 - 1.0) * 0.5;
        let raw: Vec<f64> = (0..size)
            .map(|i| {
                let d = i as f64 - centre;
                (scale * d * d).exp()
            })
            .collect();
        let sum: f64 = raw.iter().sum();
        Ok(Self {
            weights: raw.iter().map(|&w| (w / sum) as f32).collect(),
        })
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn size(&self) -> usize {
        self.weights.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_weights_sum_to_one() {
        let kernel = GaussianKernel::new(11, 1.5).unwrap();
        assert_eq!(kernel.size(), 11);
        let sum: f32 = kernel.weights().iter().sum();
        assert!((sum - 1.0).abs() < 1e-6, "sum = {sum}");
        // Symmetric and peaked at the centre.
        let w = kernel.weights();
        for i in 0..5 {
            assert!((w[i] - w[10 - i]).abs() < 1e-9);
            assert!(w[i] < w[i + 1]);
        }
    }

    #[test]
    fn small_kernel_uses_binomial_table() {
        let kernel = GaussianKernel::new(5, 0.0).unwrap();
        assert_eq!(kernel.weights(), &[0.0625, 0.25, 0.375, 0.25, 0.0625]);
    }

    #[test]
    fn derived_sigma_for_block_eleven_is_two() {
        let derived = GaussianKernel::new(11, 0.0).unwrap();
        let explicit = GaussianKernel::new(11, 2.0).unwrap();
        for (a, b) in derived.weights().iter().zip(explicit.weights()) {
            assert!((a - b).abs() < 1e-7);
        }
    }

    #[test]
    fn even_kernel_is_rejected() {
        assert!(GaussianKernel::new(4, 1.0).is_err());
        assert!(GaussianKernel::new(0, 1.0).is_err());
    }

    #[test]
    fn blur_keeps_constant_plane_constant() {
        let field = FloatField::from_vec(7, 4, vec![200.0; 28]);
        let kernel = GaussianKernel::new(11, 1.5).unwrap();
        let blurred = field.blur(&kernel);
        for &v in blurred.as_slice() {
            assert!((v - 200.0).abs() < 1e-3, "got {v}");
        }
    }

    #[test]
    fn blur_spreads_an_impulse() {
        let mut field = FloatField::new(9, 9);
        field.row_mut(4)[4] = 1.0;
        let kernel = GaussianKernel::new(3, 0.0).unwrap();
        let blurred = field.blur(&kernel);
        assert!((blurred.row(4)[4] - 0.25).abs() < 1e-7);
        assert!((blurred.row(4)[3] - 0.125).abs() < 1e-7);
        assert!((blurred.row(3)[3] - 0.0625).abs() < 1e-7);
        assert_eq!(blurred.row(0)[0], 0.0);
        assert!((blurred.mean() * 81.0 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn blur_repeats_edge_samples() {
        // A step at the left edge: replicated padding keeps the edge value.
        let field = FloatField::from_vec(5, 1, vec![10.0, 0.0, 0.0, 0.0, 0.0]);
        let kernel = GaussianKernel::new(3, 0.0).unwrap();
        let blurred = field.blur(&kernel);
        // 0.25 * 10 (padding) + 0.5 * 10 + 0.25 * 0
        assert!((blurred.row(0)[0] - 7.5).abs() < 1e-6);
        assert!((blurred.row(0)[1] - 2.5).abs() < 1e-6);
        assert_eq!(blurred.row(0)[4], 0.0);
    }

    #[test]
    fn blur_of_empty_plane_is_empty() {
        let field = FloatField::new(0, 4);
        let kernel = GaussianKernel::new(11, 1.5).unwrap();
        assert_eq!(field.blur(&kernel).as_slice().len(), 0);
    }

    #[test]
    fn kernel_wider_than_plane() {
        let field = FloatField::from_vec(2, 2, vec![1.0, 3.0, 5.0, 7.0]);
        let kernel = GaussianKernel::new(11, 1.5).unwrap();
        let blurred = field.blur(&kernel);
        let mean: f32 = blurred.as_slice().iter().sum::<f32>() / 4.0;
        assert!((mean - 4.0).abs() < 1e-4);
        assert!(blurred.as_slice().iter().all(|v| (1.0..=7.0).contains(v)));
    }

    #[test]
    fn row_mut_writes_through() {
        let mut field = FloatField::new(3, 2);
        field.row_mut(1)[2] = 9.0;
        assert_eq!(field.as_slice(), &[0.0, 0.0, 0.0, 0.0, 0.0, 9.0]);
    }

    #[test]
    fn to_gray_saturates() {
        let field = FloatField::from_vec(3, 1, vec![-4.0, 127.6, 300.0]);
        assert_eq!(field.to_gray().as_raw(), &vec![0u8, 128, 255]);
    }
}
