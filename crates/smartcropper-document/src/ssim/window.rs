// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Local (Gaussian-windowed) means, variances and covariance of an image pair.

use image::GrayImage;

use crate::filter::{FloatField, GaussianKernel};

/// Per-pixel windowed statistics of two equally sized images.
#[derive(Debug, Clone)]
pub struct WindowStats {
    pub mean_a: FloatField,
    pub mean_b: FloatField,
    pub var_a: FloatField,
    pub var_b: FloatField,
    pub cov_ab: FloatField,
}

impl WindowStats {
    /// Blur `A`, `B`, `A²`, `B²` and `A·B` with `kernel` (edge samples
    /// repeated) and derive
    ///
    /// - `mean = blur(X)`
    /// - `var = blur(X²) - mean²`
    /// - `cov = blur(A·B) - meanA·meanB`
    ///
    /// Tiny negative variances from rounding are kept as they are.
    ///
    /// # Panics
    /// Panics if `a` and `b` differ in size.
    pub fn compute(a: &GrayImage, b: &GrayImage, kernel: &GaussianKernel) -> Self {
        assert_eq!(a.dimensions(), b.dimensions(), "reconcile sizes first");

        let fa = FloatField::from_gray(a);
        let fb = FloatField::from_gray(b);
        let a_sq = fa.map(|v| v * v);
        let b_sq = fb.map(|v| v * v);
        let ab = fa.zip_map(&fb, |x, y| x * y);

        let blur = |field: &FloatField| field.blur(kernel);
        let mean_a = blur(&fa);
        let mean_b = blur(&fb);

        let var_a = blur(&a_sq).zip_map(&mean_a, |s, m| s - m * m);
        let var_b = blur(&b_sq).zip_map(&mean_b, |s, m| s - m * m);
        let mean_ab = mean_a.zip_map(&mean_b, |x, y| x * y);
        let cov_ab = blur(&ab).zip_map(&mean_ab, |s, m| s - m);

        Self {
            mean_a,
            mean_b,
            var_a,
            var_b,
            cov_ab,
        }
    }
}
