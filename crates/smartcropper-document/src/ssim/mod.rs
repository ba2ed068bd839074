// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Structural similarity (SSIM) scoring of two images.
//
// Pipeline: grayscale → common size → Gaussian-windowed statistics →
// per-pixel SSIM → mean.

pub mod combine;
pub mod grayscale;
pub mod reconcile;
pub mod window;

use image::GrayImage;
use smartcropper_core::{ImageSlot, ImageView, Result, SimilarityConfig};
use tracing::{debug, instrument};

use crate::filter::{FloatField, GaussianKernel};
use combine::Constants;
use window::WindowStats;

/// Compares images with a fixed configuration.
///
/// The scorer holds no per-call state; one instance can serve any number of
/// threads.
#[derive(Debug, Clone, Default)]
pub struct SsimScorer {
    config: SimilarityConfig,
}

impl SsimScorer {
    pub fn new(config: SimilarityConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SimilarityConfig {
        &self.config
    }

    /// Mean SSIM of `a` against `b`.
    ///
    /// Returns `0.0` without further checks when either image has no pixels.
    /// Differing sizes are reconciled, never rejected. The only failure is a
    /// channel count outside {1, 3, 4}, reported for the offending image.
    #[instrument(
        skip_all,
        fields(
            a_w = a.width(), a_h = a.height(), a_channels = a.channels(),
            b_w = b.width(), b_h = b.height(), b_channels = b.channels(),
        )
    )]
    pub fn compute_similarity(&self, a: &ImageView<'_>, b: &ImageView<'_>) -> Result<f64> {
        if a.is_empty() || b.is_empty() {
            debug!("Empty input, returning sentinel score");
            return Ok(0.0);
        }

        let stats = self.window_stats(a, b)?;
        let score = combine::mean_similarity(&stats, self.constants());
        debug!(score, "SSIM computed");
        Ok(score)
    }

    /// Per-pixel SSIM field at the reconciled size, or `None` for empty input.
    #[instrument(skip_all)]
    pub fn similarity_map(
        &self,
        a: &ImageView<'_>,
        b: &ImageView<'_>,
    ) -> Result<Option<FloatField>> {
        if a.is_empty() || b.is_empty() {
            return Ok(None);
        }
        let stats = self.window_stats(a, b)?;
        Ok(Some(combine::similarity_map(&stats, self.constants())))
    }

    fn window_stats(&self, a: &ImageView<'_>, b: &ImageView<'_>) -> Result<WindowStats> {
        let kernel = GaussianKernel::new(self.config.window_size, self.config.sigma)?;
        let (gray_a, gray_b) = self.prepare(a, b)?;
        Ok(WindowStats::compute(&gray_a, &gray_b, &kernel))
    }

    /// Normalise both inputs and bring them to a common size.
    fn prepare(&self, a: &ImageView<'_>, b: &ImageView<'_>) -> Result<(GrayImage, GrayImage)> {
        let order = self.config.channel_order;
        let gray_a = grayscale::normalize(a, order, ImageSlot::First)?;
        let gray_b = grayscale::normalize(b, order, ImageSlot::Second)?;
        Ok(reconcile::reconcile(
            gray_a,
            gray_b,
            self.config.resize_filter,
        ))
    }

    fn constants(&self) -> Constants {
        Constants {
            c1: self.config.c1,
            c2: self.config.c2,
        }
    }
}

/// Mean SSIM of two images using the default configuration (BGR order,
/// 11×11 window, σ = 1.5).
pub fn compute_similarity(a: &ImageView<'_>, b: &ImageView<'_>) -> Result<f64> {
    SsimScorer::default().compute_similarity(a, b)
}
