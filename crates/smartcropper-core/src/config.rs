// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Processing configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SmartCropperError};
use crate::types::ChannelOrder;

/// Resampling filter used when two compared images differ in size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    #[default]
    Bilinear,
    CatmullRom,
    Lanczos3,
}

/// Parameters of the structural similarity scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Sample order of 3- and 4-channel inputs.
    pub channel_order: ChannelOrder,
    /// Side of the square Gaussian window (odd).
    pub window_size: usize,
    /// Standard deviation of the Gaussian window.
    pub sigma: f64,
    /// Luminance stabilisation constant, (0.01 * 255)^2.
    pub c1: f64,
    /// Contrast stabilisation constant, (0.03 * 255)^2.
    pub c2: f64,
    /// Filter used by the size reconciler.
    pub resize_filter: ResizeFilter,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            channel_order: ChannelOrder::Bgr,
            window_size: 11,
            sigma: 1.5,
            c1: 6.5025,
            c2: 58.5225,
            resize_filter: ResizeFilter::Bilinear,
        }
    }
}

impl SimilarityConfig {
    /// Same defaults, for RGB-ordered input such as decoded image files.
    pub fn rgb() -> Self {
        Self {
            channel_order: ChannelOrder::Rgb,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_odd_size("window_size", self.window_size, 1)?;
        if !self.sigma.is_finite() || self.sigma < 0.0 {
            return Err(invalid(format!(
                "sigma must be finite and non-negative, got {}",
                self.sigma
            )));
        }
        if !(self.c1 > 0.0 && self.c2 > 0.0) {
            return Err(invalid(format!(
                "stabilisation constants must be positive, got c1={} c2={}",
                self.c1, self.c2
            )));
        }
        Ok(())
    }
}

/// Parameters of the document enhancement filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceConfig {
    /// Gaussian kernel side used by `denoise` (odd).
    pub denoise_kernel: usize,
    /// CLAHE clip limit, relative to a uniform histogram.
    pub clahe_clip_limit: f32,
    /// CLAHE tile grid (tiles per axis).
    pub clahe_tiles: u32,
    /// Neighbourhood side of the adaptive threshold (odd, >= 3).
    pub threshold_block_size: usize,
    /// Constant subtracted from the local mean before thresholding.
    pub threshold_offset: f32,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            denoise_kernel: 5,
            clahe_clip_limit: 3.0,
            clahe_tiles: 8,
            threshold_block_size: 11,
            threshold_offset: 2.0,
        }
    }
}

impl EnhanceConfig {
    pub fn validate(&self) -> Result<()> {
        check_odd_size("denoise_kernel", self.denoise_kernel, 1)?;
        check_odd_size("threshold_block_size", self.threshold_block_size, 3)?;
        if !(self.clahe_clip_limit > 0.0 && self.clahe_clip_limit.is_finite()) {
            return Err(invalid(format!(
                "clahe_clip_limit must be positive, got {}",
                self.clahe_clip_limit
            )));
        }
        if self.clahe_tiles == 0 {
            return Err(invalid("clahe_tiles must be at least 1".into()));
        }
        if !self.threshold_offset.is_finite() {
            return Err(invalid("threshold_offset must be finite".into()));
        }
        Ok(())
    }
}

/// Complete settings, usually loaded from a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub similarity: SimilarityConfig,
    pub enhance: EnhanceConfig,
}

impl AppConfig {
    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        self.similarity.validate()?;
        self.enhance.validate()
    }
}

fn check_odd_size(name: &str, value: usize, min: usize) -> Result<()> {
    if value < min || value % 2 == 0 {
        return Err(invalid(format!(
            "{name} must be odd and at least {min}, got {value}"
        )));
    }
    Ok(())
}

fn invalid(message: String) -> SmartCropperError {
    SmartCropperError::InvalidParameter(message)
}
