// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// smartcropper-document — Image operations for SmartCropper.
//
// Provides the structural similarity (SSIM) scorer, perspective cropping of a
// document quadrilateral, the document enhancement filters (grayscale,
// denoise, contrast, binarization) and helpers for decoding/encoding images.

pub mod filter;
pub mod image;
pub mod scan;
pub mod ssim;

// Re-export the primary entry points so callers can use
// `smartcropper_document::compute_similarity` etc.
pub use crate::image::bitmap::Bitmap;
pub use scan::crop::crop;
pub use scan::enhance::DocumentEnhancer;
pub use ssim::{SsimScorer, compute_similarity};
