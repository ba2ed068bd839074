// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for SmartCropper.

use thiserror::Error;

use crate::types::ImageSlot;

/// Top-level error type for all SmartCropper operations.
#[derive(Debug, Error)]
pub enum SmartCropperError {
    // -- Input contract --
    #[error("{slot} image has {channels} channels; expected 1, 3 or 4")]
    InvalidChannelCount { slot: ImageSlot, channels: u8 },

    #[error(
        "pixel buffer for {width}x{height}x{channels} image holds {actual} bytes, expected {expected}"
    )]
    BufferSizeMismatch {
        width: u32,
        height: u32,
        channels: u8,
        expected: usize,
        actual: usize,
    },

    #[error("unsupported pixel format: {0}")]
    UnsupportedPixelFormat(String),

    // -- Document operations --
    #[error("invalid crop quadrilateral: {0}")]
    InvalidQuad(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SmartCropperError>;
