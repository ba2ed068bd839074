// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for SmartCropper.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SmartCropperError};

/// Order of the colour samples in a 3- or 4-channel pixel.
///
/// Decoded files are RGB. Raw camera and bitmap buffers are usually BGR,
/// which is the similarity scorer's default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    Rgb,
    #[default]
    Bgr,
}

impl ChannelOrder {
    /// Index of the red and blue samples within a pixel.
    pub fn red_blue(self) -> (usize, usize) {
        match self {
            Self::Rgb => (0, 2),
            Self::Bgr => (2, 0),
        }
    }
}

/// Which of the two compared images an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSlot {
    First,
    Second,
}

impl std::fmt::Display for ImageSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::First => write!(f, "first"),
            Self::Second => write!(f, "second"),
        }
    }
}

/// Read-only view of an 8-bit, row-major, interleaved pixel buffer.
///
/// The length invariant (`width * height * channels`) is checked on
/// construction. The channel count is not: consumers that only accept some
/// layouts reject the others with an error naming the image.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a> {
    width: u32,
    height: u32,
    channels: u8,
    data: &'a [u8],
}

impl<'a> ImageView<'a> {
    pub fn new(width: u32, height: u32, channels: u8, data: &'a [u8]) -> Result<Self> {
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(SmartCropperError::BufferSizeMismatch {
                width,
                height,
                channels,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Raw interleaved samples.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Number of pixels (not samples).
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.pixel_count() == 0
    }
}

/// Integer pixel coordinate of a crop corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropPoint {
    pub x: i32,
    pub y: i32,
}

impl CropPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &CropPoint) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        (dx * dx + dy * dy).sqrt()
    }
}

impl std::fmt::Display for CropPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
