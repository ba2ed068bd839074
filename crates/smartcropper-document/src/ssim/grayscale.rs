// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Channel reduction of 1/3/4-channel pixel buffers to 8-bit luma.

use image::GrayImage;
use smartcropper_core::{ChannelOrder, ImageSlot, ImageView, Result, SmartCropperError};

// BT.601 weights in 14-bit fixed point; they sum to 1 << 14.
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;
const LUMA_SHIFT: u32 = 14;

/// `0.299 R + 0.587 G + 0.114 B`, rounded.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let acc = u32::from(r) * LUMA_R + u32::from(g) * LUMA_G + u32::from(b) * LUMA_B;
    ((acc + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT) as u8
}

/// Reduce `view` to a freshly allocated grayscale image.
///
/// Single-channel input is copied. Three- and four-channel input is reduced
/// with [`luma`], reading red and blue according to `order`; alpha is
/// ignored. Any other channel count fails with `InvalidChannelCount`
/// carrying `slot`.
pub fn normalize(view: &ImageView<'_>, order: ChannelOrder, slot: ImageSlot) -> Result<GrayImage> {
    let channels = view.channels();
    let raw: Vec<u8> = match channels {
        1 => view.data().to_vec(),
        3 | 4 => {
            let (ri, bi) = order.red_blue();
            view.data()
                .chunks_exact(channels as usize)
                .map(|px| luma(px[ri], px[1], px[bi]))
                .collect()
        }
        _ => return Err(SmartCropperError::InvalidChannelCount { slot, channels }),
    };

    GrayImage::from_raw(view.width(), view.height(), raw).ok_or_else(|| {
        SmartCropperError::ImageError(format!(
            "{slot} image: grayscale buffer does not fit {}x{}",
            view.width(),
            view.height()
        ))
    })
}
