// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// 8-bit sRGB <-> CIE L*a*b* (D65), with L scaled to 0..=255 and a/b offset
// by 128 so that every component fits a byte.

use palette::{FromColor, IntoColor, Lab, LinSrgb, Srgb};

use crate::filter::saturate_u8;

/// `[R, G, B]` → `[L, a, b]`, all 8-bit.
pub fn rgb_to_lab([r, g, b]: [u8; 3]) -> [u8; 3] {
    let srgb: Srgb<f32> = Srgb::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
    );
    let linear: LinSrgb<f32> = srgb.into_linear();
    let lab: Lab = Lab::from_color(linear);
    [
        saturate_u8(lab.l * 255.0 / 100.0),
        saturate_u8(lab.a + 128.0),
        saturate_u8(lab.b + 128.0),
    ]
}

/// `[L, a, b]` → `[R, G, B]`, inverse of [`rgb_to_lab`] up to quantisation.
pub fn lab_to_rgb([l, a, b]: [u8; 3]) -> [u8; 3] {
    let lab: Lab = Lab::new(
        f32::from(l) * 100.0 / 255.0,
        f32::from(a) - 128.0,
        f32::from(b) - 128.0,
    );
    let linear: LinSrgb<f32> = lab.into_color();
    let srgb: Srgb<f32> = Srgb::from_linear(linear);
    [
        saturate_u8(srgb.red.clamp(0.0, 1.0) * 255.0),
        saturate_u8(srgb.green.clamp(0.0, 1.0) * 255.0),
        saturate_u8(srgb.blue.clamp(0.0, 1.0) * 255.0),
    ]
}
