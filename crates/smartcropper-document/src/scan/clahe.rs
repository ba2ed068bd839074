// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contrast-limited adaptive histogram equalisation (CLAHE).

use image::{GrayImage, Luma};

use crate::filter::saturate_u8;

/// Equalise `gray` tile by tile with a clipped histogram.
///
/// The image is split into at most `tiles` × `tiles` regions (fewer when the
/// image is smaller than the grid). Each region's histogram is clipped at
/// `clip_limit` times the uniform bin height and the excess is spread over
/// all bins. Output pixels interpolate bilinearly between the mappings of
/// the four nearest tile centres, which hides the tile seams.
pub fn clahe(gray: &GrayImage, clip_limit: f32, tiles: u32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }
    let tiles_x = tiles.clamp(1, width);
    let tiles_y = tiles.clamp(1, height);

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        let (y0, y1) = span(ty, tiles_y, height);
        for tx in 0..tiles_x {
            let (x0, x1) = span(tx, tiles_x, width);
            let mut hist = [0u32; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[gray.get_pixel(x, y).0[0] as usize] += 1;
                }
            }
            luts.push(tile_lut(&mut hist, (x1 - x0) * (y1 - y0), clip_limit));
        }
    }

    let tile_w = width as f32 / tiles_x as f32;
    let tile_h = height as f32 / tiles_y as f32;
    let lut = |tx: u32, ty: u32| &luts[(ty * tiles_x + tx) as usize];

    GrayImage::from_fn(width, height, |x, y| {
        let (tx0, tx1, wx) = neighbours(x, tile_w, tiles_x);
        let (ty0, ty1, wy) = neighbours(y, tile_h, tiles_y);
        let v = gray.get_pixel(x, y).0[0] as usize;

        let top = (1.0 - wx) * f32::from(lut(tx0, ty0)[v]) + wx * f32::from(lut(tx1, ty0)[v]);
        let bottom = (1.0 - wx) * f32::from(lut(tx0, ty1)[v]) + wx * f32::from(lut(tx1, ty1)[v]);
        Luma([saturate_u8((1.0 - wy) * top + wy * bottom)])
    })
}

/// Half-open pixel range of tile `index` out of `count` over `len` pixels.
fn span(index: u32, count: u32, len: u32) -> (u32, u32) {
    let start = u64::from(index) * u64::from(len) / u64::from(count);
    let end = u64::from(index + 1) * u64::from(len) / u64::from(count);
    (start as u32, end as u32)
}

/// The two tiles whose centres bracket `pos`, and the weight of the second.
fn neighbours(pos: u32, tile_size: f32, count: u32) -> (u32, u32, f32) {
    let f = (pos as f32 + 0.5) / tile_size - 0.5;
    let lower = f.floor();
    let weight = f - lower;
    let last = i64::from(count) - 1;
    let first = (lower as i64).clamp(0, last) as u32;
    let second = (lower as i64 + 1).clamp(0, last) as u32;
    (first, second, weight)
}

/// Clip, redistribute and integrate one tile histogram into a lookup table.
fn tile_lut(hist: &mut [u32; 256], area: u32, clip_limit: f32) -> [u8; 256] {
    let limit = ((clip_limit * area as f32 / 256.0) as u32).max(1);

    let mut clipped = 0u32;
    for bin in hist.iter_mut() {
        if *bin > limit {
            clipped += *bin - limit;
            *bin = limit;
        }
    }

    let batch = clipped / 256;
    let residual = (clipped % 256) as usize;
    for bin in hist.iter_mut() {
        *bin += batch;
    }
    if residual > 0 {
        let step = (256 / residual).max(1);
        for bin in hist.iter_mut().step_by(step).take(residual) {
            *bin += 1;
        }
    }

    let scale = 255.0 / area as f32;
    let mut lut = [0u8; 256];
    let mut cumulative = 0u32;
    for (entry, &bin) in lut.iter_mut().zip(hist.iter()) {
        cumulative += bin;
        *entry = saturate_u8(cumulative as f32 * scale);
    }
    lut
}
