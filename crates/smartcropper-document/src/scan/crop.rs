// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective crop of a document quadrilateral to an upright rectangle.

use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use smartcropper_core::{CropPoint, Result, SmartCropperError};
use tracing::{debug, info, instrument};

/// Rotate the corner cycle so the corner nearest the image origin comes first.
///
/// Corners are expected as left-top, right-top, right-bottom, left-bottom.
/// Callers sometimes hand them over starting from another corner; the cyclic
/// order is kept, only the starting point moves. Ties keep the earliest
/// corner.
pub fn normalize_quad(points: [CropPoint; 4]) -> [CropPoint; 4] {
    let origin = CropPoint::new(0, 0);
    let mut nearest = 0;
    let mut best = f64::MAX;
    for (i, point) in points.iter().enumerate() {
        let distance = point.distance(&origin);
        if distance < best {
            best = distance;
            nearest = i;
        }
    }

    let mut quad = points;
    quad.rotate_left(nearest);
    quad
}

/// Output size of the crop: the mean length of opposite edges, truncated.
pub fn crop_size(quad: &[CropPoint; 4]) -> Result<(u32, u32)> {
    let [left_top, right_top, right_bottom, left_bottom] = quad;
    let width = (left_top.distance(right_top) + left_bottom.distance(right_bottom)) / 2.0;
    let height = (left_top.distance(left_bottom) + right_top.distance(right_bottom)) / 2.0;

    let (width, height) = (width as u32, height as u32);
    if width == 0 || height == 0 {
        return Err(SmartCropperError::InvalidQuad(format!(
            "corners {left_top} {right_top} {right_bottom} {left_bottom} enclose a {width}x{height} area"
        )));
    }
    Ok((width, height))
}

/// Warp the quadrilateral `points` of `image` onto an upright rectangle.
///
/// The corners are first normalised with [`normalize_quad`], the output is
/// sized with [`crop_size`], and pixels mapping outside the source are left
/// transparent black.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn crop(image: &DynamicImage, points: [CropPoint; 4]) -> Result<RgbaImage> {
    let quad = normalize_quad(points);
    let (out_w, out_h) = crop_size(&quad)?;
    debug!(
        left_top = %quad[0],
        right_top = %quad[1],
        right_bottom = %quad[2],
        left_bottom = %quad[3],
        out_w,
        out_h,
        "Crop quadrilateral normalised"
    );

    let src = quad.map(|p| (p.x as f32, p.y as f32));
    let dest = [
        (0.0, 0.0),
        (out_w as f32, 0.0),
        (out_w as f32, out_h as f32),
        (0.0, out_h as f32),
    ];
    let projection = Projection::from_control_points(src, dest).ok_or_else(|| {
        SmartCropperError::InvalidQuad(format!(
            "no projective transform maps {} {} {} {} to a rectangle",
            quad[0], quad[1], quad[2], quad[3]
        ))
    })?;

    let rgba = image.to_rgba8();
    let mut output = RgbaImage::new(out_w, out_h);
    warp_into(
        &rgba,
        &projection,
        Interpolation::Bilinear,
        Rgba([0, 0, 0, 0]),
        &mut output,
    );

    info!(out_w, out_h, "Perspective crop applied");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: [(i32, i32); 4]) -> [CropPoint; 4] {
        raw.map(|(x, y)| CropPoint::new(x, y))
    }

    #[test]
    fn quad_already_in_order_is_unchanged() {
        let quad = pts([(2, 3), (50, 1), (52, 40), (1, 44)]);
        assert_eq!(normalize_quad(quad), quad);
    }

    #[test]
    fn quad_is_rotated_to_start_near_origin() {
        let quad = pts([(90, 5), (90, 90), (5, 90), (3, 4)]);
        assert_eq!(
            normalize_quad(quad),
            pts([(3, 4), (90, 5), (90, 90), (5, 90)])
        );
    }

    #[test]
    fn crop_size_averages_opposite_edges() {
        // Top edge 100 long, bottom edge 80 long; sides 50 each.
        let quad = pts([(0, 0), (100, 0), (90, 50), (10, 50)]);
        let (w, h) = crop_size(&quad).unwrap();
        assert_eq!(w, 90);
        // Sides are sqrt(10^2 + 50^2) = 50.99, truncated.
        assert_eq!(h, 50);
    }

    #[test]
    fn far_apart_corners_do_not_overflow() {
        let quad = pts([
            (-2_000_000_000, 0),
            (2_000_000_000, 0),
            (2_000_000_000, 10),
            (-2_000_000_000, 10),
        ]);
        assert_eq!(crop_size(&quad).unwrap(), (4_000_000_000, 10));
    }

    #[test]
    fn collapsed_quad_is_rejected() {
        let quad = pts([(5, 5), (5, 5), (5, 5), (5, 5)]);
        assert!(matches!(
            crop_size(&quad),
            Err(SmartCropperError::InvalidQuad(_))
        ));
        let img = DynamicImage::ImageRgba8(RgbaImage::new(10, 10));
        assert!(crop(&img, quad).is_err());
    }

    #[test]
    fn axis_aligned_crop_copies_the_region() {
        let source = RgbaImage::from_fn(40, 30, |x, y| {
            Rgba([(x * 6) as u8, (y * 8) as u8, 100, 255])
        });
        let img = DynamicImage::ImageRgba8(source.clone());
        let quad = pts([(10, 5), (30, 5), (30, 25), (10, 25)]);

        let out = crop(&img, quad).unwrap();
        assert_eq!(out.dimensions(), (20, 20));
        for (x, y) in [(0u32, 0u32), (5, 7), (12, 3), (15, 15)] {
            let got = out.get_pixel(x, y).0;
            let want = source.get_pixel(x + 10, y + 5).0;
            for c in 0..4 {
                assert!(
                    (i32::from(got[c]) - i32::from(want[c])).abs() <= 1,
                    "pixel ({x},{y}) channel {c}: {got:?} vs {want:?}"
                );
            }
        }
    }

    #[test]
    fn rotated_corner_order_gives_same_crop() {
        let source = RgbaImage::from_fn(60, 60, |x, y| Rgba([x as u8 * 4, y as u8 * 4, 0, 255]));
        let img = DynamicImage::ImageRgba8(source);
        let ordered = pts([(5, 6), (50, 8), (52, 55), (4, 50)]);
        let mut shifted = ordered;
        shifted.rotate_left(2);
        assert_eq!(crop(&img, ordered).unwrap(), crop(&img, shifted).unwrap());
    }
}
