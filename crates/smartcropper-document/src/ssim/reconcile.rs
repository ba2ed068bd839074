// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bring two grayscale images to a common size before comparison.

use image::GrayImage;
use image::imageops::{self, FilterType};
use smartcropper_core::ResizeFilter;
use tracing::debug;

/// Map the configured filter onto the `image` crate's resampler.
pub fn filter_type(filter: ResizeFilter) -> FilterType {
    match filter {
        ResizeFilter::Bilinear => FilterType::Triangle,
        ResizeFilter::CatmullRom => FilterType::CatmullRom,
        ResizeFilter::Lanczos3 => FilterType::Lanczos3,
    }
}

/// Dimensions both images are resampled to: the larger area wins.
///
/// Equal areas with different shapes resolve to the wider shape so that the
/// result does not depend on argument order.
pub fn target_size(a: (u32, u32), b: (u32, u32)) -> (u32, u32) {
    let area = |(w, h): (u32, u32)| u64::from(w) * u64::from(h);
    match area(a).cmp(&area(b)) {
        std::cmp::Ordering::Greater => a,
        std::cmp::Ordering::Less => b,
        std::cmp::Ordering::Equal => {
            if b.0 > a.0 {
                b
            } else {
                a
            }
        }
    }
}

/// Return `a` and `b` at identical dimensions.
///
/// Matching inputs are returned untouched. Otherwise each image is stretched
/// independently to [`target_size`]; differing aspect ratios are not
/// preserved.
pub fn reconcile(a: GrayImage, b: GrayImage, filter: ResizeFilter) -> (GrayImage, GrayImage) {
    if a.dimensions() == b.dimensions() {
        return (a, b);
    }

    let target = target_size(a.dimensions(), b.dimensions());
    let aspect = |(w, h): (u32, u32)| f64::from(w) / f64::from(h.max(1));
    debug!(
        a_w = a.width(),
        a_h = a.height(),
        b_w = b.width(),
        b_h = b.height(),
        target_w = target.0,
        target_h = target.1,
        aspect_a = aspect(a.dimensions()),
        aspect_b = aspect(b.dimensions()),
        "Reconciling image sizes"
    );

    (
        resize_to(a, target, filter),
        resize_to(b, target, filter),
    )
}

fn resize_to(image: GrayImage, (width, height): (u32, u32), filter: ResizeFilter) -> GrayImage {
    if image.dimensions() == (width, height) {
        return image;
    }
    imageops::resize(&image, width, height, filter_type(filter))
}
