// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fold windowed statistics into the SSIM field and reduce it to a score.

use crate::filter::FloatField;

use super::window::WindowStats;

/// Stabilisation constants of the SSIM formula.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constants {
    pub c1: f64,
    pub c2: f64,
}

/// SSIM of one pixel from its local statistics.
///
/// ```text
///        (2 μa μb + C1) (2 σab + C2)
/// s = ---------------------------------
///     (μa² + μb² + C1) (σa² + σb² + C2)
/// ```
#[inline]
pub fn pixel_similarity(
    mean_a: f32,
    mean_b: f32,
    var_a: f32,
    var_b: f32,
    cov_ab: f32,
    k: Constants,
) -> f64 {
    let (ma, mb) = (f64::from(mean_a), f64::from(mean_b));
    let cov = f64::from(cov_ab);

    let numerator = (2.0 * ma * mb + k.c1) * (2.0 * cov + k.c2);
    let denominator = pixel_denominator(mean_a, mean_b, var_a, var_b, k);
    debug_assert!(
        denominator > 0.0,
        "SSIM denominator must be positive, got {denominator}"
    );
    numerator / denominator
}

/// `(μa² + μb² + C1) (σa² + σb² + C2)`, never below `C1 · C2` for
/// variances that are non-negative up to rounding.
#[inline]
pub fn pixel_denominator(mean_a: f32, mean_b: f32, var_a: f32, var_b: f32, k: Constants) -> f64 {
    let (ma, mb) = (f64::from(mean_a), f64::from(mean_b));
    let (va, vb) = (f64::from(var_a), f64::from(var_b));
    (ma * ma + mb * mb + k.c1) * (va + vb + k.c2)
}

fn for_each_pixel(stats: &WindowStats, k: Constants, mut f: impl FnMut(f64)) {
    let ma = stats.mean_a.as_slice();
    let mb = stats.mean_b.as_slice();
    let va = stats.var_a.as_slice();
    let vb = stats.var_b.as_slice();
    let cov = stats.cov_ab.as_slice();
    for i in 0..ma.len() {
        f(pixel_similarity(ma[i], mb[i], va[i], vb[i], cov[i], k));
    }
}

/// The per-pixel similarity field.
pub fn similarity_map(stats: &WindowStats, k: Constants) -> FloatField {
    let mut values = Vec::with_capacity(stats.mean_a.as_slice().len());
    for_each_pixel(stats, k, |s| values.push(s as f32));
    FloatField::from_vec(stats.mean_a.width(), stats.mean_a.height(), values)
}

/// Mean of the similarity field, without materialising it.
pub fn mean_similarity(stats: &WindowStats, k: Constants) -> f64 {
    let count = stats.mean_a.as_slice().len();
    if count == 0 {
        return 0.0;
    }
    let mut sum = 0.0f64;
    for_each_pixel(stats, k, |s| sum += s);
    sum / count as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    const K: Constants = Constants {
        c1: 6.5025,
        c2: 58.5225,
    };

    #[test]
    fn equal_statistics_score_one() {
        let s = pixel_similarity(87.25, 87.25, 310.5, 310.5, 310.5, K);
        assert_eq!(s, 1.0);
    }

    #[test]
    fn black_against_white_uniform() {
        let s = pixel_similarity(0.0, 255.0, 0.0, 0.0, 0.0, K);
        let expected = (K.c1 * K.c2) / ((65025.0 + K.c1) * K.c2);
        assert!((s - expected).abs() < 1e-15);
    }

    #[test]
    fn anti_correlated_structure_is_negative() {
        let s = pixel_similarity(128.0, 128.0, 1000.0, 1000.0, -1000.0, K);
        assert!(s < 0.0 && s >= -1.0, "got {s}");
    }

    #[test]
    fn zero_statistics_leave_constant_product() {
        let den = pixel_denominator(0.0, 0.0, 0.0, 0.0, K);
        assert_eq!(den, K.c1 * K.c2);
        assert_eq!(pixel_similarity(0.0, 0.0, 0.0, 0.0, 0.0, K), 1.0);
    }

    #[test]
    fn denominator_stays_above_constant_product_on_real_images() {
        use crate::filter::GaussianKernel;
        use image::{GrayImage, Luma};

        let checker = GrayImage::from_fn(40, 30, |x, y| {
            Luma([if (x / 2 + y / 2) % 2 == 0 { 0 } else { 255 }])
        });
        let mut state = 12_345u32;
        let noise = GrayImage::from_fn(40, 30, |_, _| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            Luma([(state >> 24) as u8])
        });
        let kernel = GaussianKernel::new(11, 1.5).unwrap();

        for (a, b) in [(&checker, &noise), (&noise, &noise), (&checker, &checker)] {
            let stats = WindowStats::compute(a, b, &kernel);
            let floor = K.c1 * K.c2 * (1.0 - 1e-3);
            for i in 0..stats.mean_a.as_slice().len() {
                let den = pixel_denominator(
                    stats.mean_a.as_slice()[i],
                    stats.mean_b.as_slice()[i],
                    stats.var_a.as_slice()[i],
                    stats.var_b.as_slice()[i],
                    K,
                );
                assert!(den >= floor, "denominator {den} at sample {i}");
            }
            let map = similarity_map(&stats, K);
            assert!(map.as_slice().iter().all(|s| s.is_finite() && s.abs() <= 1.0 + 1e-4));
        }
    }

    #[test]
    fn map_and_mean_agree() {
        let field = |v: f32| FloatField::from_vec(2, 2, vec![v; 4]);
        let mut stats = WindowStats {
            mean_a: field(10.0),
            mean_b: field(20.0),
            var_a: field(5.0),
            var_b: field(7.0),
            cov_ab: field(1.0),
        };
        stats.mean_b.row_mut(1)[1] = 10.0;
        let map = similarity_map(&stats, K);
        assert_eq!(map.width(), 2);
        let mean = mean_similarity(&stats, K);
        assert!((map.mean() - mean).abs() < 1e-6);
    }
}
