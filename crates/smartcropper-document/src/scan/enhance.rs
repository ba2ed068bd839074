// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document enhancement filters and the combined clean-up pipeline for
// cropped pages.

use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};
use smartcropper_core::{EnhanceConfig, Result, SmartCropperError};
use tracing::{debug, info, instrument};

use crate::filter::{FloatField, GaussianKernel, saturate_u8};
use crate::scan::clahe::clahe;
use crate::scan::lab::{lab_to_rgb, rgb_to_lab};
use crate::ssim::grayscale::luma;

/// Enhances photographed document pages.
///
/// Each filter consumes `self` and returns the enhancer wrapping the
/// filtered image, so steps chain:
///
/// ```ignore
/// let page = DocumentEnhancer::open("page.jpg")?
///     .grayscale()
///     .denoise()
///     .binarize()
///     .into_dynamic();
/// ```
///
/// Decoded images are RGB(A); luma uses the BT.601 weights.
pub struct DocumentEnhancer {
    /// The working image.
    image: DynamicImage,
    config: EnhanceConfig,
    denoise_kernel: GaussianKernel,
    threshold_kernel: GaussianKernel,
}

impl DocumentEnhancer {
    // -- Construction ---------------------------------------------------------

    /// Wrap a decoded image using the given settings.
    pub fn with_config(image: DynamicImage, config: EnhanceConfig) -> Result<Self> {
        config.validate()?;
        let denoise_kernel = GaussianKernel::new(config.denoise_kernel, 0.0)?;
        let threshold_kernel = GaussianKernel::new(config.threshold_block_size, 0.0)?;
        Ok(Self {
            image,
            config,
            denoise_kernel,
            threshold_kernel,
        })
    }

    /// Wrap a decoded image using the default settings.
    pub fn from_dynamic(image: DynamicImage) -> Result<Self> {
        Self::with_config(image, EnhanceConfig::default())
    }

    /// Decode raw image bytes (JPEG, PNG, ...).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(data).map_err(|err| {
            SmartCropperError::ImageError(format!("failed to decode document image: {}", err))
        })?;
        info!(
            width = image.width(),
            height = image.height(),
            "Document image loaded"
        );
        Self::from_dynamic(image)
    }

    /// Open an image file.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let image = image::open(path.as_ref()).map_err(|err| {
            SmartCropperError::ImageError(format!(
                "failed to open document image {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        Self::from_dynamic(image)
    }

    // -- Accessors ------------------------------------------------------------

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    pub fn config(&self) -> &EnhanceConfig {
        &self.config
    }

    fn replace(self, image: DynamicImage) -> Self {
        Self { image, ..self }
    }

    // -- Filters --------------------------------------------------------------

    /// Reduce to single-channel luma.
    #[instrument(skip(self))]
    pub fn grayscale(self) -> Self {
        info!("Converting to grayscale");
        let gray = to_luma(&self.image);
        self.replace(DynamicImage::ImageLuma8(gray))
    }

    /// Gaussian smoothing of every channel (alpha included).
    #[instrument(skip(self), fields(kernel = self.denoise_kernel.size()))]
    pub fn denoise(self) -> Self {
        info!("Denoising");
        let kernel = &self.denoise_kernel;
        let blur = |field: FloatField| field.blur(kernel);

        let image = match &self.image {
            DynamicImage::ImageLuma8(gray) => {
                DynamicImage::ImageLuma8(blur(FloatField::from_gray(gray)).to_gray())
            }
            other => DynamicImage::ImageRgba8(map_channels(&other.to_rgba8(), blur)),
        };
        self.replace(image)
    }

    /// Contrast-limited adaptive histogram equalisation.
    ///
    /// Grayscale images are equalised directly. Colour images are equalised
    /// on the L* channel of L*a*b* only, leaving hue and alpha alone.
    #[instrument(skip(self), fields(clip = self.config.clahe_clip_limit, tiles = self.config.clahe_tiles))]
    pub fn enhance_contrast(self) -> Self {
        info!("Enhancing contrast");
        let (clip, tiles) = (self.config.clahe_clip_limit, self.config.clahe_tiles);

        let image = match &self.image {
            DynamicImage::ImageLuma8(gray) => DynamicImage::ImageLuma8(clahe(gray, clip, tiles)),
            other => {
                let rgba = other.to_rgba8();
                let lab: Vec<[u8; 3]> = rgba
                    .pixels()
                    .map(|p| rgb_to_lab([p.0[0], p.0[1], p.0[2]]))
                    .collect();
                let lightness = GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
                    Luma([lab[(y * rgba.width() + x) as usize][0]])
                });
                let equalised = clahe(&lightness, clip, tiles);
                debug!("Lightness channel equalised");

                let out = RgbaImage::from_fn(rgba.width(), rgba.height(), |x, y| {
                    let [_, a, b] = lab[(y * rgba.width() + x) as usize];
                    let [r, g, bl] = lab_to_rgb([equalised.get_pixel(x, y).0[0], a, b]);
                    Rgba([r, g, bl, rgba.get_pixel(x, y).0[3]])
                });
                DynamicImage::ImageRgba8(out)
            }
        };
        self.replace(image)
    }

    /// Adaptive Gaussian thresholding to pure black and white.
    ///
    /// A pixel turns white when it is brighter than its Gaussian-weighted
    /// neighbourhood mean (rounded to 8 bits) minus the configured offset.
    #[instrument(skip(self), fields(block = self.threshold_kernel.size(), offset = self.config.threshold_offset))]
    pub fn binarize(self) -> Self {
        info!("Applying adaptive binarization");
        let gray = to_luma(&self.image);
        let mean = FloatField::from_gray(&gray).blur(&self.threshold_kernel);
        let offset = self.config.threshold_offset.ceil() as i32;

        let binary = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            let local = i32::from(saturate_u8(mean.row(y as usize)[x as usize]));
            let value = i32::from(gray.get_pixel(x, y).0[0]);
            Luma([if value - local > -offset { 255 } else { 0 }])
        });
        debug!("Binarization complete");
        self.replace(DynamicImage::ImageLuma8(binary))
    }

    // -- Pipeline -------------------------------------------------------------

    /// Grayscale → denoise → contrast → binarize.
    #[instrument(skip(self))]
    pub fn process_document(self) -> Self {
        info!("Running document pipeline");
        self.grayscale().denoise().enhance_contrast().binarize()
    }
}

/// BT.601 luma of any decoded image.
fn to_luma(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        other => {
            let rgba = other.to_rgba8();
            GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
                let [r, g, b, _] = rgba.get_pixel(x, y).0;
                Luma([luma(r, g, b)])
            })
        }
    }
}

/// Split `rgba` into planes, transform each, and reassemble.
fn map_channels(rgba: &RgbaImage, f: impl Fn(FloatField) -> FloatField) -> RgbaImage {
    let (w, h) = (rgba.width() as usize, rgba.height() as usize);
    let planes: Vec<FloatField> = (0..4)
        .map(|c| {
            f(FloatField::from_vec(
                w,
                h,
                rgba.pixels().map(|p| f32::from(p.0[c])).collect(),
            ))
        })
        .collect();

    RgbaImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let i = y as usize * w + x as usize;
        Rgba([
            saturate_u8(planes[0].as_slice()[i]),
            saturate_u8(planes[1].as_slice()[i]),
            saturate_u8(planes[2].as_slice()[i]),
            saturate_u8(planes[3].as_slice()[i]),
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn page(width: u32, height: u32) -> DynamicImage {
        // Light paper with dark "text" strokes every 8 rows.
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            if y % 8 == 3 && x % 10 < 7 {
                image::Rgb([30, 30, 40])
            } else {
                image::Rgb([220, 215, 200])
            }
        }))
    }

    #[test]
    fn grayscale_uses_bt601() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 2, image::Rgb([255, 0, 0])));
        let out = DocumentEnhancer::from_dynamic(img).unwrap().grayscale().into_dynamic();
        let gray = out.as_luma8().expect("grayscale output");
        assert!(gray.pixels().all(|p| p.0[0] == 76));
    }

    #[test]
    fn denoise_preserves_layout_and_flattens_noise() {
        let noisy = GrayImage::from_fn(20, 20, |x, y| Luma([if (x + y) % 2 == 0 { 100 } else { 140 }]));
        let out = DocumentEnhancer::from_dynamic(DynamicImage::ImageLuma8(noisy))
            .unwrap()
            .denoise()
            .into_dynamic();
        let gray = out.as_luma8().expect("grayscale stays grayscale");
        assert_eq!(gray.dimensions(), (20, 20));
        let centre = gray.get_pixel(10, 10).0[0];
        assert!((115..=125).contains(&centre), "centre {centre}");
    }

    #[test]
    fn denoise_keeps_uniform_colour() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(9, 7, Rgba([10, 20, 30, 255])));
        let out = DocumentEnhancer::from_dynamic(img).unwrap().denoise().into_dynamic();
        let rgba = out.as_rgba8().expect("colour output");
        assert!(rgba.pixels().all(|p| p.0 == [10, 20, 30, 255]));
    }

    #[test]
    fn contrast_keeps_colour_dimensions_and_alpha() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(32, 16, |x, _| {
            Rgba([100 + x as u8, 110, 120, 77])
        }));
        let out = DocumentEnhancer::from_dynamic(img)
            .unwrap()
            .enhance_contrast()
            .into_dynamic();
        let rgba = out.as_rgba8().expect("colour output");
        assert_eq!(rgba.dimensions(), (32, 16));
        assert!(rgba.pixels().all(|p| p.0[3] == 77));
    }

    #[test]
    fn binarize_outputs_only_black_and_white() {
        let out = DocumentEnhancer::from_dynamic(page(40, 32))
            .unwrap()
            .binarize()
            .into_dynamic();
        let gray = out.as_luma8().expect("binary output");
        assert!(gray.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
        // Strokes go black, paper stays white.
        assert_eq!(gray.get_pixel(2, 3).0[0], 0);
        assert_eq!(gray.get_pixel(2, 6).0[0], 255);
    }

    #[test]
    fn binarize_uniform_page_is_white() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(16, 16, Luma([90])));
        let out = DocumentEnhancer::from_dynamic(img).unwrap().binarize().into_dynamic();
        assert!(out.as_luma8().unwrap().pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn process_document_runs_the_pipeline() {
        let out = DocumentEnhancer::from_dynamic(page(64, 48))
            .unwrap()
            .process_document()
            .into_dynamic();
        let gray = out.as_luma8().expect("binary output");
        assert_eq!(gray.dimensions(), (64, 48));
        assert!(gray.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
        assert!(gray.pixels().any(|p| p.0[0] == 0));
        assert!(gray.pixels().any(|p| p.0[0] == 255));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = EnhanceConfig {
            denoise_kernel: 4,
            ..Default::default()
        };
        assert!(DocumentEnhancer::with_config(page(8, 8), config).is_err());
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = DocumentEnhancer::from_bytes(b"not an image").err().unwrap();
        assert!(matches!(err, SmartCropperError::ImageError(_)));
    }
}
