// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Decoded bitmap — loads images with the `image` crate, lends their pixels to
// the similarity scorer and writes results back out.

use image::{DynamicImage, ImageFormat};
use smartcropper_core::{ImageView, Result, SmartCropperError};
use tracing::{debug, info, instrument};

/// A decoded image held in memory.
///
/// ```ignore
/// let a = Bitmap::open("before.png")?;
/// let b = Bitmap::open("after.png")?;
/// let score = compute_similarity(&a.view()?, &b.view()?)?;
/// ```
pub struct Bitmap {
    image: DynamicImage,
}

impl Bitmap {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let img = image::open(path.as_ref()).map_err(|err| {
            SmartCropperError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(
            width = img.width(),
            height = img.height(),
            color = ?img.color(),
            "Image loaded"
        );
        Ok(Self { image: img })
    }

    /// Decode raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data).map_err(|err| {
            SmartCropperError::ImageError(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Borrow the 8-bit pixels as an interleaved [`ImageView`].
    ///
    /// Gray, gray+alpha, RGB and RGBA bitmaps map to 1, 2, 3 and 4 channels.
    /// Channels stay in the decoder's RGB order. Other layouts (16-bit,
    /// float) are rejected rather than silently converted.
    pub fn view(&self) -> Result<ImageView<'_>> {
        let (width, height) = (self.image.width(), self.image.height());
        let (channels, data): (u8, &[u8]) = match &self.image {
            DynamicImage::ImageLuma8(buf) => (1, buf.as_raw()),
            DynamicImage::ImageLumaA8(buf) => (2, buf.as_raw()),
            DynamicImage::ImageRgb8(buf) => (3, buf.as_raw()),
            DynamicImage::ImageRgba8(buf) => (4, buf.as_raw()),
            other => {
                return Err(SmartCropperError::UnsupportedPixelFormat(format!(
                    "{:?}",
                    other.color()
                )));
            }
        };
        ImageView::new(width, height, channels, data)
    }

    /// Convert layouts [`view`](Self::view) rejects or the scorer cannot read
    /// (gray+alpha, 16-bit, float) to 8-bit RGBA. Gray, RGB and RGBA
    /// bitmaps are returned unchanged.
    pub fn into_scorable(self) -> Self {
        match self.image {
            DynamicImage::ImageLuma8(_)
            | DynamicImage::ImageRgb8(_)
            | DynamicImage::ImageRgba8(_) => self,
            other => {
                debug!(color = ?other.color(), "Converting bitmap to RGBA8");
                Self {
                    image: DynamicImage::ImageRgba8(other.to_rgba8()),
                }
            }
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| SmartCropperError::ImageError(format!("PNG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Write the image to a file. The format follows the file extension.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        self.image.save(path.as_ref()).map_err(|err| {
            SmartCropperError::ImageError(format!(
                "failed to save image to {}: {}",
                path.as_ref().display(),
                err
            ))
        })
    }
}

impl From<DynamicImage> for Bitmap {
    fn from(image: DynamicImage) -> Self {
        Self::from_dynamic(image)
    }
}
