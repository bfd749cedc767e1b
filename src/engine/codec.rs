use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use log::info;

use crate::engine::assets::EncodedAsset;
use crate::{Error, Result};

/// Longest side, in pixels, of any stored image.
pub const MAX_DIMENSION: u32 = 1200;

/// JPEG quality applied on re-encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    /// Generic uploads.
    Standard,
    /// Uploads the user already cropped and confirmed.
    CropConfirmed,
    Custom(u8),
}

impl Quality {
    pub fn value(self) -> u8 {
        match self {
            Quality::Standard => 85,
            Quality::CropConfirmed => 95,
            Quality::Custom(q) => q.clamp(1, 100),
        }
    }
}

/// Output of [`ImageCodec::compress`].
#[derive(Debug, Clone)]
pub struct CompressedImage {
    pub asset: EncodedAsset,
    pub width: u32,
    pub height: u32,
    pub original_bytes: usize,
    pub encoded_bytes: usize,
}

/// Scales `(width, height)` so the longer side is at most `max`, keeping the aspect ratio.
///
/// Images already within the bound are returned unchanged; nothing is upscaled.
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }
    if width >= height {
        let scaled = (height as f64 * max as f64 / width as f64).round() as u32;
        (max, scaled.max(1))
    } else {
        let scaled = (width as f64 * max as f64 / height as f64).round() as u32;
        (scaled.max(1), max)
    }
}

/// Resizes and re-encodes arbitrary raster images to bounded JPEGs.
#[derive(Debug, Clone, Copy)]
pub struct ImageCodec {
    max_dimension: u32,
}

impl Default for ImageCodec {
    fn default() -> Self {
        Self { max_dimension: MAX_DIMENSION }
    }
}

impl ImageCodec {
    pub fn new(max_dimension: u32) -> Self {
        Self { max_dimension: max_dimension.max(1) }
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Decodes `input`, downsizes it to the bound if needed and encodes it as JPEG.
    ///
    /// CPU bound; async callers should run it on a blocking thread.
    pub fn compress(&self, input: &[u8], quality: Quality) -> Result<CompressedImage> {
        let img = image::load_from_memory(input).map_err(|e| Error::Decode(e.to_string()))?;
        let (src_w, src_h) = (img.width(), img.height());
        if src_w == 0 || src_h == 0 {
            return Err(Error::Surface(format!("cannot allocate a {}x{} surface", src_w, src_h)));
        }

        let (width, height) = fit_within(src_w, src_h, self.max_dimension);
        let img = if (width, height) == (src_w, src_h) {
            img
        } else {
            img.resize_exact(width, height, FilterType::CatmullRom)
        };
        // JPEG carries no alpha channel.
        let rgb = img.to_rgb8();

        let mut buf = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality.value());
        encoder
            .encode_image(&rgb)
            .map_err(|e| Error::Surface(e.to_string()))?;

        let encoded_bytes = buf.len();
        info!(
            "Compressed image {}x{} -> {}x{}, {} -> {} bytes",
            src_w,
            src_h,
            width,
            height,
            input.len(),
            encoded_bytes
        );

        Ok(CompressedImage {
            asset: EncodedAsset::from_jpeg(&buf),
            width,
            height,
            original_bytes: input.len(),
            encoded_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 120, 40]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_fit_within() {
        assert_eq!(fit_within(3000, 2000, 1200), (1200, 800));
        assert_eq!(fit_within(2000, 3000, 1200), (800, 1200));
        assert_eq!(fit_within(1200, 1200, 1200), (1200, 1200));
        assert_eq!(fit_within(640, 480, 1200), (640, 480));
        assert_eq!(fit_within(5000, 1, 1200), (1200, 1));
    }

    #[test]
    fn test_fit_within_never_exceeds_bound() {
        for (w, h) in [(1201, 1), (1, 1201), (4096, 4095), (1333, 999), (999, 1333)] {
            let (ow, oh) = fit_within(w, h, 1200);
            assert!(ow.max(oh) <= 1200, "{}x{} -> {}x{}", w, h, ow, oh);
        }
    }

    #[test]
    fn test_compress_downscales_and_reencodes() {
        let codec = ImageCodec::default();
        let out = codec.compress(&png(1600, 900), Quality::Standard).unwrap();
        assert_eq!((out.width, out.height), (1200, 675));

        let bytes = out.asset.to_bytes().unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1200, 675));
    }

    #[test]
    fn test_compress_keeps_small_images_unscaled() {
        let codec = ImageCodec::default();
        let out = codec.compress(&png(320, 200), Quality::CropConfirmed).unwrap();
        assert_eq!((out.width, out.height), (320, 200));
    }

    #[test]
    fn test_compress_rejects_garbage() {
        let codec = ImageCodec::default();
        let res = codec.compress(b"definitely not an image", Quality::Standard);
        assert!(matches!(res, Err(Error::Decode(_))));
    }
}
