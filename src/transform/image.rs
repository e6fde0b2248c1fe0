// src/transform/image.rs

//! Raster image steps backed by the `image` crate and libwebp.

use anyhow::{Context, Result, anyhow};
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};

use super::{Asset, Step};

/// Extensions we decode and re-encode as WebP.
pub const WEBP_SOURCE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

/// Lowercased extension of the asset's output path.
fn extension(asset: &Asset) -> String {
    asset
        .path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

fn decode(asset: &Asset) -> Result<DynamicImage> {
    image::load_from_memory(&asset.contents)
        .with_context(|| format!("decoding image {}", asset.source.display()))
}

/// Whether [`EncodeWebp`] applies to this asset.
pub fn has_webp_variant(asset: &Asset) -> bool {
    WEBP_SOURCE_EXTENSIONS.contains(&extension(asset).as_str())
}

/// Lossy WebP copy of a raster image.
#[derive(Debug, Clone, Copy)]
pub struct EncodeWebp {
    quality: u8,
}

impl EncodeWebp {
    pub fn new(quality: u8) -> Self {
        Self { quality }
    }
}

impl Step for EncodeWebp {
    fn name(&self) -> &'static str {
        "encode-webp"
    }

    fn apply(&self, asset: Asset) -> Result<Asset> {
        let rgba = decode(&asset)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        let encoded = webp::Encoder::from_rgba(rgba.as_raw(), width, height)
            .encode_simple(false, f32::from(self.quality))
            .map_err(|err| anyhow!("webp encoding failed: {err:?}"))?;
        Ok(asset.with_extension("webp").with_contents(encoded.to_vec()))
    }
}

/// Recompress JPEG and PNG files, keeping whichever of the original and the
/// re-encoded bytes is smaller. Other formats pass through untouched.
#[derive(Debug, Clone, Copy)]
pub struct OptimizeImage {
    jpeg_quality: u8,
}

impl OptimizeImage {
    pub fn new(jpeg_quality: u8) -> Self {
        Self { jpeg_quality }
    }

    fn reencode(&self, asset: &Asset) -> Result<Option<Vec<u8>>> {
        let mut buf = Vec::new();
        match extension(asset).as_str() {
            "jpg" | "jpeg" => {
                let rgb = DynamicImage::ImageRgb8(decode(asset)?.to_rgb8());
                let encoder = JpegEncoder::new_with_quality(&mut buf, self.jpeg_quality);
                rgb.write_with_encoder(encoder).context("encoding jpeg")?;
            }
            "png" => {
                let img = decode(asset)?;
                let encoder = PngEncoder::new_with_quality(
                    &mut buf,
                    CompressionType::Best,
                    FilterType::Adaptive,
                );
                img.write_with_encoder(encoder).context("encoding png")?;
            }
            _ => return Ok(None),
        }
        Ok(Some(buf))
    }
}

impl Step for OptimizeImage {
    fn name(&self) -> &'static str {
        "optimize-image"
    }

    fn apply(&self, asset: Asset) -> Result<Asset> {
        match self.reencode(&asset)? {
            Some(smaller) if smaller.len() < asset.contents.len() => {
                Ok(asset.with_contents(smaller))
            }
            _ => Ok(asset),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgb, RgbImage};

    use super::*;

    fn gradient_png() -> Vec<u8> {
        let img = RgbImage::from_fn(32, 32, |x, y| Rgb([(x * 8) as u8, (y * 8) as u8, 128]));
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut cursor, ImageFormat::Png)
            .unwrap();
        cursor.into_inner()
    }

    #[test]
    fn webp_output_has_riff_header() {
        let asset = Asset::new("/p/a.png", "icons/a.png", gradient_png());
        let out = EncodeWebp::new(70).apply(asset).unwrap();
        assert_eq!(out.path, std::path::PathBuf::from("icons/a.webp"));
        assert_eq!(&out.contents[0..4], b"RIFF");
        assert_eq!(&out.contents[8..12], b"WEBP");
    }

    #[test]
    fn optimized_png_never_grows() {
        let original = gradient_png();
        let asset = Asset::new("/p/a.png", "a.png", original.clone());
        let out = OptimizeImage::new(80).apply(asset).unwrap();
        assert!(out.contents.len() <= original.len());
        assert_eq!(out.path, std::path::PathBuf::from("a.png"));
        assert!(image::load_from_memory(&out.contents).is_ok());
    }

    #[test]
    fn svg_passes_through() {
        let svg = b"<svg xmlns='http://www.w3.org/2000/svg'/>".to_vec();
        let asset = Asset::new("/p/logo.svg", "logo.svg", svg.clone());
        assert!(!has_webp_variant(&asset));
        let out = OptimizeImage::new(80).apply(asset).unwrap();
        assert_eq!(out.contents, svg);
    }

    #[test]
    fn corrupt_images_fail() {
        let asset = Asset::new("/p/bad.jpg", "bad.jpg", b"not a jpeg".to_vec());
        assert!(OptimizeImage::new(80).apply(asset).is_err());
    }
}
