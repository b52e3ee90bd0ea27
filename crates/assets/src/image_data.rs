use std::path::Path;

use crate::AssetError;

/// Color channel layout reported by the decoder.
///
/// Only 8-bit RGBA sources are recognised as four-channel; anything else
/// falls back to `Rgb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    Rgb,
    Rgba,
}

/// Decoded image pixels, expanded to tightly packed 8-bit RGBA for upload.
///
/// The source file's channel layout is kept for diagnostics; the pixel
/// buffer itself is always `width * height * 4` bytes.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub layout: ChannelLayout,
    pub pixels: Vec<u8>,
}

impl ImageData {
    /// A single-color image, used for fallback material textures.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            pixels.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            layout: ChannelLayout::Rgba,
            pixels,
        }
    }
}

/// Decode an image file into RGBA8 pixel data.
pub fn decode_image(path: impl AsRef<Path>) -> Result<ImageData, AssetError> {
    let bytes = std::fs::read(path.as_ref())?;
    decode_image_bytes(&bytes)
}

/// Decode an in-memory encoded image (PNG or JPEG) into RGBA8 pixel data.
pub fn decode_image_bytes(bytes: &[u8]) -> Result<ImageData, AssetError> {
    let decoded = image::load_from_memory(bytes)?;
    let layout = match decoded.color() {
        image::ColorType::Rgba8 => ChannelLayout::Rgba,
        image::ColorType::Rgb8 => ChannelLayout::Rgb,
        other => {
            tracing::debug!("unrecognised color type {other:?}, treating as RGB");
            ChannelLayout::Rgb
        }
    };
    let rgba = decoded.to_rgba8();
    Ok(ImageData {
        width: rgba.width(),
        height: rgba.height(),
        layout,
        pixels: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode_png(img: image::DynamicImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn decodes_rgb_png_and_expands_to_rgba() {
        let img = image::RgbImage::from_pixel(2, 2, image::Rgb([10, 20, 30]));
        let data = decode_image_bytes(&encode_png(img.into())).unwrap();
        assert_eq!((data.width, data.height), (2, 2));
        assert_eq!(data.layout, ChannelLayout::Rgb);
        assert_eq!(data.pixels.len(), 16);
        assert_eq!(&data.pixels[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn decodes_rgba_png() {
        let img = image::RgbaImage::from_pixel(1, 1, image::Rgba([1, 2, 3, 4]));
        let data = decode_image_bytes(&encode_png(img.into())).unwrap();
        assert_eq!(data.layout, ChannelLayout::Rgba);
        assert_eq!(data.pixels, vec![1, 2, 3, 4]);
    }

    #[test]
    fn grayscale_falls_back_to_rgb_layout() {
        let img = image::GrayImage::from_pixel(1, 1, image::Luma([128]));
        let data = decode_image_bytes(&encode_png(img.into())).unwrap();
        assert_eq!(data.layout, ChannelLayout::Rgb);
        assert_eq!(data.pixels.len(), 4);
    }

    #[test]
    fn garbage_bytes_are_an_error() {
        assert!(decode_image_bytes(b"not an image").is_err());
    }

    #[test]
    fn solid_fills_every_pixel() {
        let data = ImageData::solid(2, 1, [255, 255, 255, 255]);
        assert_eq!(data.pixels, vec![255; 8]);
    }
}
