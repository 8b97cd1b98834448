use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb as Pixel, RgbImage};

use crate::services::card_design::Rgb;

/// Standard business card size (3.5" x 2")
pub const CARD_WIDTH_MM: f32 = 89.0;
pub const CARD_HEIGHT_MM: f32 = 51.0;
pub const RENDER_DPI: f32 = 300.0;

const MM_PER_INCH: f32 = 25.4;
const OVERLAY_ALPHA: f32 = 0.2;
const JPEG_QUALITY: u8 = 92;

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("JPEG encoding failed: {0}")]
    Encoding(#[from] image::ImageError),
}

/// Pixel size of the card raster at `RENDER_DPI`
pub fn raster_size() -> (u32, u32) {
    let px = |mm: f32| (mm / MM_PER_INCH * RENDER_DPI).round() as u32;
    (px(CARD_WIDTH_MM), px(CARD_HEIGHT_MM))
}

/// Paints the card background: solid color, then the image scaled to cover
/// and center-cropped, then a translucent black overlay for text contrast.
pub fn render_background(color: Rgb, image: Option<&DynamicImage>) -> RgbImage {
    let (width, height) = raster_size();
    let mut canvas = RgbImage::from_pixel(width, height, Pixel([color.0, color.1, color.2]));

    if let Some(image) = image {
        paint_cover(&mut canvas, image);
        darken(&mut canvas, OVERLAY_ALPHA);
    }

    canvas
}

pub fn encode_jpeg(canvas: &RgbImage) -> Result<Vec<u8>, RenderError> {
    let mut out = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
        encoder.encode(
            canvas.as_raw(),
            canvas.width(),
            canvas.height(),
            image::ColorType::Rgb8,
        )?;
    }
    Ok(out)
}

fn paint_cover(canvas: &mut RgbImage, image: &DynamicImage) {
    let (width, height) = canvas.dimensions();
    let (src_w, src_h) = (image.width(), image.height());
    if src_w == 0 || src_h == 0 {
        return;
    }

    // Crop the source to the card's aspect ratio before scaling so the
    // resized buffer never exceeds the card raster
    let (crop_w, crop_h) = cover_window(src_w, src_h, width, height);
    let x = (src_w - crop_w) / 2;
    let y = (src_h - crop_h) / 2;
    let window = image.crop_imm(x, y, crop_w, crop_h).to_rgba8();
    let cropped = imageops::resize(&window, width, height, FilterType::Triangle);

    // Alpha-composite over the background color
    for (dst, src) in canvas.pixels_mut().zip(cropped.pixels()) {
        let alpha = src.0[3] as f32 / 255.0;
        for channel in 0..3 {
            let blended = src.0[channel] as f32 * alpha + dst.0[channel] as f32 * (1.0 - alpha);
            dst.0[channel] = blended.round() as u8;
        }
    }
}

/// Largest centered window of a `src_w` x `src_h` image with the
/// `width` x `height` aspect ratio
fn cover_window(src_w: u32, src_h: u32, width: u32, height: u32) -> (u32, u32) {
    let (sw, sh, w, h) = (src_w as u64, src_h as u64, width as u64, height as u64);
    if sw * h > sh * w {
        let crop_w = (sh * w / h).clamp(1, sw);
        (crop_w as u32, src_h)
    } else {
        let crop_h = (sw * h / w).clamp(1, sh);
        (src_w, crop_h as u32)
    }
}

fn darken(canvas: &mut RgbImage, alpha: f32) {
    for pixel in canvas.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = (*channel as f32 * (1.0 - alpha)).round() as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_raster_size_is_300_dpi_business_card() {
        assert_eq!(raster_size(), (1051, 602));
    }

    #[test]
    fn test_solid_background() {
        let canvas = render_background(Rgb(0x25, 0x63, 0xeb), None);

        assert_eq!(canvas.dimensions(), raster_size());
        assert_eq!(canvas.get_pixel(0, 0), &Pixel([0x25, 0x63, 0xeb]));
        assert_eq!(canvas.get_pixel(1050, 601), &Pixel([0x25, 0x63, 0xeb]));
    }

    #[test]
    fn test_image_covers_card_with_overlay() {
        // Tall image: scaled to the card width, cropped vertically
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 40, Rgba([200, 100, 50, 255])));
        let canvas = render_background(Rgb(255, 255, 255), Some(&image));

        // 0.8 of the source color after the 20% black overlay
        assert_eq!(canvas.get_pixel(0, 0), &Pixel([160, 80, 40]));
        assert_eq!(canvas.get_pixel(525, 301), &Pixel([160, 80, 40]));
    }

    #[test]
    fn test_cover_window() {
        assert_eq!(cover_window(2102, 602, 1051, 602), (1051, 602));
        assert_eq!(cover_window(1051, 1204, 1051, 602), (1051, 602));
        assert_eq!(cover_window(1051, 602, 1051, 602), (1051, 602));
        assert_eq!(cover_window(1, 2000, 1051, 602), (1, 1));
        assert_eq!(cover_window(2000, 1, 1051, 602), (1, 1));
    }

    #[test]
    fn test_extreme_aspect_ratios_render_at_card_size() {
        for (w, h) in [(1, 2000), (2000, 1)] {
            let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([50, 100, 200, 255])));
            let canvas = render_background(Rgb(0, 0, 0), Some(&image));

            assert_eq!(canvas.dimensions(), raster_size());
            assert_eq!(canvas.get_pixel(0, 0), &Pixel([40, 80, 160]));
            assert_eq!(canvas.get_pixel(1050, 601), &Pixel([40, 80, 160]));
        }
    }

    #[test]
    fn test_transparent_image_shows_background_color() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 0])));
        let canvas = render_background(Rgb(100, 100, 100), Some(&image));

        assert_eq!(canvas.get_pixel(10, 10), &Pixel([80, 80, 80]));
    }

    #[test]
    fn test_jpeg_encoding() {
        let canvas = render_background(Rgb(31, 41, 55), None);
        let jpeg = encode_jpeg(&canvas).unwrap();

        assert_eq!(&jpeg[..3], &[0xFF, 0xD8, 0xFF]);
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1051, 602));
    }
}
