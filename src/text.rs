//! Overlay text rendering.
//!
//! Glyphs come from the monospace face bundled with egui, rasterized by
//! fontdue and blended onto the buffer by coverage.

use eframe::egui::FontDefinitions;
use fontdue::{Font, FontSettings, Metrics};
use image::{Rgb, RgbImage};
use once_cell::sync::OnceCell;

use crate::{error::AnnotateError, model::Rect};

/// Bundled egui font family used for every overlay
const FONT_NAME: &str = "Hack";

// Parsed on first use
static OVERLAY_FONT: OnceCell<Font> = OnceCell::new();

pub fn overlay_font() -> Result<&'static Font, AnnotateError> {
    OVERLAY_FONT.get_or_try_init(|| {
        let fonts = FontDefinitions::default();
        let data = fonts
            .font_data
            .get(FONT_NAME)
            .ok_or(AnnotateError::Font("bundled overlay font is missing"))?;
        Font::from_bytes(&data.font[..], FontSettings::default()).map_err(AnnotateError::Font)
    })
}

/// Draws `text` centred inside `rect`, clipped to the image bounds
pub fn draw_text_centered(
    image: &mut RgbImage,
    font: &Font,
    px: f32,
    text: &str,
    rect: Rect,
    color: Rgb<u8>,
) {
    let glyphs: Vec<(Metrics, Vec<u8>)> = text.chars().map(|c| font.rasterize(c, px)).collect();

    let text_width: f32 = glyphs.iter().map(|(m, _)| m.advance_width).sum();
    // Height of the inked area above the baseline
    let text_height = glyphs
        .iter()
        .filter(|(m, _)| m.height > 0)
        .map(|(m, _)| m.height as i32 + m.ymin)
        .max()
        .unwrap_or(0);

    let mut pen_x = (rect.x + rect.width / 2) as f32 - text_width / 2.0;
    let baseline = (rect.y + rect.height / 2) as i32 + text_height / 2;

    for (metrics, coverage) in &glyphs {
        let left = pen_x.round() as i32 + metrics.xmin;
        let top = baseline - (metrics.height as i32 + metrics.ymin);
        blit_glyph(image, metrics, coverage, left, top, color);
        pen_x += metrics.advance_width;
    }
}

fn blit_glyph(
    image: &mut RgbImage,
    metrics: &Metrics,
    coverage: &[u8],
    left: i32,
    top: i32,
    color: Rgb<u8>,
) {
    let (width, height) = (image.width() as i32, image.height() as i32);
    for row in 0..metrics.height {
        for col in 0..metrics.width {
            let alpha = coverage[row * metrics.width + col];
            if alpha == 0 {
                continue;
            }
            let (x, y) = (left + col as i32, top + row as i32);
            if x < 0 || y < 0 || x >= width || y >= height {
                continue;
            }
            let pixel = image.get_pixel_mut(x as u32, y as u32);
            *pixel = mix(*pixel, color, alpha as f32 / 255.0);
        }
    }
}

/// `base * (1 - weight) + over * weight`, per channel
pub fn mix(base: Rgb<u8>, over: Rgb<u8>, weight: f32) -> Rgb<u8> {
    let mut out = base;
    for (o, (b, v)) in out.0.iter_mut().zip(base.0.iter().zip(over.0.iter())) {
        let blended = *b as f32 * (1.0 - weight) + *v as f32 * weight;
        *o = blended.round().clamp(0.0, 255.0) as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_endpoints() {
        let a = Rgb([10, 20, 30]);
        let b = Rgb([200, 100, 0]);
        assert_eq!(mix(a, b, 0.0), a);
        assert_eq!(mix(a, b, 1.0), b);
        assert_eq!(mix(Rgb([0, 0, 0]), Rgb([255, 255, 255]), 0.5), Rgb([128, 128, 128]));
    }

    #[test]
    fn bundled_font_loads() {
        let font = overlay_font().unwrap();
        let (metrics, _) = font.rasterize('L', 28.0);
        assert!(metrics.width > 0 && metrics.height > 0);
    }

    #[test]
    fn text_lands_inside_its_rectangle() {
        let mut image = RgbImage::from_pixel(640, 360, Rgb([0, 0, 0]));
        let rect = Rect { x: 200, y: 150, width: 240, height: 60 };
        let font = overlay_font().unwrap();
        draw_text_centered(&mut image, font, 20.0, "L: 1K / D: 2", rect, Rgb([255, 255, 255]));

        let mut inked = 0;
        for (x, y, pixel) in image.enumerate_pixels() {
            if pixel.0 != [0, 0, 0] {
                inked += 1;
                assert!(rect.contains(x, y), "ink outside rectangle at ({x}, {y})");
            }
        }
        assert!(inked > 0);
    }

    #[test]
    fn text_is_clipped_to_image() {
        let mut image = RgbImage::from_pixel(20, 10, Rgb([0, 0, 0]));
        let rect = Rect { x: 0, y: 0, width: 20, height: 10 };
        let font = overlay_font().unwrap();
        // Far wider than the image; must not panic
        draw_text_centered(&mut image, font, 28.0, "L: 999.9K / D: 999.9K", rect, Rgb([255, 255, 255]));
    }
}
