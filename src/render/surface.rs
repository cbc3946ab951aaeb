/// Drawing target for the renderer
use ab_glyph::{FontArc, PxScale};
use image::{imageops, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size, Blend, Canvas};
use imageproc::rect::Rect;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::state::data::BoxRect;

/// Fonts tried when no label font is configured
const SYSTEM_FONTS: [&str; 7] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Average glyph advance relative to the font size, used without a font
const FALLBACK_ADVANCE: f32 = 0.6;

/// A 2D drawing target, in the spirit of a canvas context.
///
/// All coordinates are surface pixels; primitives outside the surface are
/// clipped, never rejected.
pub trait Surface {
    fn resize(&mut self, width: u32, height: u32);
    fn size(&self) -> (u32, u32);
    fn clear(&mut self);
    /// Draw `image` at (0,0) scaled to the surface size
    fn draw_image(&mut self, image: &RgbaImage);
    /// Outline `rect` with a line of `line_width` pixels centered on its edge
    fn stroke_rect(&mut self, rect: BoxRect, color: Rgba<u8>, line_width: u32);
    fn fill_rect(&mut self, rect: BoxRect, color: Rgba<u8>);
    fn text_width(&self, text: &str, size: f32) -> f32;
    /// Draw `text` with its top-left corner at (x, y)
    fn fill_text(&mut self, text: &str, x: f32, y: f32, size: f32, color: Rgba<u8>);
}

/// CPU pixel buffer surface backed by an `RgbaImage`
pub struct RasterSurface {
    pixels: RgbaImage,
    font: Option<FontArc>,
}

impl RasterSurface {
    pub fn new(font: Option<FontArc>) -> Self {
        Self { pixels: RgbaImage::new(0, 0), font }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    fn is_empty(&self) -> bool {
        self.pixels.width() == 0 || self.pixels.height() == 0
    }

    /// Paint `rects`, blending only when the color is translucent
    fn paint(&mut self, rects: &[Rect], color: Rgba<u8>, mode: PaintMode) {
        if color[3] == u8::MAX {
            for rect in rects {
                mode.apply(&mut self.pixels, *rect, color);
            }
        } else {
            let mut canvas = Blend(std::mem::replace(&mut self.pixels, RgbaImage::new(0, 0)));
            for rect in rects {
                mode.apply(&mut canvas, *rect, color);
            }
            self.pixels = canvas.0;
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum PaintMode {
    Outline,
    Fill,
}

impl PaintMode {
    fn apply<C: Canvas<Pixel = Rgba<u8>>>(self, canvas: &mut C, rect: Rect, color: Rgba<u8>) {
        match self {
            PaintMode::Outline => draw_hollow_rect_mut(canvas, rect, color),
            PaintMode::Fill => draw_filled_rect_mut(canvas, rect, color),
        }
    }
}

/// Integer rectangle for imageproc, `None` when it has no area
fn pixel_rect(x: i32, y: i32, width: i32, height: i32) -> Option<Rect> {
    (width > 0 && height > 0).then(|| Rect::at(x, y).of_size(width as u32, height as u32))
}

/// Round `rect` to pixel edges, pinned to `margin` pixels around a
/// `width` x `height` surface. Returns (x, y, w, h).
///
/// Box coordinates come straight from the detection API; pinning keeps the
/// later integer arithmetic far from overflow while anything past the
/// margin stays off-surface.
fn pinned_edges(rect: BoxRect, width: u32, height: u32, margin: u32) -> (i32, i32, i32, i32) {
    let pin = |v: f32, extent: u32| -> i32 {
        let lo = -(margin as f32);
        let hi = extent as f32 + margin as f32;
        if v.is_nan() {
            return 0;
        }
        v.clamp(lo, hi).round() as i32
    };
    let (x0, x1) = (pin(rect.x, width), pin(rect.x + rect.width, width));
    let (y0, y1) = (pin(rect.y, height), pin(rect.y + rect.height, height));
    (x0, y0, x1 - x0, y1 - y0)
}

impl Surface for RasterSurface {
    fn resize(&mut self, width: u32, height: u32) {
        if self.pixels.dimensions() != (width, height) {
            self.pixels = RgbaImage::new(width, height);
        }
    }

    fn size(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    fn clear(&mut self) {
        self.pixels.pixels_mut().for_each(|p| *p = Rgba([0, 0, 0, 0]));
    }

    fn draw_image(&mut self, image: &RgbaImage) {
        if self.is_empty() {
            return;
        }
        let (width, height) = self.pixels.dimensions();
        if image.dimensions() == (width, height) {
            imageops::replace(&mut self.pixels, image, 0, 0);
        } else {
            let scaled = imageops::resize(image, width, height, imageops::FilterType::Triangle);
            imageops::replace(&mut self.pixels, &scaled, 0, 0);
        }
    }

    fn stroke_rect(&mut self, rect: BoxRect, color: Rgba<u8>, line_width: u32) {
        if self.is_empty() || line_width == 0 {
            return;
        }
        let (width, height) = self.pixels.dimensions();
        let line_width = line_width.min(width.max(height));
        let (x, y, w, h) = pinned_edges(rect, width, height, line_width);
        let lw = line_width as i32;
        let half = lw / 2;

        // Concentric outlines, centered on the nominal edge
        let outlines: Vec<Rect> = (0..lw)
            .filter_map(|t| {
                let inset = t - half;
                pixel_rect(x + inset, y + inset, w - 2 * inset, h - 2 * inset)
            })
            .collect();
        self.paint(&outlines, color, PaintMode::Outline);
    }

    fn fill_rect(&mut self, rect: BoxRect, color: Rgba<u8>) {
        if self.is_empty() {
            return;
        }
        let (width, height) = self.pixels.dimensions();
        let (x, y, w, h) = pinned_edges(rect, width, height, 1);
        if let Some(r) = pixel_rect(x, y, w, h) {
            self.paint(&[r], color, PaintMode::Fill);
        }
    }

    fn text_width(&self, text: &str, size: f32) -> f32 {
        match &self.font {
            Some(font) => text_size(PxScale::from(size), font, text).0 as f32,
            None => text.chars().count() as f32 * size * FALLBACK_ADVANCE,
        }
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, size: f32, color: Rgba<u8>) {
        if self.is_empty() || !x.is_finite() || !y.is_finite() {
            return;
        }
        let (width, height) = self.pixels.dimensions();
        // Text starting past the right or bottom edge, or ending before the
        // left or top edge, is invisible
        if x >= width as f32
            || y >= height as f32
            || x + self.text_width(text, size) <= 0.0
            || y + size <= 0.0
        {
            return;
        }
        if let Some(font) = &self.font {
            draw_text_mut(
                &mut self.pixels,
                color,
                x.round() as i32,
                y.round() as i32,
                PxScale::from(size),
                font,
                text,
            );
        }
    }
}

/// Load the label font from `configured`, or the first system font found
pub fn load_label_font(configured: Option<&Path>) -> Option<FontArc> {
    let candidates: Vec<PathBuf> = match configured {
        Some(path) => vec![path.to_path_buf()],
        None => SYSTEM_FONTS.iter().map(PathBuf::from).collect(),
    };

    for path in candidates {
        let Ok(bytes) = std::fs::read(&path) else {
            continue;
        };
        match FontArc::try_from_vec(bytes) {
            Ok(font) => {
                info!("🔤 Label font: {}", path.display());
                return Some(font);
            }
            Err(e) => warn!("⚠️  {} is not a usable font: {}", path.display(), e),
        }
    }

    warn!("⚠️  No label font found; boxes will be labeled without text");
    None
}
