/// Box and label layout over the selected image
use image::{Rgba, RgbaImage};
use std::sync::Arc;

use super::palette::ColorResolver;
use super::surface::Surface;
use crate::state::data::{BoxRect, Detection, DetectionSet};

/// Sizes and colors of the overlay, relative to the surface width
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStyle {
    /// Line width is `surface width / line_width_divisor`, clamped
    pub line_width_divisor: f32,
    pub min_line_width: u32,
    pub max_line_width: u32,
    /// Label font size is `surface width / font_size_divisor`, clamped
    pub font_size_divisor: f32,
    pub min_font_size: f32,
    pub max_font_size: f32,
    /// Space around the label text
    pub label_padding: f32,
    pub label_text_color: Rgba<u8>,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            line_width_divisor: 300.0,
            min_line_width: 2,
            max_line_width: 12,
            font_size_divisor: 80.0,
            min_font_size: 12.0,
            max_font_size: 64.0,
            label_padding: 6.0,
            label_text_color: Rgba([0, 0, 0, 255]),
        }
    }
}

impl RenderStyle {
    pub fn line_width(&self, surface_width: u32) -> u32 {
        let scaled = (surface_width as f32 / self.line_width_divisor).round() as u32;
        scaled.clamp(self.min_line_width, self.max_line_width)
    }

    pub fn font_size(&self, surface_width: u32) -> f32 {
        let scaled = (surface_width as f32 / self.font_size_divisor).round();
        scaled.clamp(self.min_font_size, self.max_font_size)
    }

    /// Label background: sits on top of the box's top edge, left-aligned with it
    pub fn label_rect(&self, bounds: BoxRect, text_width: f32, font_size: f32) -> BoxRect {
        let height = font_size + self.label_padding;
        BoxRect {
            x: bounds.x,
            y: bounds.y - height,
            width: text_width + self.label_padding * 2.0,
            height,
        }
    }
}

/// Draws an image and its detections onto a `Surface`.
///
/// Every call redraws the whole surface, so rendering the same inputs twice
/// gives the same pixels.
#[derive(Clone)]
pub struct DetectionRenderer {
    colors: Arc<dyn ColorResolver>,
    style: RenderStyle,
}

impl DetectionRenderer {
    pub fn new(colors: Arc<dyn ColorResolver>) -> Self {
        Self { colors, style: RenderStyle::default() }
    }

    #[cfg(test)]
    pub fn with_style(mut self, style: RenderStyle) -> Self {
        self.style = style;
        self
    }

    pub fn render<S: Surface + ?Sized>(&self, surface: &mut S, image: &RgbaImage, detections: &DetectionSet) {
        surface.resize(image.width(), image.height());
        surface.clear();
        surface.draw_image(image);

        let (width, _) = surface.size();
        let line_width = self.style.line_width(width);
        let font_size = self.style.font_size(width);

        for detection in detections {
            self.draw_detection(surface, detection, line_width, font_size);
        }
    }

    fn draw_detection<S: Surface + ?Sized>(&self, surface: &mut S, detection: &Detection, line_width: u32, font_size: f32) {
        let bounds = detection.bounds();
        let color = self.colors.color_for(&detection.class);
        surface.stroke_rect(bounds, color, line_width);

        let text = detection.label_text();
        let label = self.style.label_rect(bounds, surface.text_width(&text, font_size), font_size);
        surface.fill_rect(label, color);

        let pad = self.style.label_padding;
        surface.fill_text(&text, label.x + pad, label.y + pad / 2.0, font_size, self.style.label_text_color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::palette::{ClassPalette, WARNING};
    use crate::render::surface::RasterSurface;

    const OPAQUE_WEED: Rgba<u8> = Rgba([255, 80, 80, 255]);
    const OPAQUE_CROP: Rgba<u8> = Rgba([80, 150, 255, 255]);

    /// Records draw calls instead of painting
    #[derive(Debug, Default)]
    struct RecordingSurface {
        size: (u32, u32),
        ops: Vec<Op>,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Clear,
        Image(u32, u32),
        Stroke(BoxRect, Rgba<u8>, u32),
        Fill(BoxRect, Rgba<u8>),
        Text(String, f32, f32, f32),
    }

    impl Surface for RecordingSurface {
        fn resize(&mut self, width: u32, height: u32) {
            self.size = (width, height);
            self.ops.clear();
        }
        fn size(&self) -> (u32, u32) {
            self.size
        }
        fn clear(&mut self) {
            self.ops.push(Op::Clear);
        }
        fn draw_image(&mut self, image: &RgbaImage) {
            self.ops.push(Op::Image(image.width(), image.height()));
        }
        fn stroke_rect(&mut self, rect: BoxRect, color: Rgba<u8>, line_width: u32) {
            self.ops.push(Op::Stroke(rect, color, line_width));
        }
        fn fill_rect(&mut self, rect: BoxRect, color: Rgba<u8>) {
            self.ops.push(Op::Fill(rect, color));
        }
        fn text_width(&self, text: &str, _size: f32) -> f32 {
            text.len() as f32 * 5.0
        }
        fn fill_text(&mut self, text: &str, x: f32, y: f32, size: f32, _color: Rgba<u8>) {
            self.ops.push(Op::Text(text.to_string(), x, y, size));
        }
    }

    fn weed() -> Detection {
        Detection { x: 100.0, y: 100.0, width: 40.0, height: 20.0, class: "weed".into(), confidence: 0.92 }
    }

    fn opaque_renderer() -> DetectionRenderer {
        DetectionRenderer::new(Arc::new(|class: &str| if class == "weed" { OPAQUE_WEED } else { OPAQUE_CROP }))
    }

    fn field(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| Rgba([(x % 256) as u8, (y % 256) as u8, 40, 255]))
    }

    #[test]
    fn test_weed_scenario_draw_calls() {
        let renderer = DetectionRenderer::new(Arc::new(ClassPalette::default()));
        let mut surface = RecordingSurface::default();
        renderer.render(&mut surface, &RgbaImage::new(200, 200), &DetectionSet::new(vec![weed()]));

        let box_rect = BoxRect { x: 80.0, y: 90.0, width: 40.0, height: 20.0 };
        // "weed 0.92" is 9 chars -> 45 px wide; font 12, padding 6
        let label_rect = BoxRect { x: 80.0, y: 72.0, width: 57.0, height: 18.0 };
        assert_eq!(
            surface.ops,
            vec![
                Op::Clear,
                Op::Image(200, 200),
                Op::Stroke(box_rect, Rgba(WARNING), 2),
                Op::Fill(label_rect, Rgba(WARNING)),
                Op::Text("weed 0.92".into(), 86.0, 75.0, 12.0),
            ]
        );
    }

    #[test]
    fn test_boxes_drawn_in_set_order() {
        let crop = Detection { class: "maize".into(), ..weed() };
        let renderer = DetectionRenderer::new(Arc::new(ClassPalette::default()));
        let mut surface = RecordingSurface::default();
        renderer.render(&mut surface, &RgbaImage::new(50, 50), &DetectionSet::new(vec![weed(), crop]));

        let strokes: Vec<_> = surface
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Stroke(_, color, _) => Some(*color),
                _ => None,
            })
            .collect();
        assert_eq!(strokes, vec![Rgba(WARNING), Rgba(crate::render::palette::INFO)]);
    }

    #[test]
    fn test_line_width_and_font_scale_with_width() {
        let style = RenderStyle::default();
        assert_eq!(style.line_width(200), 2);
        assert_eq!(style.line_width(1500), 5);
        assert_eq!(style.line_width(100_000), 12);
        assert_eq!(style.font_size(200), 12.0);
        assert_eq!(style.font_size(1600), 20.0);
        assert_eq!(style.font_size(100_000), 64.0);
    }

    #[test]
    fn test_custom_style_padding() {
        let style = RenderStyle { label_padding: 2.0, ..RenderStyle::default() };
        let renderer = DetectionRenderer::new(Arc::new(ClassPalette::default())).with_style(style);
        let mut surface = RecordingSurface::default();
        renderer.render(&mut surface, &RgbaImage::new(200, 200), &DetectionSet::new(vec![weed()]));
        assert_eq!(surface.ops.last(), Some(&Op::Text("weed 0.92".into(), 82.0, 77.0, 12.0)));
    }

    #[test]
    fn test_empty_set_is_source_image() {
        let image = field(64, 48);
        let mut surface = RasterSurface::new(None);
        opaque_renderer().render(&mut surface, &image, &DetectionSet::default());
        assert_eq!(surface.pixels(), &image);
    }

    #[test]
    fn test_weed_box_pixels() {
        let image = RgbaImage::from_pixel(200, 200, Rgba([0, 0, 0, 255]));
        let mut surface = RasterSurface::new(None);
        opaque_renderer().render(&mut surface, &image, &DetectionSet::new(vec![weed()]));

        let px = |x, y| *surface.pixels().get_pixel(x, y);
        // Left and right edges of the 40x20 box at (80, 90)
        assert_eq!(px(80, 100), OPAQUE_WEED);
        assert_eq!(px(119, 100), OPAQUE_WEED);
        // Inside stays untouched
        assert_eq!(px(100, 100), Rgba([0, 0, 0, 255]));
        // Label background just above the top edge
        assert_eq!(px(82, 80), OPAQUE_WEED);
    }

    #[test]
    fn test_render_is_idempotent() {
        let image = field(120, 90);
        let set = DetectionSet::new(vec![
            Detection { x: 30.0, y: 40.0, width: 20.0, height: 10.0, class: "maize".into(), confidence: 0.5 },
            weed(),
        ]);
        let renderer = opaque_renderer();

        let mut surface = RasterSurface::new(None);
        renderer.render(&mut surface, &image, &set);
        let first = surface.pixels().clone();
        renderer.render(&mut surface, &image, &set);
        assert_eq!(surface.pixels(), &first);
    }

    #[test]
    fn test_previous_boxes_do_not_accumulate() {
        let image = field(200, 200);
        let renderer = opaque_renderer();

        let mut reused = RasterSurface::new(None);
        renderer.render(&mut reused, &image, &DetectionSet::new(vec![weed()]));
        renderer.render(&mut reused, &image, &DetectionSet::default());
        assert_eq!(reused.pixels(), &image);
    }

    #[test]
    fn test_label_near_top_edge_is_clipped() {
        let image = RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 255]));
        let top = Detection { x: 50.0, y: 6.0, width: 30.0, height: 12.0, class: "weed".into(), confidence: 0.3 };
        let mut surface = RasterSurface::new(None);
        opaque_renderer().render(&mut surface, &image, &DetectionSet::new(vec![top]));

        // Box top edge at y = 0, label would start at y = -18
        assert_eq!(*surface.pixels().get_pixel(36, 0), OPAQUE_WEED);
        assert_eq!(surface.size(), (100, 100));
    }

    #[test]
    fn test_zero_sized_box_does_not_panic() {
        let image = field(32, 32);
        let dot = Detection { x: 16.0, y: 16.0, width: 0.0, height: 0.0, class: "weed".into(), confidence: 1.0 };
        let mut surface = RasterSurface::new(None);
        opaque_renderer().render(&mut surface, &image, &DetectionSet::new(vec![dot]));
        assert_eq!(surface.size(), (32, 32));
    }

    #[test]
    fn test_oversized_api_box_renders() {
        let set = crate::inference::response::parse_predictions(
            br#"{"predictions": [
                {"x": 1e12, "y": 50, "width": 4e12, "height": 20, "class": "weed", "confidence": 0.9},
                {"x": -3e38, "y": -3e38, "width": 3e38, "height": 3e38, "class": "maize", "confidence": 0.4}
            ]}"#,
        )
        .unwrap();
        let image = RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 255]));
        let mut surface = RasterSurface::new(None);
        opaque_renderer().render(&mut surface, &image, &set);

        // The first box spans the whole width; its top edge is row 40
        assert_eq!(*surface.pixels().get_pixel(50, 40), OPAQUE_WEED);
        assert_eq!(surface.size(), (100, 100));
    }

    #[test]
    fn test_surface_follows_image_size() {
        let renderer = opaque_renderer();
        let mut surface = RasterSurface::new(None);
        renderer.render(&mut surface, &field(40, 30), &DetectionSet::default());
        renderer.render(&mut surface, &field(10, 20), &DetectionSet::default());
        assert_eq!(surface.size(), (10, 20));
    }
}
