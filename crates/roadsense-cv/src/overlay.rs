//! Detection overlay
//!
//! [`AnnotationRenderer`] turns the current "last detection" into an
//! [`Overlay`] display list. No detection means an empty overlay, so a
//! stale box can never outlive the detection that produced it.

use crate::bbox::BBox;
use crate::detection::DetectionResult;
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Visual style of the overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayStyle {
    /// Box and label background colour (RGBA)
    pub color: [u8; 4],
    pub line_width: u32,
    /// (width, height) of the label background drawn above the box
    pub label_size: (u32, u32),
    pub text_color: [u8; 4],
    pub font: String,
    /// Text origin relative to the box's top-left corner
    pub text_offset: (i32, i32),
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            color: [0xef, 0x44, 0x44, 0xff],
            line_width: 4,
            label_size: (140, 30),
            text_color: [0xff, 0xff, 0xff, 0xff],
            font: "18px Arial".to_string(),
            text_offset: (5, -8),
        }
    }
}

/// One drawing primitive
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    StrokeRect { rect: BBox, line_width: u32, color: [u8; 4] },
    FillRect { rect: BBox, color: [u8; 4] },
    Text { text: String, x: i32, y: i32, font: String, color: [u8; 4] },
}

/// Ordered display list, drawn back to front
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    shapes: Vec<Shape>,
}

impl Overlay {
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// The label text, if the overlay carries one
    pub fn label(&self) -> Option<&str> {
        self.shapes.iter().find_map(|s| match s {
            Shape::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn draw_on<S: Surface + ?Sized>(&self, surface: &mut S) {
        for shape in &self.shapes {
            match shape {
                Shape::StrokeRect { rect, line_width, color } => surface.stroke_rect(*rect, *line_width, *color),
                Shape::FillRect { rect, color } => surface.fill_rect(*rect, *color),
                Shape::Text { text, x, y, font, color } => surface.fill_text(text, *x, *y, font, *color),
            }
        }
    }
}

/// Something the overlay can be drawn onto
pub trait Surface {
    fn fill_rect(&mut self, rect: BBox, color: [u8; 4]);

    fn fill_text(&mut self, text: &str, x: i32, y: i32, font: &str, color: [u8; 4]);

    /// Stroke centred on the rectangle's edges, like a 2D canvas
    fn stroke_rect(&mut self, rect: BBox, line_width: u32, color: [u8; 4]) {
        let w = i32::try_from(line_width).unwrap_or(i32::MAX);
        let half = w / 2;
        let outer = BBox::new(rect.x - half, rect.y - half, rect.width + w, rect.height + w);

        self.fill_rect(BBox::new(outer.x, outer.y, outer.width, w), color);
        self.fill_rect(BBox::new(outer.x, outer.bottom() - w, outer.width, w), color);
        self.fill_rect(BBox::new(outer.x, outer.y, w, outer.height), color);
        self.fill_rect(BBox::new(outer.right() - w, outer.y, w, outer.height), color);
    }
}

impl Surface for RgbaImage {
    fn fill_rect(&mut self, rect: BBox, color: [u8; 4]) {
        let Some(clip) = rect.clipped(self.width(), self.height()) else {
            return;
        };
        for y in clip.y..clip.bottom() {
            for x in clip.x..clip.right() {
                self.put_pixel(x as u32, y as u32, Rgba(color));
            }
        }
    }

    fn fill_text(&mut self, text: &str, x: i32, y: i32, _font: &str, _color: [u8; 4]) {
        // raw pixel buffers carry no font rasterizer; the label background
        // still marks the detection
        trace!(text, x, y, "Skipping text on raster surface");
    }
}

/// Stateless overlay builder
#[derive(Debug, Clone, Default)]
pub struct AnnotationRenderer {
    style: OverlayStyle,
}

impl AnnotationRenderer {
    pub fn new(style: OverlayStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    pub fn render(&self, detection: Option<&DetectionResult>) -> Overlay {
        let Some(detection) = detection else {
            return Overlay::default();
        };

        let style = &self.style;
        let (label_w, label_h) = style.label_size;
        let label_box = detection.bbox.stacked_above(
            i32::try_from(label_w).unwrap_or(i32::MAX),
            i32::try_from(label_h).unwrap_or(i32::MAX),
        );

        Overlay {
            shapes: vec![
                Shape::StrokeRect {
                    rect: detection.bbox,
                    line_width: style.line_width,
                    color: style.color,
                },
                Shape::FillRect {
                    rect: label_box,
                    color: style.color,
                },
                Shape::Text {
                    text: format!("{} {}%", detection.label, detection.percent()),
                    x: detection.bbox.x + style.text_offset.0,
                    y: detection.bbox.y + style.text_offset.1,
                    font: style.font.clone(),
                    color: style.text_color,
                },
            ],
        }
    }
}
