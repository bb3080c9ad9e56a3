/// Stateful drawing handle bound to one canvas: cursor, source color and
/// font, plus text rendering.
use tiny_skia::Color;
use tracing::trace;

use crate::render::canvas::Canvas;
use crate::render::font::FontFace;

/// Pixel bounds of drawn glyphs. `right`/`bottom` are exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextExtent {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl TextExtent {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    fn union(self, other: TextExtent) -> TextExtent {
        if self.is_empty() {
            return other;
        }
        TextExtent {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

pub struct DrawContext<'a> {
    canvas: &'a mut Canvas,
    face: &'a FontFace,
    scale: rusttype::Scale,
    /// x is the pen position, y the baseline.
    cursor: (f32, f32),
    source: Color,
}

impl<'a> DrawContext<'a> {
    /// Starts with the cursor at the origin and an opaque black source.
    pub fn new(canvas: &'a mut Canvas, face: &'a FontFace, em_size: f32) -> Self {
        Self {
            canvas,
            face,
            scale: face.scale_for_em(em_size),
            cursor: (0.0, 0.0),
            source: Color::BLACK,
        }
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        self.cursor = (x, y);
    }

    #[cfg(test)]
    pub fn cursor(&self) -> (f32, f32) {
        self.cursor
    }

    /// Opaque color; components are clamped to 0.0..=1.0.
    pub fn set_source_rgb(&mut self, r: f32, g: f32, b: f32) {
        self.set_source_rgba(r, g, b, 1.0);
    }

    pub fn set_source_rgba(&mut self, r: f32, g: f32, b: f32, a: f32) {
        let c = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        self.source = Color::from_rgba(c(r), c(g), c(b), c(a)).unwrap_or(Color::BLACK);
    }

    /// Draw `text` with its baseline at the cursor and advance the cursor
    /// past it.
    pub fn show_text(&mut self, text: &str) -> TextExtent {
        let (x, y) = self.cursor;
        let face = self.face;
        let glyphs: Vec<_> = face
            .font()
            .layout(text, self.scale, rusttype::point(x, y))
            .collect();

        let mut extent = TextExtent::default();
        let color = self.source;
        for glyph in &glyphs {
            if let Some(bb) = glyph.pixel_bounding_box() {
                let canvas = &mut *self.canvas;
                glyph.draw(|gx, gy, v| {
                    canvas.blend(bb.min.x + gx as i32, bb.min.y + gy as i32, color, v);
                });
                extent = extent.union(TextExtent {
                    left: bb.min.x,
                    top: bb.min.y,
                    right: bb.max.x,
                    bottom: bb.max.y,
                });
            }
        }

        if let Some(last) = glyphs.last() {
            let advance = last.unpositioned().h_metrics().advance_width;
            self.cursor.0 = last.position().x + advance;
        }

        trace!("show_text {:?} -> {:?}", text, extent);
        extent
    }
}
