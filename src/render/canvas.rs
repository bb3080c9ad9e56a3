/// Fixed-size drawing target for one clock frame.
/// Wraps a tiny-skia pixmap (premultiplied RGBA, 8 bits per channel).
use std::path::Path;
use tiny_skia::{Color, Pixmap};

use crate::render::error::RenderError;

pub struct Canvas {
    pixmap: Pixmap,
}

impl Canvas {
    /// Allocate a fully transparent canvas.
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        Pixmap::new(width, height)
            .map(|pixmap| Self { pixmap })
            .ok_or(RenderError::Canvas { width, height })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn fill(&mut self, color: Color) {
        self.pixmap.fill(color);
    }

    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> Option<tiny_skia::PremultipliedColorU8> {
        self.pixmap.pixel(x, y)
    }

    /// Source-over composite `color` scaled by `coverage` onto one pixel.
    /// Out-of-bounds coordinates are ignored.
    pub fn blend(&mut self, x: i32, y: i32, color: Color, coverage: f32) {
        let Some(idx) = pixel_offset(x, y, self.pixmap.width(), self.pixmap.height()) else {
            return;
        };

        let a = color.alpha() * coverage.clamp(0.0, 1.0);
        if a <= 0.0 {
            return;
        }

        let data = self.pixmap.data_mut();
        let src = [color.red() * a, color.green() * a, color.blue() * a, a];
        for (channel, s) in src.iter().enumerate() {
            let dst = data[idx + channel] as f32;
            let out = s * 255.0 + dst * (1.0 - a);
            data[idx + channel] = out.round().clamp(0.0, 255.0) as u8;
        }
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, RenderError> {
        self.pixmap.encode_png().map_err(|e| RenderError::Encode {
            reason: e.to_string(),
        })
    }

    /// Encode and overwrite `path` in place.
    pub fn write_png(&self, path: &Path) -> Result<(), RenderError> {
        let bytes = self.encode_png()?;
        std::fs::write(path, bytes).map_err(|source| RenderError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Byte offset of pixel (x, y) in a RGBA buffer `width` pixels wide, or
/// `None` outside the canvas. Computed in usize so wide canvases cannot
/// overflow.
fn pixel_offset(x: i32, y: i32, width: u32, height: u32) -> Option<usize> {
    let x = u32::try_from(x).ok().filter(|&x| x < width)?;
    let y = u32::try_from(y).ok().filter(|&y| y < height)?;
    Some((y as usize * width as usize + x as usize) * 4)
}
