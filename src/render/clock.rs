/// Clock frame renderer.
/// Draws the current time onto a fresh canvas, writes it as PNG and
/// announces the file on stdout.
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::config::ClockConfig;
use crate::core::clock::Clock;
use crate::core::ticker::Iteration;
use crate::render::canvas::Canvas;
use crate::render::context::{DrawContext, TextExtent};
use crate::render::error::RenderError;
use crate::render::font::FontFace;

/// Outcome of one rendered frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub timestamp: String,
    pub path: PathBuf,
    pub extent: TextExtent,
}

impl Frame {
    /// Path line, then timestamp line, then flush.
    pub fn announce(&self, out: &mut dyn Write) -> Result<(), RenderError> {
        writeln!(out, "{}", self.path.display()).map_err(RenderError::Announce)?;
        writeln!(out, "{}", self.timestamp).map_err(RenderError::Announce)?;
        out.flush().map_err(RenderError::Announce)
    }
}

pub struct ClockRenderer {
    config: ClockConfig,
    face: FontFace,
    clock: Arc<dyn Clock>,
}

impl ClockRenderer {
    pub fn new(config: ClockConfig, face: FontFace, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            face,
            clock,
        }
    }

    /// Draw `text` on a new canvas. The drawing context lives only for the
    /// duration of this call.
    pub fn draw(&self, text: &str) -> Result<(Canvas, TextExtent), RenderError> {
        let mut canvas = Canvas::new(self.config.width, self.config.height)?;
        if let Some(background) = self.config.background {
            canvas.fill(background);
        }

        let extent = {
            let fg = self.config.foreground;
            let (x, y) = self.config.origin;
            let mut ctx = DrawContext::new(&mut canvas, &self.face, self.config.font.size);
            ctx.move_to(x, y);
            if fg.is_opaque() {
                ctx.set_source_rgb(fg.red(), fg.green(), fg.blue());
            } else {
                ctx.set_source_rgba(fg.red(), fg.green(), fg.blue(), fg.alpha());
            }
            ctx.show_text(text)
        };

        Ok((canvas, extent))
    }

    /// One full iteration: format, draw, write, announce.
    pub fn render(&self, out: &mut dyn Write) -> Result<Frame, RenderError> {
        let now = self.clock.now();
        let timestamp = self.config.format.render(&now)?;

        let (extent, size) = {
            let (canvas, extent) = self.draw(&timestamp)?;
            canvas.write_png(&self.config.output_path)?;
            (extent, (canvas.width(), canvas.height()))
        };

        let frame = Frame {
            timestamp,
            path: self.config.output_path.clone(),
            extent,
        };
        frame.announce(out)?;

        debug!(
            "Rendered '{}' ({}x{} px of text on {}x{}) to {}",
            frame.timestamp,
            extent.width(),
            extent.height(),
            size.0,
            size.1,
            frame.path.display()
        );
        Ok(frame)
    }
}

impl Iteration for ClockRenderer {
    fn run_once(&mut self, out: &mut dyn Write) -> Result<Frame, RenderError> {
        self.render(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::SteppingClock;
    use crate::render::font::test_face;
    use tiny_skia::Color;

    fn renderer(dir: &tempfile::TempDir, face: FontFace) -> ClockRenderer {
        let config = ClockConfig {
            output_path: dir.path().join("custom-clock.png"),
            ..ClockConfig::default()
        };
        ClockRenderer::new(config, face, Arc::new(SteppingClock::seconds()))
    }

    #[test]
    fn test_announce_order_and_flush() {
        let frame = Frame {
            timestamp: "2026-10-14 09:05:03".to_string(),
            path: PathBuf::from("/tmp/custom-clock.png"),
            extent: TextExtent::default(),
        };
        let mut out = Vec::new();
        frame.announce(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "/tmp/custom-clock.png\n2026-10-14 09:05:03\n"
        );
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_announce_reports_stdout_failure() {
        let frame = Frame {
            timestamp: "t".to_string(),
            path: PathBuf::from("p"),
            extent: TextExtent::default(),
        };
        assert!(matches!(
            frame.announce(&mut BrokenPipe),
            Err(RenderError::Announce(_))
        ));
    }

    #[test]
    fn test_render_writes_png_and_announces() {
        let Some(face) = test_face() else { return };
        let dir = tempfile::tempdir().unwrap();
        let renderer = renderer(&dir, face);

        let mut out = Vec::new();
        let frame = renderer.render(&mut out).unwrap();
        assert_eq!(frame.timestamp, "2026-10-14 09:05:03.120034");
        assert!(!frame.extent.is_empty());

        let stdout = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = stdout.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], frame.path.display().to_string());
        assert_eq!(lines[1], frame.timestamp);

        let img = image::open(&frame.path).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (270, 28));
        assert!(img.pixels().any(|p| p[3] > 0));
        // Left margin and rows near the top stay transparent.
        for y in 0..28 {
            assert_eq!(img.get_pixel(0, y)[3], 0);
        }
        for x in 0..270 {
            assert_eq!(img.get_pixel(x, 0)[3], 0);
        }
    }

    #[test]
    fn test_consecutive_renders_overwrite_one_file() {
        let Some(face) = test_face() else { return };
        let dir = tempfile::tempdir().unwrap();
        let renderer = renderer(&dir, face);

        let mut out = Vec::new();
        let first = renderer.render(&mut out).unwrap();
        let first_bytes = std::fs::read(&first.path).unwrap();
        let second = renderer.render(&mut out).unwrap();
        let second_bytes = std::fs::read(&second.path).unwrap();

        assert_eq!(first.path, second.path);
        assert_ne!(first.timestamp, second.timestamp);
        assert_ne!(first_bytes, second_bytes);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_background_fill() {
        let Some(face) = test_face() else { return };
        let dir = tempfile::tempdir().unwrap();
        let mut renderer = renderer(&dir, face);
        renderer.config.background = Some(Color::from_rgba8(0, 0, 255, 255));

        let (canvas, _) = renderer.draw("").unwrap();
        let px = canvas.pixel(0, 0).unwrap();
        assert_eq!((px.red(), px.green(), px.blue(), px.alpha()), (0, 0, 255, 255));
    }

    #[test]
    fn test_foreground_alpha_reaches_the_canvas() {
        let Some(face) = test_face() else { return };
        let dir = tempfile::tempdir().unwrap();
        let mut renderer = renderer(&dir, face);

        let max_alpha = |canvas: &Canvas| {
            (0..canvas.width())
                .flat_map(|x| (0..canvas.height()).map(move |y| (x, y)))
                .filter_map(|(x, y)| canvas.pixel(x, y))
                .map(|p| p.alpha())
                .max()
                .unwrap_or(0)
        };

        let (opaque, _) = renderer.draw("00:00:00").unwrap();
        let full = max_alpha(&opaque) as f32;
        assert!(full > 0.0);

        renderer.config.foreground = Color::from_rgba8(255, 255, 255, 64);
        let (translucent, _) = renderer.draw("00:00:00").unwrap();
        let alpha = max_alpha(&translucent) as f32;
        // Same glyph coverage, scaled by the source alpha.
        assert!(alpha <= 64.0, "alpha {alpha}");
        assert!((alpha - full * 64.0 / 255.0).abs() <= 2.0, "alpha {alpha} vs {full}");
    }

    #[test]
    fn test_unwritable_path_is_a_write_error() {
        let Some(face) = test_face() else { return };
        let dir = tempfile::tempdir().unwrap();
        let mut renderer = renderer(&dir, face);
        renderer.config.output_path = dir.path().join("no-such-dir").join("clock.png");

        let mut out = Vec::new();
        assert!(matches!(
            renderer.render(&mut out),
            Err(RenderError::Write { .. })
        ));
        // Nothing is announced for a frame that was never written.
        assert!(out.is_empty());
    }
}
