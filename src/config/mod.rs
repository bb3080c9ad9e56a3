pub mod file;

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tiny_skia::Color;

use crate::core::timestamp::TimeFormat;
use crate::render::font::FontSpec;

pub const DEFAULT_OUTPUT_PATH: &str = "/tmp/custom-clock.png";

/// 16M pixels (64 MiB of RGBA), far above any status bar image.
pub const MAX_CANVAS_PIXELS: u64 = 1 << 24;

/// Top-level clock configuration
#[derive(Debug, Clone)]
pub struct ClockConfig {
    pub width: u32,
    pub height: u32,
    pub output_path: PathBuf,
    pub font: FontSpec,
    /// Text origin: left edge and baseline, in pixels
    pub origin: (f32, f32),
    pub foreground: Color,
    /// `None` leaves the canvas transparent
    pub background: Option<Color>,
    pub format: TimeFormat,
    pub interval: Duration,
    /// Stop after this many iterations; `None` runs forever
    pub count: Option<u64>,
    pub on_error: ErrorPolicy,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            width: 270,
            height: 28,
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            font: FontSpec::default(),
            origin: (3.0, 20.0),
            foreground: Color::WHITE,
            background: None,
            format: TimeFormat::Default,
            interval: Duration::from_secs(1),
            count: None,
            on_error: ErrorPolicy::Abort,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stop on the first failed iteration
    #[default]
    Abort,
    /// Log the failure and keep ticking
    Continue,
}

impl std::str::FromStr for ErrorPolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abort" | "exit" | "stop" => Ok(ErrorPolicy::Abort),
            "continue" | "keep-going" | "ignore" => Ok(ErrorPolicy::Continue),
            _ => Err(format!("Unknown error policy: {s}")),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: quick_xml::DeError,
    },

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// One source of settings (config file or command line). Unset fields keep
/// whatever the previous layer chose.
#[derive(Debug, Clone, Default)]
pub struct ConfigLayer {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub output_path: Option<PathBuf>,
    pub font_family: Option<String>,
    pub font_path: Option<PathBuf>,
    pub font_size: Option<f32>,
    pub slant: Option<String>,
    pub weight: Option<String>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub color: Option<String>,
    pub background: Option<String>,
    pub format: Option<String>,
    pub interval_ms: Option<u64>,
    pub count: Option<u64>,
    pub on_error: Option<String>,
}

impl ClockConfig {
    /// Apply a layer on top of the current values.
    pub fn merge(&mut self, layer: ConfigLayer) -> Result<(), ConfigError> {
        if let Some(v) = layer.width {
            self.width = v;
        }
        if let Some(v) = layer.height {
            self.height = v;
        }
        if let Some(v) = layer.output_path {
            self.output_path = v;
        }
        if let Some(v) = layer.font_family {
            self.font.family = v;
        }
        if let Some(v) = layer.font_path {
            self.font.path = Some(v);
        }
        if let Some(v) = layer.font_size {
            self.font.size = v;
        }
        if let Some(v) = layer.slant {
            self.font.slant = v.parse().map_err(|e: String| invalid("font slant", e))?;
        }
        if let Some(v) = layer.weight {
            self.font.weight = v.parse().map_err(|e: String| invalid("font weight", e))?;
        }
        if let Some(v) = layer.x {
            self.origin.0 = v;
        }
        if let Some(v) = layer.y {
            self.origin.1 = v;
        }
        if let Some(v) = layer.color {
            self.foreground = parse_color(&v).map_err(|e| invalid("color", e))?;
        }
        if let Some(v) = layer.background {
            self.background = if matches!(v.to_lowercase().as_str(), "none" | "transparent") {
                None
            } else {
                Some(parse_color(&v).map_err(|e| invalid("background", e))?)
            };
        }
        if let Some(v) = layer.format {
            self.format = TimeFormat::pattern(&v).map_err(|e| invalid("format", e.to_string()))?;
        }
        if let Some(v) = layer.interval_ms {
            self.interval = Duration::from_millis(v);
        }
        if let Some(v) = layer.count {
            self.count = Some(v);
        }
        if let Some(v) = layer.on_error {
            self.on_error = v.parse().map_err(|e: String| invalid("error policy", e))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(invalid(
                "canvas size",
                format!("{}x{} has a zero side", self.width, self.height),
            ));
        }
        if self.width as u64 * self.height as u64 > MAX_CANVAS_PIXELS {
            return Err(invalid(
                "canvas size",
                format!(
                    "{}x{} exceeds {} pixels",
                    self.width, self.height, MAX_CANVAS_PIXELS
                ),
            ));
        }
        if !self.font.size.is_finite() || self.font.size <= 0.0 {
            return Err(invalid("font size", format!("{} is not positive", self.font.size)));
        }
        if !self.origin.0.is_finite() || !self.origin.1.is_finite() {
            return Err(invalid("cursor", format!("{:?} is not finite", self.origin)));
        }
        if self.interval.is_zero() {
            return Err(invalid("interval", "must be at least 1ms"));
        }
        if self.count == Some(0) {
            return Err(invalid("count", "must be at least 1"));
        }
        Ok(())
    }
}

/// Parse `#rrggbb` or `#rrggbbaa`.
pub fn parse_color(color: &str) -> Result<Color, String> {
    let s = color.trim().trim_start_matches('#');
    if !(s.len() == 6 || s.len() == 8) || !s.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("expected #rrggbb or #rrggbbaa, got {color:?}"));
    }
    let byte = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).map_err(|e| e.to_string());
    let a = if s.len() == 8 { byte(6)? } else { 255 };
    Ok(Color::from_rgba8(byte(0)?, byte(2)?, byte(4)?, a))
}
