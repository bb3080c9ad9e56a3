/// XML config file.
///
/// ```xml
/// <clock width="270" height="28" output="/tmp/custom-clock.png" interval="1000">
///   <font family="Courier" size="16" slant="normal" weight="normal"/>
///   <cursor x="3" y="20"/>
///   <color foreground="#ffffff" background="none"/>
/// </clock>
/// ```
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use super::{ConfigError, ConfigLayer};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClockFile {
    #[serde(rename = "@width")]
    pub width: Option<u32>,
    #[serde(rename = "@height")]
    pub height: Option<u32>,
    #[serde(rename = "@output")]
    pub output: Option<PathBuf>,
    /// Milliseconds between frames
    #[serde(rename = "@interval")]
    pub interval: Option<u64>,
    #[serde(rename = "@format")]
    pub format: Option<String>,
    #[serde(rename = "@count")]
    pub count: Option<u64>,
    #[serde(rename = "@onError")]
    pub on_error: Option<String>,
    pub font: Option<FontElement>,
    pub cursor: Option<CursorElement>,
    pub color: Option<ColorElement>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FontElement {
    #[serde(rename = "@family")]
    pub family: Option<String>,
    #[serde(rename = "@size")]
    pub size: Option<f32>,
    #[serde(rename = "@slant")]
    pub slant: Option<String>,
    #[serde(rename = "@weight")]
    pub weight: Option<String>,
    #[serde(rename = "@path")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CursorElement {
    #[serde(rename = "@x")]
    pub x: Option<f32>,
    #[serde(rename = "@y")]
    pub y: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ColorElement {
    #[serde(rename = "@foreground")]
    pub foreground: Option<String>,
    #[serde(rename = "@background")]
    pub background: Option<String>,
}

impl ClockFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let xml = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file = Self::parse(&xml).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded config from {}", path.display());
        Ok(file)
    }

    pub fn parse(xml: &str) -> Result<Self, quick_xml::DeError> {
        quick_xml::de::from_str(xml.trim())
    }

    pub fn into_layer(self) -> ConfigLayer {
        let font = self.font.unwrap_or_default();
        let cursor = self.cursor.unwrap_or_default();
        let color = self.color.unwrap_or_default();
        ConfigLayer {
            width: self.width,
            height: self.height,
            output_path: self.output,
            font_family: font.family,
            font_path: font.path,
            font_size: font.size,
            slant: font.slant,
            weight: font.weight,
            x: cursor.x,
            y: cursor.y,
            color: color.foreground,
            background: color.background,
            format: self.format,
            interval_ms: self.interval,
            count: self.count,
            on_error: self.on_error,
        }
    }
}
