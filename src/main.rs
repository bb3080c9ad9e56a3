use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

mod config;
mod core;
mod render;

use crate::config::file::ClockFile;
use crate::config::{ClockConfig, ConfigLayer};
use crate::core::clock::SystemClock;
use crate::core::ticker::{Ticker, TokioPacer};
use crate::render::clock::ClockRenderer;
use crate::render::font::{FontFace, FontLocator};

#[derive(Parser, Debug)]
#[command(
    name = "custom-clock",
    about = "Renders the current time to a PNG once per second for a status bar"
)]
struct Args {
    /// XML config file; command line flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output PNG path [default: /tmp/custom-clock.png]
    #[arg(short, long)]
    output_path: Option<PathBuf>,

    /// Image width in pixels [default: 270]
    #[arg(long)]
    width: Option<u32>,

    /// Image height in pixels [default: 28]
    #[arg(long)]
    height: Option<u32>,

    /// Font family [default: Courier]
    #[arg(long)]
    font_family: Option<String>,

    /// Font file, bypasses the family lookup
    #[arg(long)]
    font_path: Option<PathBuf>,

    /// Font em size in pixels [default: 16]
    #[arg(long)]
    font_size: Option<f32>,

    /// Font slant: normal, italic, oblique
    #[arg(long)]
    slant: Option<String>,

    /// Font weight: normal, bold
    #[arg(long)]
    weight: Option<String>,

    /// Text left edge [default: 3]
    #[arg(long)]
    x: Option<f32>,

    /// Text baseline [default: 20]
    #[arg(long)]
    y: Option<f32>,

    /// Text color, #rrggbb or #rrggbbaa [default: #ffffff]
    #[arg(long)]
    color: Option<String>,

    /// Background color, or "none" [default: none]
    #[arg(long)]
    background: Option<String>,

    /// strftime pattern [default: %Y-%m-%d %H:%M:%S with microseconds]
    #[arg(short, long)]
    format: Option<String>,

    /// Milliseconds between frames [default: 1000]
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Stop after this many frames
    #[arg(short = 'n', long)]
    count: Option<u64>,

    /// What to do when a frame fails: abort, continue [default: abort]
    #[arg(long)]
    on_error: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn layer(&self) -> ConfigLayer {
        ConfigLayer {
            width: self.width,
            height: self.height,
            output_path: self.output_path.clone(),
            font_family: self.font_family.clone(),
            font_path: self.font_path.clone(),
            font_size: self.font_size,
            slant: self.slant.clone(),
            weight: self.weight.clone(),
            x: self.x,
            y: self.y,
            color: self.color.clone(),
            background: self.background.clone(),
            format: self.format.clone(),
            interval_ms: self.interval_ms,
            count: self.count,
            on_error: self.on_error.clone(),
        }
    }

    fn config(&self) -> Result<ClockConfig> {
        let mut config = ClockConfig::default();
        if let Some(path) = &self.config {
            let file = ClockFile::load(path)?;
            config.merge(file.into_layer())?;
        }
        config.merge(self.layer())?;
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // stdout carries the path/timestamp lines, logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.parse().unwrap_or_default()),
        )
        .init();

    let config = args.config().context("Invalid configuration")?;

    let face = FontFace::resolve(&config.font, &FontLocator::system())
        .with_context(|| format!("Failed to load font '{}'", config.font.family))?;

    info!(
        "custom-clock v{} starting ({}x{}, {} @ {}px from {}, every {:?}) -> {}",
        env!("CARGO_PKG_VERSION"),
        config.width,
        config.height,
        config.font.family,
        config.font.size,
        face.path().display(),
        config.interval,
        config.output_path.display()
    );

    let mut ticker = Ticker::new(config.interval, config.on_error, config.count, TokioPacer);
    let mut renderer = ClockRenderer::new(config, face, Arc::new(SystemClock));
    let mut stdout = std::io::stdout();

    let summary = ticker
        .run(&mut renderer, &mut stdout, shutdown_signal())
        .await?;

    info!(
        "custom-clock shutdown ({} frame(s), {} failed)",
        summary.iterations, summary.failures
    );
    Ok(())
}

/// Resolves on SIGINT, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {}", e);
                ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c.await;
}
