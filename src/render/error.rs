/// Errors raised while producing one clock frame.
use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot allocate a {width}x{height} canvas")]
    Canvas { width: u32, height: u32 },

    #[error("invalid time format pattern: {pattern:?}")]
    Format { pattern: String },

    #[error("PNG encoding failed: {reason}")]
    Encode { reason: String },

    #[error("cannot write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write to stdout")]
    Announce(#[source] io::Error),
}

#[derive(Debug, Error)]
pub enum FontError {
    #[error("no font file found for family {family:?}")]
    NotFound { family: String },

    #[error("cannot read font file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not a usable font file", path.display())]
    Invalid { path: PathBuf },
}
