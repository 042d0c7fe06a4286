//! Error types surfaced by the conversion call.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for the top-level conversion API.
pub type Result<T> = std::result::Result<T, Error>;

/// Any failure of a conversion request.
#[derive(Debug, Error)]
pub enum Error {
    /// The request itself was incomplete.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The rendering engine failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The directory that should hold the PDF could not be created.
    #[error("failed to create output directory '{}': {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Missing or contradictory request input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Output path is required")]
    MissingOutputPath,
    #[error("Either HTML content or file path is required")]
    MissingSource,
}

/// Failure inside the rendering engine.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to read HTML file '{}': {source}", path.display())]
    ReadSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("HTML file '{}' is not valid UTF-8", path.display())]
    Encoding { path: PathBuf },

    #[error("invalid base URL '{url}': {reason}")]
    BaseUrl { url: String, reason: String },

    #[error("failed to write PDF to '{}': {source}", path.display())]
    WritePdf {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("rendering failed: {0}")]
    Engine(String),
}

impl Error {
    pub fn is_render(&self) -> bool {
        matches!(self, Error::Render(_))
    }
}
