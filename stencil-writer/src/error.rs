//! Error types for stencil-writer.

use std::path::PathBuf;

use thiserror::Error;

use stencil_core::StructuralError;
use stencil_renderer::RenderError;

/// Every failure that aborts a run. Formatter failures are not here: they
/// become [`FormatStatus::FormatSkipped`](stencil_core::FormatStatus).
#[derive(Debug, Error)]
pub enum WriteError {
    /// Malformed header, binding, or configuration.
    #[error(transparent)]
    Structural(#[from] StructuralError),

    /// Template syntax or runtime failure.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`WriteError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> WriteError {
    WriteError::Io {
        path: path.into(),
        source,
    }
}
