//! Error types for stencil-renderer.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from compiling or rendering a template.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The template (or something it includes) does not parse.
    #[error("template syntax error in {template}: {message}")]
    Syntax { template: String, message: String },

    /// The template parsed but failed while rendering, e.g. an undefined
    /// variable.
    #[error("template runtime error in {template}: {message}")]
    Runtime { template: String, message: String },

    /// Filesystem error while loading an included template.
    #[error("template io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RenderError {
    pub fn is_syntax(&self) -> bool {
        matches!(self, RenderError::Syntax { .. })
    }

    pub fn is_runtime(&self) -> bool {
        matches!(self, RenderError::Runtime { .. })
    }
}

/// Flatten a tera error and its sources into one line; tera's top-level
/// message alone rarely names the cause.
pub(crate) fn describe(err: &tera::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }
    parts.join(": ")
}
