//! Error types for stencil-core.

use std::path::PathBuf;

use thiserror::Error;

/// Structural failures: the template header, a binding list, or the
/// configuration record is not well formed. Always fatal for a run.
#[derive(Debug, Error)]
pub enum StructuralError {
    /// A header line starts with the directive marker but does not split
    /// into marker, output filename and variable list.
    #[error("malformed directive on line {line}: `{content}` ({reason})")]
    MalformedDirective {
        line: usize,
        content: String,
        reason: String,
    },

    /// A variable-list entry is missing its `=` or its key.
    #[error("malformed binding `{token}`: {reason}")]
    MalformedBinding { token: String, reason: String },

    /// The template header declares no directives.
    #[error("no directives found in the header of {path}")]
    NoDirectives { path: PathBuf },

    /// The derived single-output name would clobber the template itself.
    #[error("output name `{name}` would overwrite the template {template}; pass --outputname")]
    OutputNameCollision { name: String, template: PathBuf },

    /// The configuration file could not be read.
    #[error("failed to read configuration at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML or names an unknown key.
    #[error("failed to parse configuration at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration at {path}: {reason}")]
    Config { path: PathBuf, reason: String },
}

impl StructuralError {
    pub(crate) fn directive(line: usize, content: &str, reason: impl Into<String>) -> Self {
        StructuralError::MalformedDirective {
            line,
            content: content.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn binding(token: &str, reason: impl Into<String>) -> Self {
        StructuralError::MalformedBinding {
            token: token.to_string(),
            reason: reason.into(),
        }
    }
}
