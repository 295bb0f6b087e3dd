//! # stencil-writer
//!
//! Output writing, best-effort formatting, and run orchestration.
//!
//! Call [`pipeline::run`] with a [`RunRequest`] to render every target of a
//! template and write it to disk.

pub mod error;
pub mod formatter;
pub mod pipeline;
pub mod writer;

pub use error::WriteError;
pub use formatter::Formatter;
pub use pipeline::{run, OutputMode, RunReport, RunRequest};
