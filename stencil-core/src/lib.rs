//! Stencil core library — data model, header directives, bindings, config.
//!
//! - [`types`] — template source, directives, bindings, render jobs and outputs
//! - [`directive`] — header scanning and directive parsing
//! - [`binding`] — variable-list resolution
//! - [`config`] — the explicit [`StencilConfig`] record
//! - [`naming`] — single-output name and staging path derivation
//! - [`error`] — [`StructuralError`]

pub mod binding;
pub mod config;
pub mod directive;
pub mod error;
pub mod naming;
pub mod types;

pub use binding::BindingResolver;
pub use config::{FormatterConfig, StencilConfig};
pub use directive::parse_directives;
pub use error::StructuralError;
pub use types::{
    Binding, Directive, FormatStatus, Marker, RenderJob, RenderedOutput, TemplateSource,
};
