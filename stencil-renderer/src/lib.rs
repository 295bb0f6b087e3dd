//! # stencil-renderer
//!
//! Tera-based template engine. Renders a template body against one
//! [`Binding`](stencil_core::Binding) at a time, with includes resolved
//! through an explicit search path.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use stencil_core::Binding;
//! use stencil_renderer::TemplateEngine;
//!
//! fn render_twice() -> Result<(), stencil_renderer::RenderError> {
//!     let engine = TemplateEngine::new(["templates"]);
//!     let compiled = engine.compile("greeting", "hello ${who}")?;
//!     for who in ["world", "there"] {
//!         let binding: Binding = [("who", who)].into_iter().collect();
//!         println!("{}", compiled.render(&binding)?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod error;
pub mod shorthand;

pub use engine::{render, CompiledTemplate, TemplateEngine};
pub use error::RenderError;
