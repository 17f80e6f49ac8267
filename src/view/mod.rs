//! # View Module
//!
//! Rendering of view names into responses.
//!
//! ## Overview
//!
//! - [`ViewRenderer`] renders one view with the request [`Model`]
//! - [`Views`] holds renderers by key plus a fallback [`ViewRendererService`]
//! - [`RenderResolver`] picks the renderer for a view: the first [`RendererRule`] whose
//!   regex matches the whole view name wins; otherwise the fallback service decides
//! - [`TemplateRenderer`] renders Jinja templates (via `minijinja`)
//! - [`ExtensionRendererService`] is a fallback that picks by file extension
//!
//! Resolution is memoised per registry: after the first lookup of a view, later lookups
//! are a single concurrent-map read. See [`RenderResolver`] for the locking scheme.

mod core;
mod resolver;
mod template;

pub use core::{ExtensionRendererService, Model, ViewRenderer, ViewRendererService, Views};
pub use resolver::{RenderResolver, RendererRule};
pub use template::TemplateRenderer;
