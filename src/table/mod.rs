//! # Route Tables
//!
//! Controllers declared in YAML instead of code. A table names each controller, where it
//! is mounted, the class markers it carries and the controllers it extends, and every
//! method with its pattern, verbs, parameters and render directive. Method bodies are
//! bound by name (`Controller.method`) from a [`HandlerTable`].
//!
//! ```yaml
//! controllers:
//!   - name: Base
//!     view_directory: pages
//!     rendered_with: { regex: ".*\\.html", renderer: jinja }
//!   - name: Users
//!     prefix: /app
//!     parents: [Base]
//!     methods:
//!       - name: show
//!         pattern: /user/{id}
//!         verbs: [GET]
//!         parameters:
//!           - { name: id, source: path, type: u64 }
//!           - { name: tab, source: param, type: string, default: profile }
//!           - { source: inject, type: model }
//!         view: user.html
//!       - name: legacy
//!         pattern: /old/{id}
//!         parameters:
//!           - { name: id, source: path, type: string }
//!         directive: { kind: redirect, target: "/app/user/{}" }
//! ```
//!
//! ## Types
//!
//! `bool`, `char`, `i8`..`i64`, `u8`..`u64`, `isize`, `usize`, `f32`, `f64`, `string`,
//! `list<T>` and `map<T>` over those. Injected parameters name a request-scoped value
//! instead: `request`, `request_id`, `model` or `url_match`.
//!
//! ## Directives
//!
//! `{ kind: view }` (default), `{ kind: error, status, message }`,
//! `{ kind: redirect, target }`, `{ kind: write, buffer_size }`.

mod build;
mod core;

pub use build::{parse_type, HandlerTable};
pub use core::{
    ControllerSpec, DirectiveSpec, MethodSpec, ParameterSource, ParameterSpec, RendererSpec,
    RouteTable, TableError,
};
