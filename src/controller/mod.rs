//! # Controller Module
//!
//! Controllers group methods and share view configuration.
//!
//! ## Overview
//!
//! A [`ControllerRegistry`] is built once per controller from a [`ControllerBuilder`]:
//!
//! ```rust
//! use mvc_dispatch::controller::{ClassMarker, ControllerRegistry};
//! use mvc_dispatch::invocation::{Mapping, ReturnValue};
//! use std::sync::Arc;
//!
//! struct Users;
//!
//! let registry = ControllerRegistry::builder("Users", Arc::new(Users))
//!     .marker(ClassMarker::ViewDirectory("users".into()))
//!     .handle(Mapping::get("show", "/user/{id}").path_var::<u64>("id"), |_ctl, args| {
//!         let id: u64 = args.take(0)?;
//!         Ok(Some(ReturnValue::display(format!("user-{id}.html"))))
//!     })
//!     .build()
//!     .unwrap();
//! assert_eq!(registry.view_path("show.html"), "users/show.html");
//! ```
//!
//! ## Class markers
//!
//! View directory and renderer rules are [`ClassMarker`]s. They are looked up on the
//! controller first and then through the controllers it extends (see
//! [`MarkerHierarchy`]). A `Rendered` rule list wins over a single `RenderedWith` rule.

mod markers;
mod registry;

pub use markers::{ClassMarker, ControllerMarkers, MarkerHierarchy};
pub use registry::{ControllerBuilder, ControllerRegistry, Factory, InvocationMatch, Provider};
