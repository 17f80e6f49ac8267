//! # Invocation Module
//!
//! Compiled controller methods and what happens to their output.
//!
//! ## Overview
//!
//! A [`Mapping`] declares a method: URL pattern, accepted verbs, one fetcher per
//! parameter, a [`RenderDirective`] and an optional default view. Compiling it yields an
//! immutable [`InvocationDescriptor`], which can:
//!
//! - decide whether it serves a request ([`InvocationDescriptor::can_serve`])
//! - resolve its arguments and call the method ([`InvocationDescriptor::invoke`])
//!
//! [`apply_directive`] then interprets the method's [`ReturnValue`]:
//!
//! | Directive  | Return value                  | Response                              |
//! |------------|-------------------------------|---------------------------------------|
//! | `Error`    | integer                       | error with that status                |
//! | `Error`    | other value                   | error with that message               |
//! | `Redirect` | value, target has `{}`        | redirect to the substituted target    |
//! | `Redirect` | value, empty target           | redirect to the value                 |
//! | `Write`    | value or stream               | body, copied in buffer-sized chunks   |
//! | `View`     | value                         | view named by the value               |
//!
//! ## Example
//!
//! ```rust
//! use mvc_dispatch::invocation::Mapping;
//!
//! let mapping = Mapping::post("save", "/user/{id}")
//!     .path_var::<u64>("id")
//!     .redirect("/user/{}");
//! assert_eq!(mapping.name(), "save");
//! ```

mod core;
mod descriptor;
mod directive;
mod mapping;

pub use core::{Arguments, InvokeFn, MethodResult, RenderDirective, ReturnValue};
pub use descriptor::InvocationDescriptor;
pub use directive::{apply_directive, write_value, PLACEHOLDER};
pub use mapping::Mapping;
