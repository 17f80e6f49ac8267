//! # Convert Module
//!
//! Turns raw request strings into typed, type-erased argument values.
//!
//! ## Overview
//!
//! Rust has no runtime reflection over parameter types, so every bound parameter carries
//! a [`TypeDescriptor`] built once at registration time. The descriptor records the
//! target `TypeId`, a printable name, and the *shape* of the value:
//!
//! - **Scalar** - one raw string becomes one value (`u64`, `String`, an enum, ...)
//! - **Collection** - several raw strings become a `Vec<T>`
//! - **Map** - `key=value` pairs become a `HashMap<String, V>`
//!
//! The [`ConversionService`] holds one converter per scalar type. Built-in converters
//! cover the primitive types, `char` and `String`; anything else (enums, newtypes,
//! domain identifiers) is registered by the application with
//! [`ConversionService::register`] or [`ConversionService::register_from_str`].
//!
//! ## Example
//!
//! ```rust
//! use mvc_dispatch::convert::{ConversionService, TypeDescriptor};
//!
//! let conversion = ConversionService::new();
//! let ty = TypeDescriptor::list_of::<u32>();
//! let raw = vec!["1".to_string(), "2".to_string()];
//! let value = conversion.convert_all("ids", &raw, &ty).unwrap();
//! assert_eq!(*value.downcast::<Vec<u32>>().unwrap(), vec![1, 2]);
//! ```
//!
//! Conversion never truncates or coerces: a multi-valued input for a scalar target and
//! an unparsable string are both [`ConversionError`](crate::error::ConversionError)s.

mod core;

pub use core::{ConversionService, Erased, Shape, TypeDescriptor};
