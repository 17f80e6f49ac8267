//! # Fetchers Module
//!
//! One [`ArgumentFetcher`] per declared method parameter turns request data into the
//! typed argument the method expects.
//!
//! | Fetcher                      | Reads                          | Absent value            |
//! |------------------------------|--------------------------------|-------------------------|
//! | [`PathVariableFetcher`]      | a variable captured by the URL | internal dispatch error |
//! | [`RequestParamFetcher`]      | query / form parameters        | default or missing      |
//! | [`RequestAttributeFetcher`]  | request attributes             | default or missing      |
//! | [`InjectedFetcher`]          | the request scope              | missing                 |
//!
//! `RequestParamFetcher` hands collection and map typed parameters to
//! [`CollectionDelegateFetcher`] and [`MapDelegateFetcher`].
//!
//! A declared default is converted exactly as an explicit value would be, so
//! `?page=1` and an absent `page` with default `"1"` produce the same argument.

mod core;
mod injected;
mod path_variable;
mod request_attribute;
mod request_param;
#[cfg(test)]
mod tests;

pub use core::{ArgumentFetcher, FetchContext};
pub use injected::InjectedFetcher;
pub use path_variable::PathVariableFetcher;
pub use request_attribute::RequestAttributeFetcher;
pub use request_param::{CollectionDelegateFetcher, MapDelegateFetcher, RequestParamFetcher};
