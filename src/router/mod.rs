//! # Router Module
//!
//! URL pattern compilation and the "most specific wins" ranking used to pick one
//! invocation per request.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Compiling controller URL patterns (e.g. `/users/{id}`) into anchored regexes
//! - Matching a request path and extracting captured path variables
//! - Ranking competing matches so exactly one invocation wins
//!
//! ## Pattern Syntax
//!
//! | Pattern               | Matches             | Captures            |
//! |-----------------------|---------------------|---------------------|
//! | `/users`              | `/users`            | nothing             |
//! | `/users/{id}`         | `/users/42`         | `id = "42"`         |
//! | `/files/{name:.+}`    | `/files/a/b.txt`    | `name = "a/b.txt"`  |
//! | `/v{major:[0-9]+}/x`  | `/v2/x`             | `major = "2"`       |
//!
//! A variable without an explicit regex matches one path segment (`[^/]+`). Everything
//! outside braces is literal text.
//!
//! ## Ranking
//!
//! When several patterns match one path the winner is decided by [`Specificity`]:
//!
//! 1. longer literal (non-capturing) text wins
//! 2. fewer captures win
//! 3. the pattern of the registry added to the servlet first wins
//! 4. within one registry, the method registered first wins
//!
//! [`pick_best`] compares two optional matches on that key. Because the key is a total
//! order the fold over an unordered set of registries is commutative and associative.

mod core;
mod pattern;
#[cfg(test)]
mod tests;

pub use core::{
    pick_best, ParamVec, Ranked, Specificity, UrlMatch, MAX_INLINE_PARAMS,
};
pub use pattern::PathPattern;
