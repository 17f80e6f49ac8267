//! Router core module - match values and ranking on the request hot path.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use smallvec::SmallVec;
use std::cmp::{Ordering, Reverse};
use std::collections::HashMap;
use std::sync::Arc;

/// Maximum number of path variables before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Captured path variables, in pattern order.
///
/// Names are shared with the compiled pattern (`Arc<str>`); values are per-request.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// How specific a matched pattern is. Greater is better.
///
/// Full ties go to the registry added to the servlet first, then to the method
/// registered first within that registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Specificity {
    /// Number of literal characters in the pattern
    pub literal_len: usize,
    /// Number of capture groups (path variables) in the pattern
    pub captures: usize,
    /// Position of the owning registry in its servlet
    pub registry: usize,
    /// Position of the method within its registry
    pub order: usize,
}

impl Specificity {
    fn key(&self) -> (usize, Reverse<usize>, Reverse<usize>, Reverse<usize>) {
        (
            self.literal_len,
            Reverse(self.captures),
            Reverse(self.registry),
            Reverse(self.order),
        )
    }
}

impl Ord for Specificity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for Specificity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A successful URL match: captured variables plus the pattern's specificity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlMatch {
    /// Path variables extracted from the URL (e.g. `{id}` → `("id", "123")`)
    pub path_variables: ParamVec,
    /// Ranking of the matched pattern
    pub specificity: Specificity,
}

impl UrlMatch {
    /// Get a path variable by name
    #[inline]
    #[must_use]
    pub fn path_variable(&self, name: &str) -> Option<&str> {
        self.path_variables
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Convert path variables to a HashMap
    /// Note: This allocates - use path_variable() in hot paths instead
    #[must_use]
    pub fn path_variables_map(&self) -> HashMap<String, String> {
        self.path_variables
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// Anything that carries a [`Specificity`] and can therefore be ranked.
pub trait Ranked {
    fn specificity(&self) -> Specificity;
}

impl Ranked for UrlMatch {
    fn specificity(&self) -> Specificity {
        self.specificity
    }
}

/// Keep the better of two optional matches.
///
/// A match always beats no match; between two matches the greater [`Specificity`] wins.
#[must_use]
pub fn pick_best<M: Ranked>(current: Option<M>, candidate: Option<M>) -> Option<M> {
    match (current, candidate) {
        (None, other) | (other, None) => other,
        (Some(a), Some(b)) => {
            if b.specificity() > a.specificity() {
                Some(b)
            } else {
                Some(a)
            }
        }
    }
}
