use crate::convert::{ConversionService, Erased, TypeDescriptor};
use crate::error::FetchError;
use crate::router::UrlMatch;
use crate::server::{RequestScope, ServletRequest};
use std::fmt;

/// Everything a fetcher may read while resolving one argument of one request.
///
/// Passed explicitly; fetchers keep no per-request state between calls.
#[derive(Clone, Copy)]
pub struct FetchContext<'a> {
    pub request: &'a ServletRequest,
    pub url_match: Option<&'a UrlMatch>,
    pub scope: &'a RequestScope,
    pub conversion: &'a ConversionService,
}

impl<'a> FetchContext<'a> {
    pub fn new(
        request: &'a ServletRequest,
        url_match: Option<&'a UrlMatch>,
        scope: &'a RequestScope,
        conversion: &'a ConversionService,
    ) -> Self {
        Self {
            request,
            url_match,
            scope,
            conversion,
        }
    }
}

impl fmt::Debug for FetchContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchContext")
            .field("path_info", &self.request.path_info())
            .field("url_match", &self.url_match)
            .finish()
    }
}

/// Resolves one declared method parameter from the request.
pub trait ArgumentFetcher: Send + Sync + fmt::Debug {
    /// Produce the argument value, typed as [`target`](Self::target).
    fn resolve(&self, ctx: &FetchContext<'_>) -> Result<Erased, FetchError>;

    /// Declared parameter type.
    fn target(&self) -> &TypeDescriptor;

    /// Path variable this fetcher reads, checked against the URL pattern at registration.
    fn path_variable(&self) -> Option<&str> {
        None
    }
}

/// Split comma-delimited raw values, dropping empty pieces.
pub(crate) fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}
