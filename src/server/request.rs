use http::Method;
use std::any::Any;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A value stored as a request attribute by an upstream filter.
pub type Attribute = Arc<dyn Any + Send + Sync>;

/// The request as seen by a dispatch servlet.
///
/// Parameters keep their arrival order and may repeat (`a=1&a=2`). Headers are stored
/// with lowercase names. The path info is the part of the path below the servlet's
/// mount prefix and is what URL patterns are matched against.
#[derive(Clone)]
pub struct ServletRequest {
    method: Method,
    path: String,
    path_info: String,
    parameters: Vec<(String, String)>,
    headers: HashMap<String, String>,
    attributes: HashMap<String, Attribute>,
}

impl fmt::Debug for ServletRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServletRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("path_info", &self.path_info)
            .field("parameters", &self.parameters)
            .field("headers", &self.headers)
            .field("attributes", &self.attributes.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Parse query string parameters from a URL path
///
/// Extracts everything after the `?` character and URL-decodes parameter names and values.
/// Repeated names are kept as separate entries, in order.
///
/// # Arguments
///
/// * `path` - The full URL path (e.g., `/users?limit=10&tag=a&tag=b`)
pub fn parse_query_params(path: &str) -> Vec<(String, String)> {
    match path.split_once('?') {
        Some((_, query)) => parse_form(query),
        None => Vec::new(),
    }
}

fn parse_form(encoded: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(encoded.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Remove `;jsessionid=...` path decorations.
///
/// The decoration runs to the next `/` (or the end of the path). Matching of the marker
/// is case-insensitive.
pub fn strip_session_id(path: &str) -> Cow<'_, str> {
    const MARKER: &str = ";jsessionid=";
    let lower = path.to_ascii_lowercase();
    if !lower.contains(MARKER) {
        return Cow::Borrowed(path);
    }
    let mut out = String::with_capacity(path.len());
    let mut rest = 0usize;
    let mut search_from = 0usize;
    while let Some(found) = lower[search_from..].find(MARKER) {
        let start = search_from + found;
        out.push_str(&path[rest..start]);
        let end = path[start..]
            .find('/')
            .map(|i| start + i)
            .unwrap_or(path.len());
        rest = end;
        search_from = end;
    }
    out.push_str(&path[rest..]);
    Cow::Owned(out)
}

impl ServletRequest {
    /// Build a request from a method and a URI (path plus optional query string).
    pub fn new(method: Method, uri: &str) -> Self {
        let path = uri.split('?').next().unwrap_or("/").to_string();
        let parameters = parse_query_params(uri);
        debug!(
            method = %method,
            path = %path,
            param_count = parameters.len(),
            "Servlet request created"
        );
        Self {
            method,
            path_info: path.clone(),
            path,
            parameters,
            headers: HashMap::new(),
            attributes: HashMap::new(),
        }
    }

    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn post(uri: &str) -> Self {
        Self::new(Method::POST, uri)
    }

    /// Add one parameter value (repeats are kept).
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push((name.into(), value.into()));
        self
    }

    /// Append the parameters of an `application/x-www-form-urlencoded` body.
    #[must_use]
    pub fn with_form_body(mut self, body: &str) -> Self {
        self.parameters.extend(parse_form(body));
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    #[must_use]
    pub fn with_attribute<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
        self.set_attribute(name, value);
        self
    }

    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Full request path, without the query string.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path below the servlet mount prefix.
    #[inline]
    pub fn path_info(&self) -> &str {
        &self.path_info
    }

    pub fn set_path_info(&mut self, path_info: impl Into<String>) {
        self.path_info = path_info.into();
    }

    /// All values of parameter `name`, in arrival order; `None` when it was never sent.
    pub fn parameter_values(&self, name: &str) -> Option<Vec<&str>> {
        let values: Vec<&str> = self
            .parameters
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values)
        }
    }

    /// First value of parameter `name`.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn parameters(&self) -> &[(String, String)] {
        &self.parameters
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn attribute(&self, name: &str) -> Option<&(dyn Any + Send + Sync)> {
        self.attributes.get(name).map(|a| a.as_ref())
    }

    pub fn set_attribute<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) {
        self.attributes.insert(name.into(), Arc::new(value));
    }

    /// Apply [`strip_session_id`] to both the path and the path info.
    pub fn strip_session_id(&mut self) {
        if let Cow::Owned(stripped) = strip_session_id(&self.path) {
            self.path = stripped;
        }
        if let Cow::Owned(stripped) = strip_session_id(&self.path_info) {
            self.path_info = stripped;
        }
    }
}
