use super::core::RenderDirective;
use crate::convert::TypeDescriptor;
use crate::fetchers::{
    ArgumentFetcher, InjectedFetcher, PathVariableFetcher, RequestAttributeFetcher,
    RequestParamFetcher,
};
use http::Method;
use std::fmt;

/// Declaration of one controller method: URL pattern, verbs, parameters and directive.
///
/// Parameters are declared in the order the method takes them.
///
/// ```rust
/// use mvc_dispatch::invocation::Mapping;
///
/// let mapping = Mapping::get("show", "/user/{id}")
///     .path_var::<u64>("id")
///     .param_or::<String>("tab", "profile")
///     .view("user.html");
/// assert_eq!(mapping.parameter_count(), 2);
/// ```
pub struct Mapping {
    pub(crate) name: String,
    pub(crate) pattern: String,
    pub(crate) methods: Vec<Method>,
    pub(crate) fetchers: Vec<Box<dyn ArgumentFetcher>>,
    pub(crate) directive: RenderDirective,
    pub(crate) default_view: Option<String>,
}

impl fmt::Debug for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapping")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .field("methods", &self.methods)
            .field("fetchers", &self.fetchers)
            .field("directive", &self.directive)
            .field("default_view", &self.default_view)
            .finish()
    }
}

impl Mapping {
    /// A method answering every verb.
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            methods: Vec::new(),
            fetchers: Vec::new(),
            directive: RenderDirective::View,
            default_view: None,
        }
    }

    pub fn get(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(name, pattern).method(Method::GET)
    }

    pub fn post(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(name, pattern).method(Method::POST)
    }

    /// Add an accepted verb.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        if !self.methods.contains(&method) {
            self.methods.push(method);
        }
        self
    }

    #[must_use]
    pub fn methods(self, methods: impl IntoIterator<Item = Method>) -> Self {
        methods.into_iter().fold(self, Mapping::method)
    }

    /// Append a parameter resolved by any fetcher.
    #[must_use]
    pub fn fetcher(mut self, fetcher: impl ArgumentFetcher + 'static) -> Self {
        self.fetchers.push(Box::new(fetcher));
        self
    }

    #[must_use]
    pub fn path_var<T: Clone + Send + Sync + 'static>(self, name: &str) -> Self {
        self.fetcher(PathVariableFetcher::new(name, TypeDescriptor::of::<T>()))
    }

    #[must_use]
    pub fn param<T: Clone + Send + Sync + 'static>(self, name: &str) -> Self {
        self.fetcher(RequestParamFetcher::new(name, TypeDescriptor::of::<T>(), None))
    }

    #[must_use]
    pub fn param_or<T: Clone + Send + Sync + 'static>(self, name: &str, default: &str) -> Self {
        self.fetcher(RequestParamFetcher::new(
            name,
            TypeDescriptor::of::<T>(),
            Some(default.to_string()),
        ))
    }

    /// A `Vec<T>` parameter.
    #[must_use]
    pub fn param_list<T: Clone + Send + Sync + 'static>(self, name: &str) -> Self {
        self.fetcher(RequestParamFetcher::new(name, TypeDescriptor::list_of::<T>(), None))
    }

    /// A `HashMap<String, V>` parameter.
    #[must_use]
    pub fn param_map<V: Clone + Send + Sync + 'static>(self, name: &str) -> Self {
        self.fetcher(RequestParamFetcher::new(name, TypeDescriptor::map_of::<V>(), None))
    }

    #[must_use]
    pub fn attribute<T: Clone + Send + Sync + 'static>(self, name: &str) -> Self {
        self.fetcher(RequestAttributeFetcher::new(name, TypeDescriptor::of::<T>(), None))
    }

    #[must_use]
    pub fn attribute_or<T: Clone + Send + Sync + 'static>(self, name: &str, default: &str) -> Self {
        self.fetcher(RequestAttributeFetcher::new(
            name,
            TypeDescriptor::of::<T>(),
            Some(default.to_string()),
        ))
    }

    /// An `Arc<T>` taken from the request scope.
    #[must_use]
    pub fn inject<T: Send + Sync + 'static>(self) -> Self {
        self.fetcher(InjectedFetcher::<T>::new())
    }

    /// Default view; `{}` is replaced by the return value.
    #[must_use]
    pub fn view(mut self, view: impl Into<String>) -> Self {
        self.default_view = Some(view.into());
        self
    }

    #[must_use]
    pub fn error(mut self, status: u16, message: impl Into<String>) -> Self {
        self.directive = RenderDirective::Error {
            status,
            message: message.into(),
        };
        self
    }

    #[must_use]
    pub fn redirect(mut self, target: impl Into<String>) -> Self {
        self.directive = RenderDirective::Redirect {
            target: target.into(),
        };
        self
    }

    /// Stream the return value using the configured default buffer size.
    #[must_use]
    pub fn write(mut self) -> Self {
        self.directive = RenderDirective::Write { buffer_size: None };
        self
    }

    #[must_use]
    pub fn write_buffered(mut self, buffer_size: usize) -> Self {
        self.directive = RenderDirective::Write {
            buffer_size: Some(buffer_size.max(1)),
        };
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameter_count(&self) -> usize {
        self.fetchers.len()
    }
}
