use super::core::{Arguments, InvokeFn, RenderDirective, ReturnValue};
use super::mapping::Mapping;
use crate::error::{InvocationError, RoutingConstructionError};
use crate::fetchers::{ArgumentFetcher, FetchContext};
use crate::router::{PathPattern, Specificity, UrlMatch};
use crate::server::{ExceptionService, Handled, ServletRequest, ServletResponse};
use http::Method;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A compiled, immutable controller method.
pub struct InvocationDescriptor {
    controller: Arc<str>,
    name: Arc<str>,
    pattern: PathPattern,
    methods: Vec<Method>,
    fetchers: Vec<Box<dyn ArgumentFetcher>>,
    directive: RenderDirective,
    default_view: Option<String>,
    order: usize,
    invoke: Arc<InvokeFn>,
}

impl fmt::Debug for InvocationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationDescriptor")
            .field("controller", &self.controller)
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .field("methods", &self.methods)
            .field("fetchers", &self.fetchers)
            .field("directive", &self.directive)
            .field("default_view", &self.default_view)
            .field("order", &self.order)
            .finish()
    }
}

impl InvocationDescriptor {
    /// Compile `mapping` for `controller`, binding it to `invoke`. `order` is the method's
    /// position within its controller and breaks specificity ties.
    ///
    /// # Errors
    ///
    /// Fails when the URL pattern is malformed or a path variable fetcher names a variable
    /// the pattern does not capture.
    pub fn new(
        controller: &str,
        mapping: Mapping,
        invoke: Arc<InvokeFn>,
        order: usize,
    ) -> Result<Self, RoutingConstructionError> {
        let pattern = PathPattern::compile(&mapping.pattern)?;
        for fetcher in &mapping.fetchers {
            if let Some(variable) = fetcher.path_variable() {
                if !pattern.has_variable(variable) {
                    return Err(RoutingConstructionError::UnknownPathVariable {
                        method: format!("{}.{}", controller, mapping.name),
                        pattern: mapping.pattern.clone(),
                        variable: variable.to_string(),
                    });
                }
            }
        }

        info!(
            controller = %controller,
            method = %mapping.name,
            pattern = %mapping.pattern,
            verbs = ?mapping.methods,
            parameters = mapping.fetchers.len(),
            order,
            "Invocation registered"
        );

        Ok(Self {
            controller: Arc::from(controller),
            name: Arc::from(mapping.name.as_str()),
            pattern,
            methods: mapping.methods,
            fetchers: mapping.fetchers,
            directive: mapping.directive,
            default_view: mapping.default_view,
            order,
            invoke,
        })
    }

    /// Match `req` against this method.
    ///
    /// The pattern must match the whole path info and the verb must be accepted.
    pub fn can_serve(&self, req: &ServletRequest) -> Option<UrlMatch> {
        let path_variables = self.pattern.captures(req.path_info())?;
        if !self.methods.is_empty() && !self.methods.contains(req.method()) {
            debug!(
                controller = %self.controller,
                method = %self.name,
                verb = %req.method(),
                accepted = ?self.methods,
                "Path matched but verb not accepted"
            );
            return None;
        }
        Some(UrlMatch {
            path_variables,
            specificity: Specificity {
                literal_len: self.pattern.literal_len(),
                captures: self.pattern.capture_count(),
                registry: 0,
                order: self.order,
            },
        })
    }

    /// Resolve every argument, then call the method.
    ///
    /// Fetchers run left to right; the first failure aborts and the method is not called.
    /// A failure the method reports as [`Handled`], or one the exception service claims,
    /// becomes [`InvocationError::Handled`].
    pub fn invoke(
        &self,
        ctx: &FetchContext<'_>,
        exceptions: &ExceptionService,
        res: &mut ServletResponse,
    ) -> Result<Option<ReturnValue>, InvocationError> {
        let mut values = Vec::with_capacity(self.fetchers.len());
        for (index, fetcher) in self.fetchers.iter().enumerate() {
            match fetcher.resolve(ctx) {
                Ok(value) => values.push(value),
                Err(err) => {
                    debug!(
                        method = %self.name,
                        index,
                        fetcher = ?fetcher,
                        error = %err,
                        "Argument resolution failed"
                    );
                    return Err(err.into());
                }
            }
        }

        let mut args = Arguments::new(Arc::clone(&self.name), values, res);
        let outcome = (self.invoke)(&mut args);
        drop(args);
        match outcome {
            Ok(value) => Ok(value),
            Err(err) if err.downcast_ref::<Handled>().is_some() => Err(InvocationError::Handled),
            Err(err) => {
                if exceptions.handle(&err, res) {
                    Err(InvocationError::Handled)
                } else {
                    warn!(
                        controller = %self.controller,
                        method = %self.name,
                        error = %err,
                        "Controller method failed"
                    );
                    Err(InvocationError::Unhandled(err))
                }
            }
        }
    }

    pub fn controller(&self) -> &str {
        &self.controller
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn fetchers(&self) -> &[Box<dyn ArgumentFetcher>] {
        &self.fetchers
    }

    pub fn directive(&self) -> &RenderDirective {
        &self.directive
    }

    pub fn default_view(&self) -> Option<&str> {
        self.default_view.as_deref()
    }

    pub fn order(&self) -> usize {
        self.order
    }
}
