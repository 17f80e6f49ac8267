use super::exception::ExceptionService;
use super::request::ServletRequest;
use super::response::ServletResponse;
use super::scope::RequestScope;
use crate::controller::{ControllerRegistry, InvocationMatch};
use crate::convert::ConversionService;
use crate::error::{InvocationError, ServeError};
use crate::fetchers::FetchContext;
use crate::ids::RequestId;
use crate::invocation::apply_directive;
use crate::router::{pick_best, UrlMatch};
use crate::runtime_config::RuntimeConfig;
use crate::view::Model;
use http::Method;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn};

/// The verbs a servlet answers; anything else gets `501 Not Implemented`.
pub const STANDARD_METHODS: [Method; 7] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::HEAD,
    Method::OPTIONS,
    Method::TRACE,
];

/// Serves requests for every controller registry mounted on one prefix.
///
/// Per request: pick the single most specific method over all registries, resolve its
/// arguments, invoke it and turn the result into a response.
#[derive(Debug, Clone)]
pub struct DispatchServlet {
    registries: Vec<Arc<ControllerRegistry>>,
    conversion: Arc<ConversionService>,
    exceptions: Arc<ExceptionService>,
    config: RuntimeConfig,
}

impl DispatchServlet {
    pub fn new(registries: Vec<Arc<ControllerRegistry>>) -> Self {
        Self {
            registries,
            conversion: Arc::new(ConversionService::new()),
            exceptions: Arc::new(ExceptionService::new()),
            config: RuntimeConfig::default(),
        }
    }

    #[must_use]
    pub fn with_conversion(mut self, conversion: Arc<ConversionService>) -> Self {
        self.conversion = conversion;
        self
    }

    #[must_use]
    pub fn with_exceptions(mut self, exceptions: Arc<ExceptionService>) -> Self {
        self.exceptions = exceptions;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn add_registry(&mut self, registry: Arc<ControllerRegistry>) {
        self.registries.push(registry);
    }

    pub fn registries(&self) -> &[Arc<ControllerRegistry>] {
        &self.registries
    }

    /// Entry point for every verb: standard verbs are served, others get 501.
    ///
    /// # Errors
    ///
    /// See [`serve`](Self::serve).
    pub fn service(&self, req: ServletRequest, res: &mut ServletResponse) -> Result<(), ServeError> {
        if !STANDARD_METHODS.contains(req.method()) {
            warn!(method = %req.method(), path = %req.path(), "Unsupported HTTP method");
            res.send_error(501, Some(&format!("Method {} is not implemented", req.method())));
            return Ok(());
        }
        self.serve(req, res)
    }

    /// Most specific method over every registry, without invoking anything.
    ///
    /// On a full tie the registry added first wins.
    pub fn best_invocation(&self, req: &ServletRequest) -> Option<InvocationMatch> {
        self.registries
            .iter()
            .enumerate()
            .map(|(position, registry)| {
                registry.best_invocation(req).map(|mut found| {
                    found.url_match.specificity.registry = position;
                    found
                })
            })
            .fold(None, pick_best)
    }

    /// Dispatch one request.
    ///
    /// No match answers 404 and a missing or unconvertible argument answers 400. A failure
    /// already handled writes nothing more.
    ///
    /// # Errors
    ///
    /// Unhandled controller failures, render failures and inconsistent routing state are
    /// returned for the HTTP layer to turn into a 5xx.
    pub fn serve(&self, mut req: ServletRequest, res: &mut ServletResponse) -> Result<(), ServeError> {
        let request_id = RequestId::for_request(&req);
        let span = info_span!(
            "dispatch",
            request_id = %request_id,
            method = %req.method(),
            path = %req.path()
        );
        let _entered = span.enter();
        let start = Instant::now();

        if self.config.strip_session_id {
            req.strip_session_id();
        }

        let scope = RequestScope::new();
        scope.store(req.clone());
        scope.store(request_id);
        scope.store(Model::new());

        let Some(best) = self.best_invocation(&req) else {
            warn!(path_info = %req.path_info(), "No invocation matched");
            res.send_error(404, None);
            return Ok(());
        };
        scope.store::<UrlMatch>(best.url_match.clone());

        info!(
            request_id = %request_id,
            controller = %best.registry.name(),
            handler_name = %best.descriptor.name(),
            path_params = ?best.url_match.path_variables,
            "Request dispatched to method"
        );

        let ctx = FetchContext::new(&req, Some(&best.url_match), &scope, &self.conversion);
        let outcome = best.descriptor.invoke(&ctx, &self.exceptions, res);
        let result = match outcome {
            Ok(value) => self.render(&best, value, &scope, res),
            Err(InvocationError::Fetch(err)) if err.is_client_error() => {
                debug!(error = %err, "Bad request");
                res.send_error(400, Some(&err.to_string()));
                Ok(())
            }
            Err(InvocationError::Fetch(err)) => {
                error!(error = %err, "Argument resolution failed - routing state inconsistent");
                Err(ServeError::Internal(err.to_string()))
            }
            Err(InvocationError::Handled) => {
                debug!(status = res.status(), "Failure handled by controller");
                Ok(())
            }
            Err(InvocationError::Unhandled(err)) => {
                error!(
                    request_id = %request_id,
                    handler_name = %best.descriptor.name(),
                    error = %err,
                    "Unhandled controller failure"
                );
                Err(ServeError::Unhandled(err))
            }
        };

        info!(
            request_id = %request_id,
            handler_name = %best.descriptor.name(),
            status = res.status(),
            execution_time_ms = start.elapsed().as_millis() as u64,
            failed = result.is_err(),
            "Request complete"
        );
        result
    }

    fn render(
        &self,
        best: &InvocationMatch,
        value: Option<crate::invocation::ReturnValue>,
        scope: &RequestScope,
        res: &mut ServletResponse,
    ) -> Result<(), ServeError> {
        let view = apply_directive(&best.descriptor, value, res, self.config.write_buffer_size)?;
        if let Some(view) = view {
            let model = scope.get::<Model>().unwrap_or_default();
            best.registry.render_view(&view, &model, res)?;
        }
        Ok(())
    }
}
