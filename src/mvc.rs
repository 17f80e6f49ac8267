//! # Prefix Map
//!
//! [`Mvc`] mounts controller registries under URL prefixes. Every registry registered on
//! the same prefix shares one [`DispatchServlet`], so the most specific method is chosen
//! across all of them. A request goes to the servlet with the longest prefix that matches
//! on a segment boundary; the rest of the path becomes the request's path info.
//!
//! ```rust
//! use mvc_dispatch::controller::ControllerRegistry;
//! use mvc_dispatch::invocation::Mapping;
//! use mvc_dispatch::mvc::Mvc;
//! use mvc_dispatch::server::{ServletRequest, ServletResponse};
//! use std::sync::Arc;
//!
//! struct Hello;
//!
//! let registry = ControllerRegistry::builder("Hello", Arc::new(Hello))
//!     .handle(Mapping::get("hello", "/hello").write(), |_, _| Ok(Some("hi".into())))
//!     .build()
//!     .unwrap();
//!
//! let mvc = Mvc::builder().control("/api", Arc::new(registry)).build();
//! let mut res = ServletResponse::new();
//! mvc.dispatch(ServletRequest::get("/api/hello"), &mut res).unwrap();
//! assert_eq!(res.body_string(), "hi");
//! ```

use crate::controller::{ControllerRegistry, InvocationMatch};
use crate::convert::ConversionService;
use crate::error::ServeError;
use crate::runtime_config::RuntimeConfig;
use crate::server::{DispatchServlet, ExceptionService, ServletRequest, ServletResponse};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Mounted servlets, longest prefix first.
#[derive(Debug, Clone)]
pub struct Mvc {
    servlets: Vec<(String, DispatchServlet)>,
    strip_session_id: bool,
}

#[derive(Debug, Default)]
pub struct MvcBuilder {
    mounts: BTreeMap<String, Vec<Arc<ControllerRegistry>>>,
    conversion: Option<Arc<ConversionService>>,
    exceptions: Option<Arc<ExceptionService>>,
    config: Option<RuntimeConfig>,
}

/// `"/api/"` and `"api"` both mount on `"/api"`; `"/"` and `""` mount on the root.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Path info of `path` below `prefix`, when `prefix` matches on a segment boundary.
fn path_info_below<'p>(prefix: &str, path: &'p str) -> Option<&'p str> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some("/")
    } else if rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

impl MvcBuilder {
    /// Serve `registry` below `prefix`.
    #[must_use]
    pub fn control(mut self, prefix: &str, registry: Arc<ControllerRegistry>) -> Self {
        let prefix = normalize_prefix(prefix);
        info!(prefix = %prefix, controller = %registry.name(), "Controller mounted");
        self.mounts.entry(prefix).or_default().push(registry);
        self
    }

    #[must_use]
    pub fn conversion(mut self, conversion: Arc<ConversionService>) -> Self {
        self.conversion = Some(conversion);
        self
    }

    #[must_use]
    pub fn exceptions(mut self, exceptions: Arc<ExceptionService>) -> Self {
        self.exceptions = Some(exceptions);
        self
    }

    #[must_use]
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Mvc {
        let mut servlets: Vec<(String, DispatchServlet)> = self
            .mounts
            .into_iter()
            .map(|(prefix, registries)| {
                let mut servlet = DispatchServlet::new(registries);
                if let Some(conversion) = &self.conversion {
                    servlet = servlet.with_conversion(Arc::clone(conversion));
                }
                if let Some(exceptions) = &self.exceptions {
                    servlet = servlet.with_exceptions(Arc::clone(exceptions));
                }
                if let Some(config) = self.config {
                    servlet = servlet.with_config(config);
                }
                (prefix, servlet)
            })
            .collect();
        servlets.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Mvc {
            servlets,
            strip_session_id: self.config.unwrap_or_default().strip_session_id,
        }
    }
}

impl Mvc {
    pub fn builder() -> MvcBuilder {
        MvcBuilder::default()
    }

    /// Servlet for `path` and the path info it should see.
    pub fn servlet_for<'p>(&self, path: &'p str) -> Option<(&DispatchServlet, &'p str)> {
        self.servlets.iter().find_map(|(prefix, servlet)| {
            path_info_below(prefix, path).map(|info| (servlet, info))
        })
    }

    /// Route `req` to its servlet and serve it.
    ///
    /// `;jsessionid=` decorations are stripped (when enabled) before the prefix is
    /// matched, so a decorated prefix segment still selects its servlet.
    ///
    /// # Errors
    ///
    /// Whatever [`DispatchServlet::service`] returns.
    pub fn dispatch(&self, mut req: ServletRequest, res: &mut ServletResponse) -> Result<(), ServeError> {
        if self.strip_session_id {
            req.strip_session_id();
        }
        let path = req.path().to_string();
        let Some((servlet, path_info)) = self.servlet_for(&path) else {
            warn!(path = %path, "No servlet mounted for path");
            res.send_error(404, None);
            return Ok(());
        };
        debug!(path = %path, path_info = %path_info, "Servlet selected");
        req.set_path_info(path_info);
        servlet.service(req, res)
    }

    /// The method `req` would be dispatched to, without invoking it.
    pub fn explain(&self, req: &ServletRequest) -> Option<InvocationMatch> {
        let mut req = req.clone();
        if self.strip_session_id {
            req.strip_session_id();
        }
        let path = req.path().to_string();
        let (servlet, path_info) = self.servlet_for(&path)?;
        req.set_path_info(path_info);
        servlet.best_invocation(&req)
    }

    /// Mounted prefixes, longest first.
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.servlets.iter().map(|(prefix, _)| prefix.as_str())
    }

    pub fn servlets(&self) -> impl Iterator<Item = (&str, &DispatchServlet)> {
        self.servlets.iter().map(|(prefix, servlet)| (prefix.as_str(), servlet))
    }
}
