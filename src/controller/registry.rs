use super::markers::{ClassMarker, ControllerMarkers, MarkerHierarchy};
use crate::error::{RenderError, RoutingConstructionError};
use crate::invocation::{Arguments, InvocationDescriptor, InvokeFn, Mapping, MethodResult};
use crate::router::{pick_best, Ranked, Specificity, UrlMatch};
use crate::server::{ServletRequest, ServletResponse};
use crate::view::{Model, RenderResolver, RendererRule, Views};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Supplies the controller instance a method is invoked on.
///
/// An `Arc<C>` always hands out the same instance; a [`Factory`] builds one per call.
pub trait Provider<C>: Send + Sync {
    fn get(&self) -> Arc<C>;
}

impl<C: Send + Sync> Provider<C> for Arc<C> {
    fn get(&self) -> Arc<C> {
        Arc::clone(self)
    }
}

/// Provider creating a fresh controller for every invocation.
pub struct Factory<F>(pub F);

impl<C, F> Provider<C> for Factory<F>
where
    F: Fn() -> C + Send + Sync,
{
    fn get(&self) -> Arc<C> {
        Arc::new((self.0)())
    }
}

/// The winner of per-registry method selection.
#[derive(Clone)]
pub struct InvocationMatch {
    pub registry: Arc<ControllerRegistry>,
    pub descriptor: Arc<InvocationDescriptor>,
    pub url_match: UrlMatch,
}

impl fmt::Debug for InvocationMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationMatch")
            .field("controller", &self.registry.name())
            .field("method", &self.descriptor.name())
            .field("url_match", &self.url_match)
            .finish()
    }
}

impl Ranked for InvocationMatch {
    fn specificity(&self) -> Specificity {
        self.url_match.specificity
    }
}

/// All compiled methods of one controller, plus its view configuration.
///
/// Immutable once built, apart from the renderer cache inside the [`RenderResolver`].
pub struct ControllerRegistry {
    name: String,
    invocations: Vec<Arc<InvocationDescriptor>>,
    by_name: HashMap<String, usize>,
    view_directory: String,
    resolver: RenderResolver,
}

impl fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerRegistry")
            .field("name", &self.name)
            .field("invocations", &self.invocations)
            .field("view_directory", &self.view_directory)
            .field("resolver", &self.resolver)
            .finish()
    }
}

impl ControllerRegistry {
    /// Start declaring controller `name`, whose instances come from `provider`.
    pub fn builder<C: Send + Sync + 'static>(
        name: impl Into<String>,
        provider: impl Provider<C> + 'static,
    ) -> ControllerBuilder<C> {
        ControllerBuilder {
            markers: ControllerMarkers::new(name),
            provider: Arc::new(provider),
            hierarchy: None,
            views: Arc::new(Views::new()),
            methods: Vec::new(),
        }
    }

    /// Most specific method of this controller serving `req`, if any.
    pub fn best_invocation(self: &Arc<Self>, req: &ServletRequest) -> Option<InvocationMatch> {
        let mut best: Option<InvocationMatch> = None;
        for descriptor in &self.invocations {
            let candidate = descriptor.can_serve(req).map(|url_match| InvocationMatch {
                registry: Arc::clone(self),
                descriptor: Arc::clone(descriptor),
                url_match,
            });
            best = pick_best(best, candidate);
        }
        debug!(
            controller = %self.name,
            path = %req.path_info(),
            matched = best.as_ref().map(|m| m.descriptor.name()),
            "Best invocation"
        );
        best
    }

    /// The compiled method called `method`.
    ///
    /// # Errors
    ///
    /// Fails when this controller has no such method.
    pub fn invocation(&self, method: &str) -> anyhow::Result<Arc<InvocationDescriptor>> {
        self.by_name
            .get(method)
            .map(|&i| Arc::clone(&self.invocations[i]))
            .ok_or_else(|| anyhow::anyhow!("No such method {}.{}", self.name, method))
    }

    /// View name as handed to the renderer: relative names get the view directory.
    pub fn view_path(&self, view: &str) -> String {
        if view.starts_with('/') || self.view_directory.is_empty() {
            view.to_string()
        } else {
            format!("{}/{}", self.view_directory.trim_end_matches('/'), view)
        }
    }

    /// Render `view` with the request's model.
    ///
    /// # Errors
    ///
    /// Fails when no renderer is found or the renderer fails.
    pub fn render_view(
        &self,
        view: &str,
        model: &Model,
        res: &mut ServletResponse,
    ) -> Result<(), RenderError> {
        let view = self.view_path(view);
        let renderer = self.resolver.resolve(&view)?;
        debug!(controller = %self.name, view = %view, "Rendering view");
        renderer
            .render(&view, model, res)
            .map_err(|source| RenderError::Rendering { view, source })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn invocations(&self) -> &[Arc<InvocationDescriptor>] {
        &self.invocations
    }

    pub fn view_directory(&self) -> &str {
        &self.view_directory
    }

    pub fn renderer_rules(&self) -> &[RendererRule] {
        self.resolver.rules()
    }

    /// How many times renderer rules were scanned; see [`RenderResolver::scan_count`].
    pub fn renderer_scan_count(&self) -> u64 {
        self.resolver.scan_count()
    }
}

/// Builder for a [`ControllerRegistry`].
pub struct ControllerBuilder<C> {
    markers: ControllerMarkers,
    provider: Arc<dyn Provider<C>>,
    hierarchy: Option<Arc<MarkerHierarchy>>,
    views: Arc<Views>,
    methods: Vec<(Mapping, Arc<InvokeFn>)>,
}

impl<C: Send + Sync + 'static> ControllerBuilder<C> {
    #[must_use]
    pub fn marker(mut self, marker: ClassMarker) -> Self {
        self.markers.markers.push(marker);
        self
    }

    /// Inherit markers from controller `parent` (looked up in the hierarchy).
    #[must_use]
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.markers.parents.push(parent.into());
        self
    }

    #[must_use]
    pub fn hierarchy(mut self, hierarchy: Arc<MarkerHierarchy>) -> Self {
        self.hierarchy = Some(hierarchy);
        self
    }

    #[must_use]
    pub fn views(mut self, views: Arc<Views>) -> Self {
        self.views = views;
        self
    }

    /// Register a method implemented by `handler` on the provided controller instance.
    #[must_use]
    pub fn handle<F>(mut self, mapping: Mapping, handler: F) -> Self
    where
        F: Fn(&C, &mut Arguments<'_>) -> MethodResult + Send + Sync + 'static,
    {
        let provider = Arc::clone(&self.provider);
        let invoke: Arc<InvokeFn> = Arc::new(move |args: &mut Arguments<'_>| {
            let controller = provider.get();
            handler(controller.as_ref(), args)
        });
        self.methods.push((mapping, invoke));
        self
    }

    /// Register a method already bound to its controller.
    #[must_use]
    pub fn handle_erased(mut self, mapping: Mapping, invoke: Arc<InvokeFn>) -> Self {
        self.methods.push((mapping, invoke));
        self
    }

    /// Compile every method and resolve the inherited view configuration.
    ///
    /// # Errors
    ///
    /// The first [`RoutingConstructionError`] met; nothing of the controller is registered
    /// in that case.
    pub fn build(self) -> Result<ControllerRegistry, RoutingConstructionError> {
        let name = self.markers.name.clone();
        let hierarchy = self.hierarchy.unwrap_or_default();

        let view_directory = hierarchy
            .find_first(&self.markers, |m| match m {
                ClassMarker::ViewDirectory(dir) => Some(dir.clone()),
                _ => None,
            })
            .unwrap_or_default();

        let rule_specs = hierarchy
            .find_first(&self.markers, |m| match m {
                ClassMarker::Rendered(rules) => Some(rules.clone()),
                _ => None,
            })
            .or_else(|| {
                hierarchy.find_first(&self.markers, |m| match m {
                    ClassMarker::RenderedWith { regex, renderer } => {
                        Some(vec![(regex.clone(), renderer.clone())])
                    }
                    _ => None,
                })
            })
            .unwrap_or_default();
        let rules = rule_specs
            .iter()
            .map(|(regex, renderer)| RendererRule::new(regex, renderer.as_str()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut invocations = Vec::with_capacity(self.methods.len());
        let mut by_name = HashMap::with_capacity(self.methods.len());
        for (mapping, invoke) in self.methods {
            if by_name.contains_key(mapping.name()) {
                return Err(RoutingConstructionError::DuplicateMethod {
                    controller: name,
                    method: mapping.name().to_string(),
                });
            }
            let order = invocations.len();
            by_name.insert(mapping.name().to_string(), order);
            invocations.push(Arc::new(InvocationDescriptor::new(&name, mapping, invoke, order)?));
        }

        info!(
            controller = %name,
            methods = invocations.len(),
            view_directory = %view_directory,
            renderer_rules = rules.len(),
            "Controller registered"
        );

        Ok(ControllerRegistry {
            name,
            invocations,
            by_name,
            view_directory,
            resolver: RenderResolver::new(rules, self.views),
        })
    }
}
