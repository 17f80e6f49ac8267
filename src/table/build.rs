use super::core::{
    ControllerSpec, DirectiveSpec, MethodSpec, ParameterSource, ParameterSpec, RouteTable,
    TableError,
};
use crate::controller::{ClassMarker, ControllerMarkers, ControllerRegistry, MarkerHierarchy};
use crate::convert::TypeDescriptor;
use crate::fetchers::{InjectedFetcher, PathVariableFetcher, RequestAttributeFetcher, RequestParamFetcher};
use crate::ids::RequestId;
use crate::invocation::{Arguments, InvokeFn, Mapping, MethodResult};
use crate::mvc::{Mvc, MvcBuilder};
use crate::router::UrlMatch;
use crate::server::{ServletRequest, STANDARD_METHODS};
use crate::view::{Model, Views};
use http::Method;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

macro_rules! descriptor_by_name {
    ($name:expr, $ctor:ident) => {
        match $name {
            "bool" => Some(TypeDescriptor::$ctor::<bool>()),
            "char" => Some(TypeDescriptor::$ctor::<char>()),
            "i8" => Some(TypeDescriptor::$ctor::<i8>()),
            "i16" => Some(TypeDescriptor::$ctor::<i16>()),
            "i32" => Some(TypeDescriptor::$ctor::<i32>()),
            "i64" => Some(TypeDescriptor::$ctor::<i64>()),
            "u8" => Some(TypeDescriptor::$ctor::<u8>()),
            "u16" => Some(TypeDescriptor::$ctor::<u16>()),
            "u32" => Some(TypeDescriptor::$ctor::<u32>()),
            "u64" => Some(TypeDescriptor::$ctor::<u64>()),
            "isize" => Some(TypeDescriptor::$ctor::<isize>()),
            "usize" => Some(TypeDescriptor::$ctor::<usize>()),
            "f32" => Some(TypeDescriptor::$ctor::<f32>()),
            "f64" => Some(TypeDescriptor::$ctor::<f64>()),
            "string" => Some(TypeDescriptor::$ctor::<String>()),
            _ => None,
        }
    };
}

/// Descriptor for a table type name: a scalar, `list<scalar>` or `map<scalar>`.
pub fn parse_type(name: &str) -> Option<TypeDescriptor> {
    let name = name.trim();
    let inner = |prefix: &str| {
        name.strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix('>'))
            .map(str::trim)
    };
    if let Some(element) = inner("list<") {
        return descriptor_by_name!(element, list_of);
    }
    if let Some(value) = inner("map<") {
        return descriptor_by_name!(value, map_of);
    }
    descriptor_by_name!(name, of)
}

/// Handler functions for table methods, keyed `Controller.method`.
#[derive(Clone, Default)]
pub struct HandlerTable {
    handlers: HashMap<String, Arc<InvokeFn>>,
}

impl fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.handlers.keys().collect();
        keys.sort();
        f.debug_struct("HandlerTable").field("handlers", &keys).finish()
    }
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `Controller.method` to `handler`.
    #[must_use]
    pub fn handler<F>(mut self, key: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Arguments<'_>) -> MethodResult + Send + Sync + 'static,
    {
        self.handlers.insert(key.into(), Arc::new(handler));
        self
    }

    /// A handler for every method of `table` that returns no value.
    pub fn stubs(table: &RouteTable) -> Self {
        let stub: Arc<InvokeFn> = Arc::new(|_: &mut Arguments<'_>| -> MethodResult { Ok(None) });
        let handlers = table
            .controllers
            .iter()
            .flat_map(|c| c.methods.iter().map(move |m| format!("{}.{}", c.name, m.name)))
            .map(|key| (key, Arc::clone(&stub)))
            .collect();
        Self { handlers }
    }

    pub fn get(&self, key: &str) -> Option<Arc<InvokeFn>> {
        self.handlers.get(key).map(Arc::clone)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Controller instance behind table-declared methods; handlers carry their own state.
struct TableController;

fn method_key(controller: &ControllerSpec, method: &MethodSpec) -> String {
    format!("{}.{}", controller.name, method.name)
}

fn parse_verb(key: &str, verb: &str) -> Result<Method, TableError> {
    Method::from_bytes(verb.trim().to_ascii_uppercase().as_bytes())
        .ok()
        .filter(|m| STANDARD_METHODS.contains(m))
        .ok_or_else(|| TableError::UnknownVerb {
            method: key.to_string(),
            verb: verb.to_string(),
        })
}

fn bind_parameter(key: &str, mapping: Mapping, param: &ParameterSpec) -> Result<Mapping, TableError> {
    let unknown = || TableError::UnknownType {
        method: key.to_string(),
        parameter: param.name.clone(),
        type_name: param.type_name.clone(),
    };
    if param.source == ParameterSource::Inject {
        return match param.type_name.trim() {
            "request" => Ok(mapping.fetcher(InjectedFetcher::<ServletRequest>::new())),
            "request_id" => Ok(mapping.fetcher(InjectedFetcher::<RequestId>::new())),
            "model" => Ok(mapping.fetcher(InjectedFetcher::<Model>::new())),
            "url_match" => Ok(mapping.fetcher(InjectedFetcher::<UrlMatch>::new())),
            _ => Err(unknown()),
        };
    }
    let ty = parse_type(&param.type_name).ok_or_else(unknown)?;
    let default = param.default.clone();
    Ok(match param.source {
        ParameterSource::Path => mapping.fetcher(PathVariableFetcher::new(&param.name, ty)),
        ParameterSource::Param => mapping.fetcher(RequestParamFetcher::new(&param.name, ty, default)),
        ParameterSource::Attribute => {
            mapping.fetcher(RequestAttributeFetcher::new(&param.name, ty, default))
        }
        ParameterSource::Inject => return Err(unknown()),
    })
}

fn mapping_for(key: &str, method: &MethodSpec) -> Result<Mapping, TableError> {
    let verbs = method
        .verbs
        .iter()
        .map(|v| parse_verb(key, v))
        .collect::<Result<Vec<_>, _>>()?;
    let mut mapping = Mapping::new(&method.name, &method.pattern).methods(verbs);
    for param in &method.parameters {
        mapping = bind_parameter(key, mapping, param)?;
    }
    mapping = match &method.directive {
        DirectiveSpec::View => mapping,
        DirectiveSpec::Error { status, message } => mapping.error(*status, message.as_str()),
        DirectiveSpec::Redirect { target } => mapping.redirect(target.as_str()),
        DirectiveSpec::Write { buffer_size: None } => mapping.write(),
        DirectiveSpec::Write {
            buffer_size: Some(n),
        } => mapping.write_buffered(*n),
    };
    if let Some(view) = &method.view {
        mapping = mapping.view(view.as_str());
    }
    Ok(mapping)
}

fn markers_for(controller: &ControllerSpec) -> ControllerMarkers {
    let mut markers = ControllerMarkers::new(&controller.name);
    if let Some(dir) = &controller.view_directory {
        markers = markers.marker(ClassMarker::ViewDirectory(dir.clone()));
    }
    if let Some(rule) = &controller.rendered_with {
        markers = markers.marker(ClassMarker::RenderedWith {
            regex: rule.regex.clone(),
            renderer: rule.renderer.clone(),
        });
    }
    if !controller.rendered.is_empty() {
        markers = markers.marker(ClassMarker::Rendered(
            controller
                .rendered
                .iter()
                .map(|r| (r.regex.clone(), r.renderer.clone()))
                .collect(),
        ));
    }
    controller
        .parents
        .iter()
        .fold(markers, |markers, parent| markers.extends(parent.as_str()))
}

impl RouteTable {
    /// Parse a YAML route table.
    ///
    /// # Errors
    ///
    /// Fails on malformed YAML or fields of the wrong shape.
    pub fn from_yaml(source: &str) -> Result<Self, TableError> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Read and parse a YAML route table file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, TableError> {
        let source = std::fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_yaml(&source)?;
        info!(
            table = %path.display(),
            controllers = table.controllers.len(),
            "Route table loaded"
        );
        Ok(table)
    }

    fn hierarchy(&self) -> Arc<MarkerHierarchy> {
        let mut hierarchy = MarkerHierarchy::new();
        for controller in &self.controllers {
            hierarchy.declare(markers_for(controller));
        }
        Arc::new(hierarchy)
    }

    /// Controllers that declare methods, i.e. the ones that get mounted.
    pub fn routable(&self) -> impl Iterator<Item = &ControllerSpec> {
        self.controllers.iter().filter(|c| !c.methods.is_empty())
    }

    fn build_controller(
        &self,
        controller: &ControllerSpec,
        handlers: &HandlerTable,
        hierarchy: &Arc<MarkerHierarchy>,
        views: &Arc<Views>,
    ) -> Result<ControllerRegistry, TableError> {
        let mut builder = ControllerRegistry::builder(&controller.name, Arc::new(TableController))
            .hierarchy(Arc::clone(hierarchy))
            .views(Arc::clone(views));
        for marker in markers_for(controller).markers {
            builder = builder.marker(marker);
        }
        for parent in &controller.parents {
            builder = builder.extends(parent.as_str());
        }
        for method in &controller.methods {
            let key = method_key(controller, method);
            let invoke = handlers
                .get(&key)
                .ok_or_else(|| TableError::MissingHandler { method: key.clone() })?;
            builder = builder.handle_erased(mapping_for(&key, method)?, invoke);
        }
        builder.build().map_err(|source| TableError::Construction {
            controller: controller.name.clone(),
            source,
        })
    }

    /// Build every routable controller, paired with its mount prefix.
    ///
    /// # Errors
    ///
    /// The first controller that fails to build.
    pub fn registries(
        &self,
        handlers: &HandlerTable,
        views: Arc<Views>,
    ) -> Result<Vec<(String, ControllerRegistry)>, TableError> {
        let hierarchy = self.hierarchy();
        self.routable()
            .map(|c| {
                let registry = self.build_controller(c, handlers, &hierarchy, &views)?;
                Ok((c.prefix.clone().unwrap_or_default(), registry))
            })
            .collect()
    }

    /// Mount every routable controller into an [`Mvc`] with no view renderers.
    ///
    /// # Errors
    ///
    /// See [`registries`](Self::registries).
    pub fn build(&self, handlers: &HandlerTable) -> Result<Mvc, TableError> {
        self.build_with_views(handlers, Arc::new(Views::new()))
    }

    /// # Errors
    ///
    /// See [`registries`](Self::registries).
    pub fn build_with_views(&self, handlers: &HandlerTable, views: Arc<Views>) -> Result<Mvc, TableError> {
        Ok(self.mvc_builder(handlers, views)?.build())
    }

    /// Like [`build`](Self::build) but leaves the builder open for conversion,
    /// exception and config setup.
    ///
    /// # Errors
    ///
    /// See [`registries`](Self::registries).
    pub fn mvc_builder(&self, handlers: &HandlerTable, views: Arc<Views>) -> Result<MvcBuilder, TableError> {
        let builder = self
            .registries(handlers, views)?
            .into_iter()
            .fold(Mvc::builder(), |builder, (prefix, registry)| {
                builder.control(&prefix, Arc::new(registry))
            });
        Ok(builder)
    }

    /// Build every routable controller with stub handlers and report every failure.
    pub fn check(&self) -> Vec<TableError> {
        let handlers = HandlerTable::stubs(self);
        let hierarchy = self.hierarchy();
        let views = Arc::new(Views::new());
        let errors: Vec<TableError> = self
            .routable()
            .filter_map(|c| self.build_controller(c, &handlers, &hierarchy, &views).err())
            .collect();
        debug!(controllers = self.controllers.len(), errors = errors.len(), "Route table checked");
        errors
    }
}
