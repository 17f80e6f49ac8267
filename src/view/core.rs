use crate::server::ServletResponse;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Per-request data handed to the view renderer.
///
/// Controllers take it from the request scope (`Mapping::inject::<Model>()`) and fill it
/// while handling the request.
#[derive(Debug, Default)]
pub struct Model {
    values: RwLock<Map<String, JsonValue>>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace one attribute.
    ///
    /// # Errors
    ///
    /// Fails when `value` cannot be serialized to JSON.
    pub fn put(&self, key: impl Into<String>, value: impl Serialize) -> anyhow::Result<()> {
        let value = serde_json::to_value(value)?;
        self.values.write().insert(key.into(), value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<JsonValue> {
        self.values.read().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }

    /// The whole model as a JSON object.
    pub fn snapshot(&self) -> JsonValue {
        JsonValue::Object(self.values.read().clone())
    }
}

/// Renders a named view into the response.
pub trait ViewRenderer: Send + Sync {
    fn render(&self, view: &str, model: &Model, res: &mut ServletResponse) -> anyhow::Result<()>;
}

/// Fallback lookup used when no renderer rule of a controller matches a view.
pub trait ViewRendererService: Send + Sync {
    fn renderer_for(&self, view: &str) -> Option<Arc<dyn ViewRenderer>>;
}

/// Renderers by key, plus the fallback service.
///
/// Renderer rules name renderers by key; the catalog turns those keys into instances.
#[derive(Clone, Default)]
pub struct Views {
    renderers: HashMap<String, Arc<dyn ViewRenderer>>,
    fallback: Option<Arc<dyn ViewRendererService>>,
}

impl fmt::Debug for Views {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.renderers.keys().collect();
        keys.sort();
        f.debug_struct("Views")
            .field("renderers", &keys)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl Views {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn renderer(mut self, key: impl Into<String>, renderer: impl ViewRenderer + 'static) -> Self {
        self.renderers.insert(key.into(), Arc::new(renderer));
        self
    }

    #[must_use]
    pub fn renderer_arc(mut self, key: impl Into<String>, renderer: Arc<dyn ViewRenderer>) -> Self {
        self.renderers.insert(key.into(), renderer);
        self
    }

    #[must_use]
    pub fn fallback(mut self, service: impl ViewRendererService + 'static) -> Self {
        self.fallback = Some(Arc::new(service));
        self
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn ViewRenderer>> {
        self.renderers.get(key).cloned()
    }

    pub fn fallback_service(&self) -> Option<&Arc<dyn ViewRendererService>> {
        self.fallback.as_ref()
    }
}

/// Picks a renderer by the view name's extension (`html`, `txt`, ...).
#[derive(Clone, Default)]
pub struct ExtensionRendererService {
    by_extension: HashMap<String, Arc<dyn ViewRenderer>>,
}

impl fmt::Debug for ExtensionRendererService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut exts: Vec<&String> = self.by_extension.keys().collect();
        exts.sort();
        f.debug_struct("ExtensionRendererService")
            .field("extensions", &exts)
            .finish()
    }
}

impl ExtensionRendererService {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn extension(mut self, ext: &str, renderer: Arc<dyn ViewRenderer>) -> Self {
        self.by_extension
            .insert(ext.trim_start_matches('.').to_ascii_lowercase(), renderer);
        self
    }
}

impl ViewRendererService for ExtensionRendererService {
    fn renderer_for(&self, view: &str) -> Option<Arc<dyn ViewRenderer>> {
        let file = view.rsplit('/').next().unwrap_or(view);
        let (_, ext) = file.rsplit_once('.')?;
        self.by_extension.get(&ext.to_ascii_lowercase()).cloned()
    }
}
