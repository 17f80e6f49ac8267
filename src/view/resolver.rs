use super::core::{ViewRenderer, Views};
use crate::error::{RenderError, RoutingConstructionError};
use dashmap::DashMap;
use parking_lot::Mutex;
use regex::Regex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// "Views whose full name matches `regex` are rendered by renderer `key`."
#[derive(Debug, Clone)]
pub struct RendererRule {
    source: String,
    regex: Regex,
    renderer: String,
}

impl RendererRule {
    /// # Errors
    ///
    /// [`RoutingConstructionError::InvalidRendererRule`] when `regex` does not compile.
    pub fn new(regex: &str, renderer: impl Into<String>) -> Result<Self, RoutingConstructionError> {
        let anchored = format!("^(?:{regex})$");
        let compiled = Regex::new(&anchored).map_err(|e| RoutingConstructionError::InvalidRendererRule {
            regex: regex.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            source: regex.to_string(),
            regex: compiled,
            renderer: renderer.into(),
        })
    }

    pub fn matches(&self, view: &str) -> bool {
        self.regex.is_match(view)
    }

    pub fn regex(&self) -> &str {
        &self.source
    }

    pub fn renderer(&self) -> &str {
        &self.renderer
    }
}

/// Memoised view → renderer lookup for one registry.
///
/// Reads go to a concurrent map. A miss takes the registry's lock, checks the map again,
/// and only then scans the rules (and the fallback service). The renderer found is cached
/// before the lock is released, so every distinct view name is scanned at most once.
/// Lookups that find nothing are not cached.
pub struct RenderResolver {
    rules: Vec<RendererRule>,
    views: Arc<Views>,
    cache: DashMap<String, Arc<dyn ViewRenderer>>,
    lock: Mutex<()>,
    scans: AtomicU64,
}

impl fmt::Debug for RenderResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderResolver")
            .field("rules", &self.rules)
            .field("views", &self.views)
            .field("cached", &self.cache.len())
            .field("scans", &self.scan_count())
            .finish()
    }
}

impl RenderResolver {
    pub fn new(rules: Vec<RendererRule>, views: Arc<Views>) -> Self {
        Self {
            rules,
            views,
            cache: DashMap::new(),
            lock: Mutex::new(()),
            scans: AtomicU64::new(0),
        }
    }

    /// Renderer for the (already prefixed) view name.
    ///
    /// # Errors
    ///
    /// [`RenderError::UnknownRenderer`] when a matching rule names an unregistered
    /// renderer, [`RenderError::NoRendererFound`] when nothing knows the view.
    pub fn resolve(&self, view: &str) -> Result<Arc<dyn ViewRenderer>, RenderError> {
        if let Some(hit) = self.cache.get(view) {
            return Ok(Arc::clone(hit.value()));
        }

        let _guard = self.lock.lock();
        if let Some(hit) = self.cache.get(view) {
            return Ok(Arc::clone(hit.value()));
        }

        self.scans.fetch_add(1, Ordering::Relaxed);
        let renderer = self.scan(view)?;
        self.cache.insert(view.to_string(), Arc::clone(&renderer));
        info!(view = %view, cached = self.cache.len(), "View renderer resolved");
        Ok(renderer)
    }

    fn scan(&self, view: &str) -> Result<Arc<dyn ViewRenderer>, RenderError> {
        if let Some(rule) = self.rules.iter().find(|rule| rule.matches(view)) {
            debug!(view = %view, rule = %rule.regex(), renderer = %rule.renderer(), "Renderer rule matched");
            return self
                .views
                .get(rule.renderer())
                .ok_or_else(|| RenderError::UnknownRenderer {
                    view: view.to_string(),
                    renderer: rule.renderer().to_string(),
                });
        }
        self.views
            .fallback_service()
            .and_then(|service| service.renderer_for(view))
            .ok_or_else(|| RenderError::NoRendererFound {
                view: view.to_string(),
            })
    }

    /// How many times the rules were scanned (once per distinct view found or not found).
    pub fn scan_count(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    pub fn rules(&self) -> &[RendererRule] {
        &self.rules
    }
}
