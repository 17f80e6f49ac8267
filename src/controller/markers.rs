use std::collections::{HashMap, HashSet};

/// Controller-level declaration, inherited through the controller hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassMarker {
    /// Directory prefixed to view names that do not start with `/`
    ViewDirectory(String),
    /// One renderer rule: views matching `regex` go to renderer `renderer`
    RenderedWith { regex: String, renderer: String },
    /// An ordered list of renderer rules; wins over a single `RenderedWith`
    Rendered(Vec<(String, String)>),
}

/// The markers declared directly on one controller, and the controllers it extends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerMarkers {
    pub name: String,
    pub markers: Vec<ClassMarker>,
    pub parents: Vec<String>,
}

impl ControllerMarkers {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn marker(mut self, marker: ClassMarker) -> Self {
        self.markers.push(marker);
        self
    }

    #[must_use]
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parents.push(parent.into());
        self
    }
}

/// Known controllers by name, for walking inherited markers.
///
/// The walk visits a controller's own markers first, then each parent depth-first in
/// declaration order. A controller reached twice (diamonds, cycles) is only visited once.
#[derive(Debug, Clone, Default)]
pub struct MarkerHierarchy {
    sources: HashMap<String, ControllerMarkers>,
}

impl MarkerHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a controller's declaration.
    pub fn declare(&mut self, markers: ControllerMarkers) {
        self.sources.insert(markers.name.clone(), markers);
    }

    #[must_use]
    pub fn with(mut self, markers: ControllerMarkers) -> Self {
        self.declare(markers);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ControllerMarkers> {
        self.sources.get(name)
    }

    /// First marker `pick` accepts, walking from `start`.
    pub fn find_first<T>(
        &self,
        start: &ControllerMarkers,
        pick: impl Fn(&ClassMarker) -> Option<T>,
    ) -> Option<T> {
        let mut visited = HashSet::new();
        self.walk_first(start, &pick, &mut visited)
    }

    fn walk_first<'a, T>(
        &'a self,
        node: &'a ControllerMarkers,
        pick: &impl Fn(&ClassMarker) -> Option<T>,
        visited: &mut HashSet<&'a str>,
    ) -> Option<T> {
        if !visited.insert(node.name.as_str()) {
            return None;
        }
        if let Some(found) = node.markers.iter().find_map(pick) {
            return Some(found);
        }
        node.parents
            .iter()
            .filter_map(|parent| self.sources.get(parent))
            .find_map(|parent| self.walk_first(parent, pick, visited))
    }

    /// Every marker `pick` accepts, in walk order.
    pub fn find_all<T>(
        &self,
        start: &ControllerMarkers,
        pick: impl Fn(&ClassMarker) -> Option<T>,
    ) -> Vec<T> {
        let mut visited = HashSet::new();
        let mut found = Vec::new();
        self.walk_all(start, &pick, &mut visited, &mut found);
        found
    }

    fn walk_all<'a, T>(
        &'a self,
        node: &'a ControllerMarkers,
        pick: &impl Fn(&ClassMarker) -> Option<T>,
        visited: &mut HashSet<&'a str>,
        found: &mut Vec<T>,
    ) {
        if !visited.insert(node.name.as_str()) {
            return;
        }
        found.extend(node.markers.iter().filter_map(pick));
        for parent in node.parents.iter().filter_map(|p| self.sources.get(p)) {
            self.walk_all(parent, pick, visited, found);
        }
    }
}
