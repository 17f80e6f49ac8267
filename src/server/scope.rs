//! Per-request instance store.
//!
//! The scope holds "the current instance of type X" for one request: the request
//! itself, the winning URL match, the model, the request id, and anything a filter or
//! controller stores. Each type has at most one instance; storing again replaces it.

use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

type Slot = Arc<dyn Any + Send + Sync>;

#[derive(Default)]
pub struct RequestScope {
    slots: RwLock<HashMap<TypeId, (&'static str, Slot)>>,
}

impl fmt::Debug for RequestScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.read();
        let mut names: Vec<&str> = slots.values().map(|(name, _)| *name).collect();
        names.sort_unstable();
        f.debug_struct("RequestScope").field("types", &names).finish()
    }
}

impl RequestScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` as the current instance of `T`.
    pub fn store<T: Send + Sync + 'static>(&self, value: T) {
        self.store_arc(Arc::new(value));
    }

    /// Store an already shared instance of `T`.
    pub fn store_arc<T: Send + Sync + 'static>(&self, value: Arc<T>) {
        let type_name = std::any::type_name::<T>();
        trace!(type_name, "Request scope store");
        self.slots
            .write()
            .insert(TypeId::of::<T>(), (type_name, value));
    }

    /// The current instance of `T`, if one was stored.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let slot = self.slots.read().get(&TypeId::of::<T>()).map(|(_, s)| Arc::clone(s))?;
        slot.downcast::<T>().ok()
    }

    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.slots.read().contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Token(&'static str);

    #[test]
    fn test_store_and_get() {
        let scope = RequestScope::new();
        assert!(scope.get::<Token>().is_none());
        scope.store(Token("a"));
        assert_eq!(*scope.get::<Token>().unwrap(), Token("a"));
        assert!(scope.contains::<Token>());
    }

    #[test]
    fn test_store_replaces() {
        let scope = RequestScope::new();
        scope.store(Token("a"));
        scope.store(Token("b"));
        assert_eq!(scope.get::<Token>().unwrap().0, "b");
        assert_eq!(scope.len(), 1);
    }

    #[test]
    fn test_types_are_isolated() {
        let scope = RequestScope::new();
        scope.store(1u32);
        scope.store("text".to_string());
        assert_eq!(*scope.get::<u32>().unwrap(), 1);
        assert_eq!(scope.get::<String>().unwrap().as_str(), "text");
        assert!(scope.get::<u64>().is_none());
    }
}
