use super::core::{ArgumentFetcher, FetchContext};
use crate::convert::{Erased, TypeDescriptor};
use crate::error::{FetchError, ValueSource};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Hands the method the current request-scoped instance of `T`, as an `Arc<T>`.
pub struct InjectedFetcher<T> {
    target: TypeDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> InjectedFetcher<T> {
    pub fn new() -> Self {
        Self {
            target: TypeDescriptor::of::<Arc<T>>(),
            _marker: PhantomData,
        }
    }
}

impl<T: Send + Sync + 'static> Default for InjectedFetcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for InjectedFetcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectedFetcher")
            .field("target", &self.target)
            .finish()
    }
}

impl<T: Send + Sync + 'static> ArgumentFetcher for InjectedFetcher<T> {
    fn resolve(&self, ctx: &FetchContext<'_>) -> Result<Erased, FetchError> {
        ctx.scope
            .get::<T>()
            .map(|instance| Box::new(instance) as Erased)
            .ok_or_else(|| FetchError::missing(std::any::type_name::<T>(), ValueSource::RequestScope))
    }

    fn target(&self) -> &TypeDescriptor {
        &self.target
    }
}
