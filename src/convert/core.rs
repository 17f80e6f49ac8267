use crate::error::ConversionError;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// A type-erased argument value, owned by the invocation that resolves it.
pub type Erased = Box<dyn Any + Send>;

type ConvertFn = Arc<dyn Fn(&str) -> anyhow::Result<Erased> + Send + Sync>;
type CloneFn = fn(&(dyn Any + Send + Sync)) -> Option<Erased>;
type CollectFn = fn(Vec<Erased>) -> Option<Erased>;
type CollectMapFn = fn(Vec<(String, Erased)>) -> Option<Erased>;

/// How a declared parameter type is assembled from raw strings.
#[derive(Clone)]
pub enum Shape {
    /// One raw string, one value
    Scalar,
    /// `Vec<T>` of an element type
    Collection {
        element: Box<TypeDescriptor>,
        collect: CollectFn,
    },
    /// `HashMap<String, V>` of a value type
    Map {
        value: Box<TypeDescriptor>,
        collect: CollectMapFn,
    },
}

/// Declared type of a method parameter.
///
/// Built once per parameter at registration time; carries everything needed to build
/// (or clone) a value of that type without knowing it statically.
#[derive(Clone)]
pub struct TypeDescriptor {
    id: TypeId,
    name: &'static str,
    shape: Shape,
    clone_from: CloneFn,
}

fn clone_erased<T: Clone + Send + 'static>(value: &(dyn Any + Send + Sync)) -> Option<Erased> {
    value
        .downcast_ref::<T>()
        .map(|v| Box::new(v.clone()) as Erased)
}

fn collect_vec<T: Send + 'static>(items: Vec<Erased>) -> Option<Erased> {
    items
        .into_iter()
        .map(|item| item.downcast::<T>().ok().map(|b| *b))
        .collect::<Option<Vec<T>>>()
        .map(|v| Box::new(v) as Erased)
}

fn collect_map<V: Send + 'static>(entries: Vec<(String, Erased)>) -> Option<Erased> {
    entries
        .into_iter()
        .map(|(k, item)| item.downcast::<V>().ok().map(|b| (k, *b)))
        .collect::<Option<HashMap<String, V>>>()
        .map(|m| Box::new(m) as Erased)
}

impl TypeDescriptor {
    /// Scalar type `T`, converted by the converter registered for `T`.
    #[must_use]
    pub fn of<T: Clone + Send + Sync + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            shape: Shape::Scalar,
            clone_from: clone_erased::<T>,
        }
    }

    /// `Vec<T>`; each raw string converts to one element.
    #[must_use]
    pub fn list_of<T: Clone + Send + Sync + 'static>() -> Self {
        Self {
            id: TypeId::of::<Vec<T>>(),
            name: std::any::type_name::<Vec<T>>(),
            shape: Shape::Collection {
                element: Box::new(Self::of::<T>()),
                collect: collect_vec::<T>,
            },
            clone_from: clone_erased::<Vec<T>>,
        }
    }

    /// `HashMap<String, V>`; each `key=value` pair converts its value.
    #[must_use]
    pub fn map_of<V: Clone + Send + Sync + 'static>() -> Self {
        Self {
            id: TypeId::of::<HashMap<String, V>>(),
            name: std::any::type_name::<HashMap<String, V>>(),
            shape: Shape::Map {
                value: Box::new(Self::of::<V>()),
                collect: collect_map::<V>,
            },
            clone_from: clone_erased::<HashMap<String, V>>,
        }
    }

    #[inline]
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    #[must_use]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[must_use]
    pub fn is_collection(&self) -> bool {
        matches!(self.shape, Shape::Collection { .. })
    }

    #[must_use]
    pub fn is_map(&self) -> bool {
        matches!(self.shape, Shape::Map { .. })
    }

    /// Clone a stored value if it already has this type.
    #[must_use]
    pub fn clone_value(&self, value: &(dyn Any + Send + Sync)) -> Option<Erased> {
        (self.clone_from)(value)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Converts raw request strings into values of declared types.
///
/// Pure: converting the same input to the same type always yields the same result and
/// has no side effects. Shared read-only across requests once built.
#[derive(Clone)]
pub struct ConversionService {
    converters: HashMap<TypeId, ConvertFn>,
}

impl Default for ConversionService {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConversionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionService")
            .field("converters", &self.converters.len())
            .finish()
    }
}

impl ConversionService {
    /// A service with converters for the primitive types, `char` and `String`.
    #[must_use]
    pub fn new() -> Self {
        let mut service = Self::empty();
        service.register_from_str::<bool>();
        service.register_from_str::<i8>();
        service.register_from_str::<i16>();
        service.register_from_str::<i32>();
        service.register_from_str::<i64>();
        service.register_from_str::<i128>();
        service.register_from_str::<isize>();
        service.register_from_str::<u8>();
        service.register_from_str::<u16>();
        service.register_from_str::<u32>();
        service.register_from_str::<u64>();
        service.register_from_str::<u128>();
        service.register_from_str::<usize>();
        service.register_from_str::<f32>();
        service.register_from_str::<f64>();
        service.register_from_str::<char>();
        service.register::<String, _>(|raw: &str| Ok(raw.to_string()));
        service
    }

    /// A service with no converters at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    /// Register (or replace) the converter for `T`.
    pub fn register<T, F>(&mut self, convert: F)
    where
        T: Send + 'static,
        F: Fn(&str) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        debug!(
            target_type = std::any::type_name::<T>(),
            "Converter registered"
        );
        self.converters.insert(
            TypeId::of::<T>(),
            Arc::new(move |raw: &str| convert(raw).map(|v| Box::new(v) as Erased)),
        );
    }

    /// Register `T`'s [`FromStr`] implementation as its converter.
    ///
    /// This is how enums become convertible by name.
    pub fn register_from_str<T>(&mut self)
    where
        T: FromStr + Send + 'static,
        T::Err: fmt::Display,
    {
        self.register::<T, _>(|raw: &str| raw.parse::<T>().map_err(|e| anyhow::anyhow!("{}", e)));
    }

    #[must_use]
    pub fn can_convert(&self, ty: &TypeDescriptor) -> bool {
        match ty.shape() {
            Shape::Scalar => self.converters.contains_key(&ty.type_id()),
            Shape::Collection { element, .. } => self.can_convert(element),
            Shape::Map { value, .. } => self.can_convert(value),
        }
    }

    /// Convert one raw string to the scalar type `ty`.
    pub fn convert_scalar(
        &self,
        name: &str,
        raw: &str,
        ty: &TypeDescriptor,
    ) -> Result<Erased, ConversionError> {
        match ty.shape() {
            Shape::Scalar => {}
            _ => return self.convert_all(name, &[raw.to_string()], ty),
        }
        let converter = self.converters.get(&ty.type_id()).ok_or_else(|| {
            ConversionError::new(name, raw, ty.name(), "no converter registered")
        })?;
        converter(raw).map_err(|e| ConversionError::new(name, raw, ty.name(), e.to_string()))
    }

    /// Convert a whole array of raw strings to `ty`.
    ///
    /// Collections convert element-wise in input order; maps expect `key=value`
    /// entries; scalars accept exactly one value.
    pub fn convert_all(
        &self,
        name: &str,
        raw: &[String],
        ty: &TypeDescriptor,
    ) -> Result<Erased, ConversionError> {
        match ty.shape() {
            Shape::Scalar => match raw {
                [single] => self.convert_scalar(name, single, ty),
                _ => Err(ConversionError::new(
                    name,
                    raw.join(","),
                    ty.name(),
                    format!("expected a single value, got {}", raw.len()),
                )),
            },
            Shape::Collection { element, collect } => {
                let items = raw
                    .iter()
                    .map(|r| self.convert_scalar(name, r, element))
                    .collect::<Result<Vec<_>, _>>()?;
                collect(items).ok_or_else(|| {
                    ConversionError::new(name, raw.join(","), ty.name(), "element type mismatch")
                })
            }
            Shape::Map { value, collect } => {
                let mut entries = Vec::with_capacity(raw.len());
                for entry in raw {
                    let (key, val) = entry.split_once('=').ok_or_else(|| {
                        ConversionError::new(
                            name,
                            entry.as_str(),
                            ty.name(),
                            "expected a key=value pair",
                        )
                    })?;
                    entries.push((key.to_string(), self.convert_scalar(name, val, value)?));
                }
                collect(entries).ok_or_else(|| {
                    ConversionError::new(name, raw.join(","), ty.name(), "value type mismatch")
                })
            }
        }
    }

    /// Typed convenience wrapper around [`convert_scalar`](Self::convert_scalar).
    pub fn convert<T: Clone + Send + Sync + 'static>(
        &self,
        raw: &str,
    ) -> Result<T, ConversionError> {
        let ty = TypeDescriptor::of::<T>();
        let value = self.convert_scalar("value", raw, &ty)?;
        value
            .downcast::<T>()
            .map(|b| *b)
            .map_err(|_| ConversionError::new("value", raw, ty.name(), "converter returned another type"))
    }
}
