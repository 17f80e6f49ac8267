use super::core::{split_list, ArgumentFetcher, FetchContext};
use crate::convert::{Erased, TypeDescriptor};
use crate::error::{FetchError, ValueSource};

/// Reads a query or form parameter.
///
/// Collection and map typed parameters are handed to a specialised delegate chosen
/// once, when the fetcher is built.
#[derive(Debug, Clone)]
pub struct RequestParamFetcher {
    name: String,
    target: TypeDescriptor,
    default: Option<String>,
    delegate: Option<Delegate>,
}

#[derive(Debug, Clone)]
enum Delegate {
    Collection(CollectionDelegateFetcher),
    Map(MapDelegateFetcher),
}

impl RequestParamFetcher {
    pub fn new(name: impl Into<String>, target: TypeDescriptor, default: Option<String>) -> Self {
        let name = name.into();
        let delegate = if target.is_collection() {
            Some(Delegate::Collection(CollectionDelegateFetcher {
                name: name.clone(),
                target: target.clone(),
                default: default.clone(),
            }))
        } else if target.is_map() {
            Some(Delegate::Map(MapDelegateFetcher {
                name: name.clone(),
                target: target.clone(),
                default: default.clone(),
            }))
        } else {
            None
        };
        Self {
            name,
            target,
            default,
            delegate,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }
}

impl ArgumentFetcher for RequestParamFetcher {
    fn resolve(&self, ctx: &FetchContext<'_>) -> Result<Erased, FetchError> {
        match &self.delegate {
            Some(Delegate::Collection(d)) => return d.resolve(ctx),
            Some(Delegate::Map(d)) => return d.resolve(ctx),
            None => {}
        }

        let conversion = ctx.conversion;
        match ctx.request.parameter_values(&self.name) {
            None => match &self.default {
                Some(default) => Ok(conversion.convert_scalar(&self.name, default, &self.target)?),
                None => Err(FetchError::missing(&self.name, ValueSource::RequestParameters)),
            },
            Some(values) if values.len() == 1 => {
                Ok(conversion.convert_scalar(&self.name, values[0], &self.target)?)
            }
            Some(values) => {
                let raw: Vec<String> = values.into_iter().map(str::to_string).collect();
                Ok(conversion.convert_all(&self.name, &raw, &self.target)?)
            }
        }
    }

    fn target(&self) -> &TypeDescriptor {
        &self.target
    }
}

/// Builds a `Vec<T>` parameter from repeated values (`a=1&a=2`) or one comma-delimited
/// value (`a=1,2`).
#[derive(Debug, Clone)]
pub struct CollectionDelegateFetcher {
    name: String,
    target: TypeDescriptor,
    default: Option<String>,
}

impl CollectionDelegateFetcher {
    fn resolve(&self, ctx: &FetchContext<'_>) -> Result<Erased, FetchError> {
        let raw = match ctx.request.parameter_values(&self.name) {
            Some(values) if values.len() == 1 => split_list(values[0]),
            Some(values) => values.into_iter().map(str::to_string).collect(),
            None => match &self.default {
                Some(default) => split_list(default),
                None => return Err(FetchError::missing(&self.name, ValueSource::RequestParameters)),
            },
        };
        Ok(ctx.conversion.convert_all(&self.name, &raw, &self.target)?)
    }
}

/// Builds a `HashMap<String, V>` parameter from `key=value` pairs.
///
/// Pairs come from the parameter's own values (`m=a=1,b=2`) and from bracketed
/// parameters (`m[a]=1&m[b]=2`).
#[derive(Debug, Clone)]
pub struct MapDelegateFetcher {
    name: String,
    target: TypeDescriptor,
    default: Option<String>,
}

impl MapDelegateFetcher {
    fn resolve(&self, ctx: &FetchContext<'_>) -> Result<Erased, FetchError> {
        let mut entries: Vec<String> = ctx
            .request
            .parameter_values(&self.name)
            .unwrap_or_default()
            .into_iter()
            .flat_map(split_list)
            .collect();

        let prefix = format!("{}[", self.name);
        for (key, value) in ctx.request.parameters() {
            if let Some(inner) = key.strip_prefix(&prefix).and_then(|k| k.strip_suffix(']')) {
                entries.push(format!("{inner}={value}"));
            }
        }

        if entries.is_empty() {
            match &self.default {
                Some(default) => entries = split_list(default),
                None => return Err(FetchError::missing(&self.name, ValueSource::RequestParameters)),
            }
        }
        Ok(ctx.conversion.convert_all(&self.name, &entries, &self.target)?)
    }
}
