use super::core::{ArgumentFetcher, FetchContext};
use crate::convert::{Erased, TypeDescriptor};
use crate::error::{ConversionError, FetchError, ValueSource};
use std::sync::Arc;

/// Reads a named request attribute set by an upstream filter.
///
/// An attribute that already has the declared type is cloned. String attributes go
/// through the conversion service like a parameter would.
#[derive(Debug, Clone)]
pub struct RequestAttributeFetcher {
    name: String,
    target: TypeDescriptor,
    default: Option<String>,
}

impl RequestAttributeFetcher {
    pub fn new(name: impl Into<String>, target: TypeDescriptor, default: Option<String>) -> Self {
        Self {
            name: name.into(),
            target,
            default,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl ArgumentFetcher for RequestAttributeFetcher {
    fn resolve(&self, ctx: &FetchContext<'_>) -> Result<Erased, FetchError> {
        let conversion = ctx.conversion;
        let Some(attr) = ctx.request.attribute(&self.name) else {
            return match &self.default {
                Some(default) => Ok(conversion.convert_scalar(&self.name, default, &self.target)?),
                None => Err(FetchError::missing(&self.name, ValueSource::RequestAttributes)),
            };
        };

        if let Some(value) = self.target.clone_value(attr) {
            return Ok(value);
        }
        if let Some(raw) = attr.downcast_ref::<String>() {
            return Ok(conversion.convert_scalar(&self.name, raw, &self.target)?);
        }
        if let Some(raw) = attr.downcast_ref::<&'static str>() {
            return Ok(conversion.convert_scalar(&self.name, raw, &self.target)?);
        }
        if let Some(raw) = attr.downcast_ref::<Arc<str>>() {
            return Ok(conversion.convert_scalar(&self.name, raw, &self.target)?);
        }
        if let Some(raw) = attr.downcast_ref::<Vec<String>>() {
            return Ok(conversion.convert_all(&self.name, raw, &self.target)?);
        }
        Err(ConversionError::new(
            &self.name,
            "<opaque attribute>",
            self.target.name(),
            "attribute holds a value of another type",
        )
        .into())
    }

    fn target(&self) -> &TypeDescriptor {
        &self.target
    }
}
