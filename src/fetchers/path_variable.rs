use super::core::{ArgumentFetcher, FetchContext};
use crate::convert::{Erased, TypeDescriptor};
use crate::error::{ConversionError, FetchError};

/// Reads a variable captured by the URL pattern.
///
/// Captured text is percent-decoded before conversion (`John%20Doe` becomes `John Doe`);
/// `+` is left as is. A sequence that does not decode to UTF-8 is a conversion error.
#[derive(Debug, Clone)]
pub struct PathVariableFetcher {
    name: String,
    target: TypeDescriptor,
}

impl PathVariableFetcher {
    pub fn new(name: impl Into<String>, target: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            target,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl ArgumentFetcher for PathVariableFetcher {
    fn resolve(&self, ctx: &FetchContext<'_>) -> Result<Erased, FetchError> {
        // Registration checked the variable exists, so a miss means routing state is broken.
        let raw = ctx
            .url_match
            .and_then(|m| m.path_variable(&self.name))
            .ok_or_else(|| {
                FetchError::Internal(format!(
                    "path variable '{}' is not part of the current match",
                    self.name
                ))
            })?;
        let decoded = urlencoding::decode(raw).map_err(|e| {
            ConversionError::new(&self.name, raw, self.target.name(), e.to_string())
        })?;
        Ok(ctx.conversion.convert_scalar(&self.name, &decoded, &self.target)?)
    }

    fn target(&self) -> &TypeDescriptor {
        &self.target
    }

    fn path_variable(&self) -> Option<&str> {
        Some(&self.name)
    }
}
