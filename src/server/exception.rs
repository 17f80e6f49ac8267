use super::response::ServletResponse;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Error a controller method returns after it already wrote the failure response itself.
///
/// The servlet treats it as handled and writes nothing more.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Handled;

impl fmt::Display for Handled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("failure already handled")
    }
}

impl std::error::Error for Handled {}

type HandlerFn = Arc<dyn Fn(&anyhow::Error, &mut ServletResponse) -> bool + Send + Sync>;

/// Turns controller failures of known error types into responses.
///
/// Handlers are tried in registration order; the first whose error type matches the
/// failure (anywhere in its `anyhow` chain) writes the response.
#[derive(Clone, Default)]
pub struct ExceptionService {
    handlers: Vec<(&'static str, HandlerFn)>,
}

impl fmt::Debug for ExceptionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.handlers.iter().map(|(name, _)| name))
            .finish()
    }
}

impl ExceptionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for failures of error type `E`.
    #[must_use]
    pub fn on<E, F>(mut self, handler: F) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
        F: Fn(&E, &mut ServletResponse) + Send + Sync + 'static,
    {
        let wrapped: HandlerFn = Arc::new(move |err: &anyhow::Error, res: &mut ServletResponse| {
            let found = err.chain().find_map(|cause| cause.downcast_ref::<E>());
            match found {
                Some(e) => {
                    handler(e, res);
                    true
                }
                None => false,
            }
        });
        self.handlers.push((std::any::type_name::<E>(), wrapped));
        self
    }

    /// Give `err` to the first matching handler. Returns whether it was handled.
    pub fn handle(&self, err: &anyhow::Error, res: &mut ServletResponse) -> bool {
        for (name, handler) in &self.handlers {
            if handler(err, res) {
                debug!(error_type = name, error = %err, "Exception handled");
                return true;
            }
        }
        false
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
