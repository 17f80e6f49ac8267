//! Error taxonomy for route construction, argument resolution, invocation and rendering.
//!
//! Startup failures ([`RoutingConstructionError`]) abort registration of a controller.
//! Per-request failures are split by where they surface: argument failures become a
//! `400`, handled invocation failures are swallowed, everything else travels up to the
//! HTTP layer as a [`ServeError`].

use std::fmt;

/// Where a fetcher looked for a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueSource {
    PathVariables,
    RequestParameters,
    RequestAttributes,
    RequestScope,
}

impl ValueSource {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueSource::PathVariables => "path variables",
            ValueSource::RequestParameters => "request parameters",
            ValueSource::RequestAttributes => "request attributes",
            ValueSource::RequestScope => "request scope",
        }
    }
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw input could not be turned into the declared parameter type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionError {
    /// Parameter name the value was fetched for
    pub name: String,
    /// The offending raw value (joined with `,` for multi-valued input)
    pub raw: String,
    /// Declared target type
    pub target: &'static str,
    /// Converter's explanation
    pub reason: String,
}

impl ConversionError {
    pub fn new(
        name: impl Into<String>,
        raw: impl Into<String>,
        target: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            raw: raw.into(),
            target,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cannot convert '{}' to {} for parameter '{}': {}",
            self.raw, self.target, self.name, self.reason
        )
    }
}

impl std::error::Error for ConversionError {}

/// Failure while resolving one method argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// No value was supplied and no default was declared
    MissingParameter {
        name: String,
        source: ValueSource,
    },
    /// A value was supplied but did not convert
    Conversion(ConversionError),
    /// Routing state is inconsistent (e.g. a validated path variable vanished)
    Internal(String),
}

impl FetchError {
    pub fn missing(name: impl Into<String>, source: ValueSource) -> Self {
        FetchError::MissingParameter {
            name: name.into(),
            source,
        }
    }

    /// Whether this failure is the client's fault and maps to `400 Bad Request`.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !matches!(self, FetchError::Internal(_))
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::MissingParameter { name, source } => {
                write!(f, "Missing parameter '{}' in {}", name, source)
            }
            FetchError::Conversion(err) => err.fmt(f),
            FetchError::Internal(msg) => write!(f, "Internal dispatch error: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<ConversionError> for FetchError {
    fn from(err: ConversionError) -> Self {
        FetchError::Conversion(err)
    }
}

/// Raised while compiling a controller's methods at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingConstructionError {
    /// The URL pattern is malformed or its regex does not compile
    InvalidPattern { pattern: String, reason: String },
    /// A fetcher references a path variable the pattern does not capture
    UnknownPathVariable {
        method: String,
        pattern: String,
        variable: String,
    },
    /// Two methods of one controller share a name
    DuplicateMethod { controller: String, method: String },
    /// A renderer-selection rule's regex does not compile
    InvalidRendererRule { regex: String, reason: String },
}

impl fmt::Display for RoutingConstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingConstructionError::InvalidPattern { pattern, reason } => {
                write!(f, "Invalid URL pattern '{}': {}", pattern, reason)
            }
            RoutingConstructionError::UnknownPathVariable {
                method,
                pattern,
                variable,
            } => write!(
                f,
                "Method '{}' binds path variable '{}' but pattern '{}' does not capture it",
                method, variable, pattern
            ),
            RoutingConstructionError::DuplicateMethod { controller, method } => write!(
                f,
                "Controller '{}' registers method '{}' more than once",
                controller, method
            ),
            RoutingConstructionError::InvalidRendererRule { regex, reason } => {
                write!(f, "Invalid renderer rule '{}': {}", regex, reason)
            }
        }
    }
}

impl std::error::Error for RoutingConstructionError {}

/// Outcome of an invocation that did not produce a value.
#[derive(Debug)]
pub enum InvocationError {
    /// An argument could not be resolved; the method was not called
    Fetch(FetchError),
    /// The method failed and the failure has already been turned into a response
    Handled,
    /// The method failed and nobody handled it
    Unhandled(anyhow::Error),
}

impl fmt::Display for InvocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationError::Fetch(err) => err.fmt(f),
            InvocationError::Handled => f.write_str("Invocation failure was handled"),
            InvocationError::Unhandled(err) => write!(f, "Unhandled invocation failure: {:#}", err),
        }
    }
}

impl std::error::Error for InvocationError {}

impl From<FetchError> for InvocationError {
    fn from(err: FetchError) -> Self {
        InvocationError::Fetch(err)
    }
}

/// Failure while producing output for a successful invocation.
#[derive(Debug)]
pub enum RenderError {
    /// Neither a renderer rule nor the fallback service knows the view
    NoRendererFound { view: String },
    /// A rule matched but names a renderer nobody registered
    UnknownRenderer { view: String, renderer: String },
    /// The renderer itself failed
    Rendering { view: String, source: anyhow::Error },
    /// A write directive was used by a method that returned nothing
    NullWrite { method: String },
    /// Streaming a write directive's value failed
    Io(std::io::Error),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::NoRendererFound { view } => {
                write!(f, "No view renderer found for '{}'", view)
            }
            RenderError::UnknownRenderer { view, renderer } => write!(
                f,
                "View '{}' selects renderer '{}' which is not registered",
                view, renderer
            ),
            RenderError::Rendering { view, source } => {
                write!(f, "Rendering of view '{}' failed: {:#}", view, source)
            }
            RenderError::NullWrite { method } => write!(
                f,
                "Method '{}' writes its result but returned nothing",
                method
            ),
            RenderError::Io(err) => write!(f, "Response write failed: {}", err),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::Io(err)
    }
}

/// Failure propagated from a servlet to the surrounding HTTP layer (5xx class).
#[derive(Debug)]
pub enum ServeError {
    /// The invoked method failed and no exception handler claimed the failure
    Unhandled(anyhow::Error),
    /// Rendering or writing the result failed
    Render(RenderError),
    /// Routing state was inconsistent at resolution time
    Internal(String),
}

impl ServeError {
    /// Status the HTTP layer should answer with when it has nothing better.
    #[must_use]
    pub fn status(&self) -> u16 {
        500
    }
}

impl fmt::Display for ServeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServeError::Unhandled(err) => write!(f, "Unhandled failure: {:#}", err),
            ServeError::Render(err) => err.fmt(f),
            ServeError::Internal(msg) => write!(f, "Internal dispatch error: {}", msg),
        }
    }
}

impl std::error::Error for ServeError {}

impl From<RenderError> for ServeError {
    fn from(err: RenderError) -> Self {
        ServeError::Render(err)
    }
}
