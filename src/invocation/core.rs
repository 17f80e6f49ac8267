use crate::convert::Erased;
use crate::server::ServletResponse;
use std::fmt;
use std::io::Read;
use std::sync::Arc;

/// What a method's output turns into once it has been invoked.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RenderDirective {
    /// Render a view (the default view, or the view named by the return value)
    #[default]
    View,
    /// Answer with an HTTP error; an integer return overrides the status, any other
    /// return overrides the message
    Error { status: u16, message: String },
    /// Redirect; `{}` in the target is replaced by the return value
    Redirect { target: String },
    /// Stream the return value into the response body
    Write { buffer_size: Option<usize> },
}

/// Value returned by a controller method.
pub enum ReturnValue {
    Integer(i64),
    Value(String),
    /// Raw bytes, copied as-is
    Bytes(Box<dyn Read + Send>),
    /// UTF-8 text, copied as-is
    Chars(Box<dyn Read + Send>),
}

impl ReturnValue {
    /// Any displayable value, by its string form.
    pub fn display(value: impl fmt::Display) -> Self {
        ReturnValue::Value(value.to_string())
    }

    pub fn bytes(reader: impl Read + Send + 'static) -> Self {
        ReturnValue::Bytes(Box::new(reader))
    }

    pub fn chars(reader: impl Read + Send + 'static) -> Self {
        ReturnValue::Chars(Box::new(reader))
    }

    /// String form of a plain value; streams have none.
    pub fn text(&self) -> Option<String> {
        match self {
            ReturnValue::Integer(i) => Some(i.to_string()),
            ReturnValue::Value(s) => Some(s.clone()),
            ReturnValue::Bytes(_) | ReturnValue::Chars(_) => None,
        }
    }
}

impl fmt::Debug for ReturnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnValue::Integer(i) => f.debug_tuple("Integer").field(i).finish(),
            ReturnValue::Value(s) => f.debug_tuple("Value").field(s).finish(),
            ReturnValue::Bytes(_) => f.write_str("Bytes(..)"),
            ReturnValue::Chars(_) => f.write_str("Chars(..)"),
        }
    }
}

impl PartialEq for ReturnValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ReturnValue::Integer(a), ReturnValue::Integer(b)) => a == b,
            (ReturnValue::Value(a), ReturnValue::Value(b)) => a == b,
            _ => false,
        }
    }
}

macro_rules! integer_return {
    ($($t:ty),*) => {
        $(impl From<$t> for ReturnValue {
            fn from(v: $t) -> Self {
                ReturnValue::Integer(i64::from(v))
            }
        })*
    };
}

integer_return!(i8, i16, i32, i64, u8, u16, u32);

impl From<String> for ReturnValue {
    fn from(v: String) -> Self {
        ReturnValue::Value(v)
    }
}

impl From<&str> for ReturnValue {
    fn from(v: &str) -> Self {
        ReturnValue::Value(v.to_string())
    }
}

/// Result type of a controller method.
pub type MethodResult = anyhow::Result<Option<ReturnValue>>;

/// Type-erased controller method, already bound to its controller instance.
pub type InvokeFn = dyn Fn(&mut Arguments<'_>) -> MethodResult + Send + Sync;

/// The resolved arguments of one invocation, plus the response being written.
pub struct Arguments<'r> {
    method: Arc<str>,
    values: Vec<Option<Erased>>,
    response: &'r mut ServletResponse,
}

impl fmt::Debug for Arguments<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arguments")
            .field("method", &self.method)
            .field("len", &self.values.len())
            .finish()
    }
}

impl<'r> Arguments<'r> {
    pub fn new(method: Arc<str>, values: Vec<Erased>, response: &'r mut ServletResponse) -> Self {
        Self {
            method,
            values: values.into_iter().map(Some).collect(),
            response,
        }
    }

    /// Move argument `index` out, typed as `T`.
    ///
    /// # Errors
    ///
    /// Fails when the index is out of range, the argument was already taken, or it has
    /// another type than `T`.
    pub fn take<T: 'static>(&mut self, index: usize) -> anyhow::Result<T> {
        let slot = self.values.get_mut(index).ok_or_else(|| {
            anyhow::anyhow!("method '{}' has no argument #{}", self.method, index)
        })?;
        let value = slot.take().ok_or_else(|| {
            anyhow::anyhow!("argument #{} of '{}' was already taken", index, self.method)
        })?;
        value.downcast::<T>().map(|b| *b).map_err(|_| {
            anyhow::anyhow!(
                "argument #{} of '{}' is not a {}",
                index,
                self.method,
                std::any::type_name::<T>()
            )
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// The response, for methods that write failures (or anything else) themselves.
    pub fn response(&mut self) -> &mut ServletResponse {
        self.response
    }
}
