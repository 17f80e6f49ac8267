//! # Server Module
//!
//! The servlet side of dispatch: the request and response a servlet works on, the
//! per-request scope, exception handling, and [`DispatchServlet`] itself.
//!
//! The HTTP server is not part of this crate. Whatever accepts connections builds a
//! [`ServletRequest`], calls [`DispatchServlet::service`] and writes the
//! [`ServletResponse`] back; a returned [`ServeError`](crate::error::ServeError) means
//! "answer with a 5xx".

mod exception;
mod request;
mod response;
mod scope;
mod servlet;

pub use exception::{ExceptionService, Handled};
pub use request::{parse_query_params, strip_session_id, Attribute, ServletRequest};
pub use response::{status_reason, ServletResponse};
pub use scope::RequestScope;
pub use servlet::{DispatchServlet, STANDARD_METHODS};
