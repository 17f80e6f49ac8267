//! # mvc-dispatch
//!
//! **mvc-dispatch** is the dispatch core of an MVC web layer: it routes a servlet request to
//! the most specific controller method, resolves the method's arguments from the request,
//! invokes it, and turns what it returns into a response through a render directive or a
//! view renderer.
//!
//! ## Architecture
//!
//! - **[`router`]** - URL patterns with `{variables}`, and the specificity order that picks
//!   one method when several match
//! - **[`convert`]** - String-to-type conversion for parameters, collections and maps
//! - **[`fetchers`]** - One argument fetcher per parameter: path variables, request
//!   parameters, request attributes, request-scoped injectables
//! - **[`invocation`]** - Method declarations ([`invocation::Mapping`]), compiled descriptors
//!   and render directives
//! - **[`controller`]** - Per-controller registries and inherited class markers
//! - **[`view`]** - The model, view renderers and the cached renderer resolver
//! - **[`server`]** - The dispatch servlet with its request, response and request scope
//! - **[`mvc`]** - Servlets mounted under URL prefixes
//! - **[`table`]** - Controllers declared in YAML route tables
//! - **[`cli`]** - The `mvc-dispatch` route table checker
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Http as HTTP layer
//!     participant Mvc as Mvc
//!     participant Servlet as DispatchServlet
//!     participant Registry as ControllerRegistry
//!     participant Desc as InvocationDescriptor
//!     participant Fetch as ArgumentFetchers
//!     participant Resolver as RenderResolver
//!
//!     Http->>Mvc: dispatch(request)
//!     Mvc->>Mvc: longest prefix, set path info
//!     Mvc->>Servlet: service(request)
//!     alt non-standard verb
//!         Servlet-->>Http: 501
//!     end
//!     Servlet->>Servlet: strip ;jsessionid, fill request scope
//!     Servlet->>Registry: best_invocation (every registry)
//!     Registry-->>Servlet: most specific match
//!     alt no match
//!         Servlet-->>Http: 404
//!     end
//!     Servlet->>Desc: invoke
//!     Desc->>Fetch: resolve each argument
//!     alt missing or unconvertible
//!         Servlet-->>Http: 400
//!     end
//!     Desc->>Desc: call controller method
//!     Servlet->>Servlet: apply render directive
//!     Servlet->>Resolver: renderer for view
//!     Resolver-->>Servlet: cached renderer
//!     Servlet-->>Http: response
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use mvc_dispatch::controller::ControllerRegistry;
//! use mvc_dispatch::invocation::Mapping;
//! use mvc_dispatch::mvc::Mvc;
//! use mvc_dispatch::server::{ServletRequest, ServletResponse};
//! use std::sync::Arc;
//!
//! struct Users;
//!
//! impl Users {
//!     fn name_of(&self, id: u64) -> String {
//!         format!("user-{id}")
//!     }
//! }
//!
//! let users = ControllerRegistry::builder("Users", Arc::new(Users))
//!     .handle(
//!         Mapping::get("show", "/users/{id}").path_var::<u64>("id").write(),
//!         |users, args| Ok(Some(users.name_of(args.take(0)?).into())),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let mvc = Mvc::builder().control("/", Arc::new(users)).build();
//!
//! let mut res = ServletResponse::new();
//! mvc.dispatch(ServletRequest::get("/users/7"), &mut res).unwrap();
//! assert_eq!(res.body_string(), "user-7");
//!
//! let mut res = ServletResponse::new();
//! mvc.dispatch(ServletRequest::get("/users/seven"), &mut res).unwrap();
//! assert_eq!(res.status(), 400);
//! ```
//!
//! ## Configuration
//!
//! Dispatch settings come from environment variables ([`runtime_config`]), logging from
//! `MVC_LOG_*` variables ([`logging`]).

pub mod cli;
pub mod controller;
pub mod convert;
pub mod error;
pub mod fetchers;
pub mod ids;
pub mod invocation;
pub mod logging;
pub mod mvc;
pub mod router;
pub mod runtime_config;
pub mod server;
pub mod table;
pub mod view;

pub use controller::ControllerRegistry;
pub use error::{FetchError, InvocationError, RenderError, RoutingConstructionError, ServeError};
pub use invocation::{Mapping, RenderDirective, ReturnValue};
pub use mvc::Mvc;
pub use server::{DispatchServlet, ServletRequest, ServletResponse};
