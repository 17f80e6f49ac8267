//! # CLI Module
//!
//! Command-line tooling for route tables (see [`crate::table`]).
//!
//! ## Commands
//!
//! ### `check`
//!
//! Build every controller of a table with stub handlers and report what fails to
//! construct (unknown path variables, bad patterns, unsupported types or verbs):
//!
//! ```bash
//! mvc-dispatch check --table routes.yaml
//! ```
//!
//! Exits non-zero when any controller fails.
//!
//! ### `explain`
//!
//! Show the method a request would be dispatched to, with its specificity and path
//! variables, or `404`:
//!
//! ```bash
//! mvc-dispatch explain --table routes.yaml --method GET --path /app/user/42
//! ```

mod commands;


pub use commands::{execute, run_cli, Cli, Commands};
