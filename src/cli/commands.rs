use crate::server::{ServletRequest, STANDARD_METHODS};
use crate::table::{HandlerTable, RouteTable};
use anyhow::Context;
use clap::{Parser, Subcommand};
use http::Method;
use std::io::Write;
use std::path::PathBuf;

/// Command-line interface for mvc-dispatch
///
/// Inspects YAML route tables without serving anything.
#[derive(Debug, Parser)]
#[command(name = "mvc-dispatch")]
#[command(about = "Route table checker for mvc-dispatch", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build every controller of a route table and report construction errors
    Check {
        /// Path to the YAML route table
        #[arg(short, long)]
        table: PathBuf,
    },
    /// Show which method a request would be dispatched to
    Explain {
        /// Path to the YAML route table
        #[arg(short, long)]
        table: PathBuf,

        /// HTTP method of the request
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request path, query string allowed
        #[arg(short, long)]
        path: String,
    },
}

pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(&cli.command, &mut out)
}

/// Run one command, writing its report to `out`.
///
/// # Errors
///
/// Fails when the table cannot be loaded, or (for `check`) when any controller fails
/// to build.
pub fn execute(command: &Commands, out: &mut dyn Write) -> anyhow::Result<()> {
    match command {
        Commands::Check { table } => {
            let routes = RouteTable::load(table)?;
            let errors = routes.check();
            let built = routes.routable().count() - errors.len();
            for error in &errors {
                writeln!(out, "error: {error}")?;
            }
            writeln!(
                out,
                "{}: {} controller(s) built, {} failed",
                table.display(),
                built,
                errors.len()
            )?;
            if errors.is_empty() {
                Ok(())
            } else {
                anyhow::bail!("{} controller(s) failed to build", errors.len())
            }
        }
        Commands::Explain {
            table,
            method,
            path,
        } => {
            let routes = RouteTable::load(table)?;
            let mvc = routes
                .build(&HandlerTable::stubs(&routes))
                .with_context(|| format!("Failed to build {}", table.display()))?;
            let verb = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("Invalid HTTP method '{method}'"))?;
            if !STANDARD_METHODS.contains(&verb) {
                writeln!(out, "{verb} {path} -> 501 Not Implemented")?;
                return Ok(());
            }
            let req = ServletRequest::new(verb.clone(), path);
            match mvc.explain(&req) {
                Some(best) => {
                    let specificity = best.url_match.specificity;
                    writeln!(
                        out,
                        "{} {} -> {}.{} ({})",
                        verb,
                        path,
                        best.registry.name(),
                        best.descriptor.name(),
                        best.descriptor.pattern().as_str()
                    )?;
                    writeln!(
                        out,
                        "  specificity: literal_len={} captures={} registry={} order={}",
                        specificity.literal_len,
                        specificity.captures,
                        specificity.registry,
                        specificity.order
                    )?;
                    for (name, value) in &best.url_match.path_variables {
                        writeln!(out, "  {name} = {value}")?;
                    }
                }
                None => writeln!(out, "{verb} {path} -> 404 Not Found")?,
            }
            Ok(())
        }
    }
}
