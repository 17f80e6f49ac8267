//! # Runtime Configuration Module
//!
//! Environment variable based configuration for dispatch behaviour.
//!
//! ## Environment Variables
//!
//! ### `MVC_WRITE_BUFFER_SIZE`
//!
//! Chunk size used when a write directive streams a value and declares no buffer size
//! of its own. Accepts values in:
//! - Decimal: `4096`
//! - Hexadecimal: `0x1000`
//!
//! Default: `1024`
//!
//! ### `MVC_STRIP_SESSION_ID`
//!
//! Whether `;jsessionid=...` decorations are removed from request paths before
//! matching. `false`, `0`, `no` and `off` disable it.
//!
//! Default: `true`
//!
//! ## Usage
//!
//! ```rust
//! use mvc_dispatch::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("Write buffer: {} bytes", config.write_buffer_size);
//! ```

use std::env;

/// Default chunk size for write directives.
pub const DEFAULT_WRITE_BUFFER_SIZE: usize = 1024;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Chunk size for write directives without an explicit buffer size
    pub write_buffer_size: usize,
    /// Remove `;jsessionid=` path decorations before matching
    pub strip_session_id: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            write_buffer_size: DEFAULT_WRITE_BUFFER_SIZE,
            strip_session_id: true,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup (used by tests instead of the process env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let write_buffer_size = lookup("MVC_WRITE_BUFFER_SIZE")
            .and_then(|val| parse_size(&val))
            .filter(|size| *size > 0)
            .unwrap_or(defaults.write_buffer_size);
        let strip_session_id = lookup("MVC_STRIP_SESSION_ID")
            .map(|val| {
                !matches!(
                    val.trim().to_ascii_lowercase().as_str(),
                    "false" | "0" | "no" | "off"
                )
            })
            .unwrap_or(defaults.strip_session_id);
        RuntimeConfig {
            write_buffer_size,
            strip_session_id,
        }
    }
}

fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    match val.strip_prefix("0x") {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}
