use crate::error::RoutingConstructionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A whole route table file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTable {
    #[serde(default)]
    pub controllers: Vec<ControllerSpec>,
}

/// One controller: its mount prefix, class markers, parents and methods.
///
/// A controller without methods only contributes markers to the ones extending it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_directory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendered_with: Option<RendererSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rendered: Vec<RendererSpec>,
    #[serde(default)]
    pub methods: Vec<MethodSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RendererSpec {
    pub regex: String,
    pub renderer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSpec {
    pub name: String,
    pub pattern: String,
    /// Accepted verbs; empty accepts all of them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verbs: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
    #[serde(default)]
    pub directive: DirectiveSpec,
    /// Default view, `{}` is replaced by the return value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Path variable, parameter or attribute name; unused for injected parameters
    #[serde(default)]
    pub name: String,
    pub source: ParameterSource,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterSource {
    Path,
    Param,
    Attribute,
    Inject,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DirectiveSpec {
    #[default]
    View,
    Error {
        status: u16,
        #[serde(default)]
        message: String,
    },
    Redirect {
        #[serde(default)]
        target: String,
    },
    Write {
        #[serde(default)]
        buffer_size: Option<usize>,
    },
}

/// A route table that cannot be loaded or turned into controllers.
#[derive(Debug)]
pub enum TableError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_yaml::Error),
    UnknownType {
        method: String,
        parameter: String,
        type_name: String,
    },
    UnknownVerb {
        method: String,
        verb: String,
    },
    MissingHandler {
        method: String,
    },
    Construction {
        controller: String,
        source: RoutingConstructionError,
    },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::Io { path, source } => {
                write!(f, "Cannot read route table {}: {}", path.display(), source)
            }
            TableError::Parse(e) => write!(f, "Invalid route table: {e}"),
            TableError::UnknownType {
                method,
                parameter,
                type_name,
            } => write!(
                f,
                "{method}: parameter '{parameter}' has unsupported type '{type_name}'"
            ),
            TableError::UnknownVerb { method, verb } => {
                write!(f, "{method}: unsupported HTTP method '{verb}'")
            }
            TableError::MissingHandler { method } => write!(f, "No handler bound to {method}"),
            TableError::Construction { controller, source } => {
                write!(f, "Controller {controller}: {source}")
            }
        }
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TableError::Io { source, .. } => Some(source),
            TableError::Parse(e) => Some(e),
            TableError::Construction { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<serde_yaml::Error> for TableError {
    fn from(e: serde_yaml::Error) -> Self {
        TableError::Parse(e)
    }
}
