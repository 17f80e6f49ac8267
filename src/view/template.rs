use super::core::{Model, ViewRenderer};
use crate::server::ServletResponse;
use anyhow::Context;
use minijinja::Environment;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

enum Source {
    Dir(PathBuf),
    Memory(HashMap<String, String>),
}

/// Renders views as Jinja templates, with the request model as context.
///
/// Templates come either from a directory (view name = path below it) or from
/// in-memory sources keyed by view name.
pub struct TemplateRenderer {
    source: Source,
}

impl TemplateRenderer {
    pub fn from_dir<P: Into<PathBuf>>(base: P) -> Self {
        Self {
            source: Source::Dir(base.into()),
        }
    }

    pub fn from_sources<I, K, V>(templates: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            source: Source::Memory(
                templates
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    fn map_path(base: &Path, view: &str) -> Option<PathBuf> {
        let mut pb = base.to_path_buf();
        for comp in Path::new(view.trim_start_matches('/')).components() {
            match comp {
                Component::Normal(s) => pb.push(s),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(pb)
    }

    fn content_type(view: &str) -> &'static str {
        match Path::new(view)
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase()
            .as_str()
        {
            "html" => "text/html",
            "css" => "text/css",
            "js" => "application/javascript",
            "json" => "application/json",
            "txt" => "text/plain",
            _ => "application/octet-stream",
        }
    }

    fn load(&self, view: &str) -> anyhow::Result<String> {
        match &self.source {
            Source::Dir(base) => {
                let path = Self::map_path(base, view)
                    .ok_or_else(|| anyhow::anyhow!("view '{}' escapes the template directory", view))?;
                fs::read_to_string(&path)
                    .with_context(|| format!("reading template {}", path.display()))
            }
            Source::Memory(templates) => templates
                .get(view)
                .or_else(|| templates.get(view.trim_start_matches('/')))
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no template named '{}'", view)),
        }
    }
}

impl ViewRenderer for TemplateRenderer {
    fn render(&self, view: &str, model: &Model, res: &mut ServletResponse) -> anyhow::Result<()> {
        let source = self.load(view)?;
        let mut env = Environment::new();
        env.add_template(view, &source)?;
        let rendered = env.get_template(view)?.render(model.snapshot())?;
        res.set_header("content-type", Self::content_type(view));
        res.write_all(rendered.as_bytes())?;
        Ok(())
    }
}
