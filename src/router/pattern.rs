use super::core::ParamVec;
use crate::error::RoutingConstructionError;
use regex::Regex;
use std::sync::Arc;

const DEFAULT_VARIABLE_REGEX: &str = "[^/]+";

/// A compiled URL pattern.
///
/// Compiled once when a method is registered; matching is a single anchored regex run.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    regex: Regex,
    /// (capture group name, path variable name), in pattern order
    variables: Vec<(String, Arc<str>)>,
    literal_len: usize,
}

fn invalid(pattern: &str, reason: impl Into<String>) -> RoutingConstructionError {
    RoutingConstructionError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.into(),
    }
}

impl PathPattern {
    /// Compile `pattern` into an anchored regex.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingConstructionError::InvalidPattern`] for unbalanced braces, empty or
    /// duplicate variable names, or a variable regex that does not compile.
    ///
    /// Inside a variable regex, braces within `[...]` or escaped with `\` do not count
    /// towards the variable's closing brace: `{id:[^}]+}` is one variable.
    pub fn compile(pattern: &str) -> Result<Self, RoutingConstructionError> {
        let mut regex_src = String::with_capacity(pattern.len() + 16);
        regex_src.push('^');
        let mut variables: Vec<(String, Arc<str>)> = Vec::new();
        let mut literal_len = 0usize;

        let mut chars = pattern.char_indices().peekable();
        let mut literal = String::new();
        while let Some((start, c)) = chars.next() {
            match c {
                '{' => {
                    regex_src.push_str(&regex::escape(&literal));
                    literal.clear();

                    // Variable body runs to the matching brace; regex quantifiers like
                    // `{2,3}` nest inside it. Escaped braces and braces inside a
                    // character class (`[^}]`) are part of the regex.
                    let mut depth = 1usize;
                    let mut in_class = false;
                    let mut escaped = false;
                    let mut end = None;
                    for (i, inner) in chars.by_ref() {
                        if escaped {
                            escaped = false;
                            continue;
                        }
                        match inner {
                            '\\' => escaped = true,
                            '[' => in_class = true,
                            ']' => in_class = false,
                            '{' if !in_class => depth += 1,
                            '}' if !in_class => {
                                depth -= 1;
                                if depth == 0 {
                                    end = Some(i);
                                    break;
                                }
                            }
                            _ => {}
                        }
                    }
                    let end = end.ok_or_else(|| invalid(pattern, "unclosed '{'"))?;
                    let body = &pattern[start + 1..end];
                    let (name, var_regex) = match body.split_once(':') {
                        Some((name, re)) => (name.trim(), re),
                        None => (body.trim(), DEFAULT_VARIABLE_REGEX),
                    };
                    if name.is_empty() {
                        return Err(invalid(pattern, "empty path variable name"));
                    }
                    if variables.iter().any(|(_, n)| n.as_ref() == name) {
                        return Err(invalid(
                            pattern,
                            format!("path variable '{name}' declared twice"),
                        ));
                    }
                    let group = format!("pv{}", variables.len());
                    regex_src.push_str("(?P<");
                    regex_src.push_str(&group);
                    regex_src.push('>');
                    regex_src.push_str(var_regex);
                    regex_src.push(')');
                    variables.push((group, Arc::from(name)));
                }
                '}' => return Err(invalid(pattern, "unmatched '}'")),
                _ => {
                    literal.push(c);
                    literal_len += 1;
                }
            }
        }
        regex_src.push_str(&regex::escape(&literal));
        regex_src.push('$');

        let regex = Regex::new(&regex_src).map_err(|e| invalid(pattern, e.to_string()))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
            variables,
            literal_len,
        })
    }

    /// Match the whole `path`; on success return the captured variables in pattern order.
    #[must_use]
    pub fn captures(&self, path: &str) -> Option<ParamVec> {
        let caps = self.regex.captures(path)?;
        let mut params = ParamVec::new();
        for (group, name) in &self.variables {
            let value = caps.name(group).map(|m| m.as_str()).unwrap_or_default();
            params.push((Arc::clone(name), value.to_string()));
        }
        Some(params)
    }

    #[must_use]
    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.iter().any(|(_, n)| n.as_ref() == name)
    }

    /// Variable names in pattern order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(|(_, n)| n.as_ref())
    }

    /// Count of characters outside `{...}` variables.
    #[inline]
    #[must_use]
    pub fn literal_len(&self) -> usize {
        self.literal_len
    }

    #[inline]
    #[must_use]
    pub fn capture_count(&self) -> usize {
        self.variables.len()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }
}
