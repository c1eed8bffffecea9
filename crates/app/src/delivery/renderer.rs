//! Placeholder substitution for outgoing message templates.
//!
//! Two template dialects are supported. Files ending in `.j2` use
//! `{{ name }}` placeholders. Anything else uses `%(name)s` placeholders,
//! where every variable is also available HTML-escaped as `name_forhtml` and
//! URL-encoded as `name_forurl`.

use std::{collections::BTreeMap, fs, io, path::Path};

use thiserror::Error;
use url::form_urlencoded;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("template references unknown placeholder {0}")]
    UnknownPlaceholder(String),

    #[error("unterminated placeholder at byte {0}")]
    Unterminated(usize),

    #[error("unsupported format directive at byte {0}")]
    Directive(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Renderer {
    /// `{{ name }}` placeholders, unknown names render empty.
    Jinja(String),

    /// `%(name)s` placeholders, unknown names are an error.
    Legacy(String),
}

impl Renderer {
    /// Pick the dialect from the template's file name.
    #[must_use]
    pub fn for_file(path: &Path, source: String) -> Self {
        if path.extension().is_some_and(|ext| ext == "j2") {
            Self::Jinja(source)
        } else {
            Self::Legacy(source)
        }
    }

    /// Read a template from disk.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read.
    pub fn load(path: &Path) -> Result<Self, io::Error> {
        let source = fs::read_to_string(path)?;

        Ok(Self::for_file(path, source))
    }

    /// Substitute `vars` into the template.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed templates, or for legacy templates that
    /// reference a variable that is not provided.
    pub fn render(&self, vars: &BTreeMap<&str, String>) -> Result<String, RenderError> {
        match self {
            Self::Jinja(source) => Ok(render_jinja(source, vars)),
            Self::Legacy(source) => render_legacy(source, vars),
        }
    }
}

fn render_jinja(source: &str, vars: &BTreeMap<&str, String>) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(start) = rest.find("{{") {
        let (before, tail) = rest.split_at(start);

        out.push_str(before);

        let Some(end) = tail.find("}}") else {
            out.push_str(tail);

            return out;
        };

        let name = tail.get(2..end).unwrap_or_default().trim();

        if let Some(value) = vars.get(name) {
            out.push_str(value);
        }

        rest = tail.get(end + 2..).unwrap_or_default();
    }

    out.push_str(rest);

    out
}

fn render_legacy(source: &str, vars: &BTreeMap<&str, String>) -> Result<String, RenderError> {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    let mut offset = 0;

    while let Some(percent) = rest.find('%') {
        let (before, tail) = rest.split_at(percent);

        out.push_str(before);

        let position = offset + percent;

        if let Some(after) = tail.strip_prefix("%%") {
            out.push('%');
            offset = position + 2;
            rest = after;

            continue;
        }

        let Some(named) = tail.strip_prefix("%(") else {
            return Err(RenderError::Directive(position));
        };

        let Some(close) = named.find(")s") else {
            return Err(RenderError::Unterminated(position));
        };

        let name = named.get(..close).unwrap_or_default();

        out.push_str(&legacy_value(name, vars)?);

        let consumed = 2 + close + 2;

        offset = position + consumed;
        rest = tail.get(consumed..).unwrap_or_default();
    }

    out.push_str(rest);

    Ok(out)
}

fn legacy_value(name: &str, vars: &BTreeMap<&str, String>) -> Result<String, RenderError> {
    if let Some(value) = vars.get(name) {
        return Ok(value.clone());
    }

    if let Some(base) = name.strip_suffix("_forhtml")
        && let Some(value) = vars.get(base)
    {
        return Ok(escape_html(value));
    }

    if let Some(base) = name.strip_suffix("_forurl")
        && let Some(value) = vars.get(base)
    {
        return Ok(form_urlencoded::byte_serialize(value.as_bytes()).collect());
    }

    Err(RenderError::UnknownPlaceholder(name.to_string()))
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());

    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }

    escaped
}
