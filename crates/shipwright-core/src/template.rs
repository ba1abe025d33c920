//! Template rendering
//!
//! Templates use `%(name)s` placeholders, matching the format of the
//! generated Apache and WSGI artifacts. `%%` escapes a literal percent
//! sign; any other `%` passes through unchanged.

use crate::confirm::ConfirmationGate;
use crate::error::{CoreError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Placeholder values for one render call. Assembled freshly per call;
/// never cached.
pub type TemplateContext = HashMap<String, String>;

/// Supplies template bodies by name and optional variant.
pub trait TemplateSource {
    fn load(&self, name: &str, variant: Option<&str>) -> Result<String>;
}

/// Built-in templates compiled into the binary.
pub struct EmbeddedTemplates;

const APACHE_VHOST: &str = include_str!("../templates/apache.conf");
const WSGI_DJANGO_1_3: &str = include_str!("../templates/wsgi_django1.3.py");
const WSGI_DJANGO_1_6: &str = include_str!("../templates/wsgi_django1.6.py");

impl TemplateSource for EmbeddedTemplates {
    fn load(&self, name: &str, variant: Option<&str>) -> Result<String> {
        let body = match (name, variant) {
            ("apache.conf", _) => APACHE_VHOST,
            ("wsgi.py", Some("django1.3")) => WSGI_DJANGO_1_3,
            ("wsgi.py", Some("django1.6") | None) => WSGI_DJANGO_1_6,
            _ => {
                return Err(CoreError::MissingTemplate {
                    name: name.to_string(),
                    variant: variant.map(|v| v.to_string()),
                });
            }
        };
        Ok(body.to_string())
    }
}

/// What happened to a confirm-gated render.
#[derive(Debug, PartialEq, Eq)]
pub enum RenderDisposition {
    /// Confirmed and written to the given path.
    Written(PathBuf),
    /// Declined; no filesystem mutation occurred.
    Declined,
}

/// Renders named templates against a context.
pub struct TemplateRenderer {
    source: Box<dyn TemplateSource + Send + Sync>,
}

impl TemplateRenderer {
    pub fn new(source: Box<dyn TemplateSource + Send + Sync>) -> Self {
        Self { source }
    }

    pub fn embedded() -> Self {
        Self::new(Box::new(EmbeddedTemplates))
    }

    /// Load a template and substitute every placeholder from `context`.
    pub fn render(
        &self,
        name: &str,
        variant: Option<&str>,
        context: &TemplateContext,
    ) -> Result<String> {
        let body = self.source.load(name, variant)?;
        render_str(name, &body, context)
    }

    /// Render, ask for confirmation, and write on an affirmative answer.
    ///
    /// The file handle is scoped to the write and released whether the
    /// write succeeds or fails. A declined confirmation touches nothing.
    pub fn render_to_file(
        &self,
        name: &str,
        variant: Option<&str>,
        context: &TemplateContext,
        output: &Path,
        gate: &dyn ConfirmationGate,
    ) -> Result<RenderDisposition> {
        let rendered = self.render(name, variant, context)?;

        let message = format!("Write rendered '{}' to {}?", name, output.display());
        if !gate.confirm(&message, false) {
            info!(template = name, "Render declined, nothing written");
            return Ok(RenderDisposition::Declined);
        }

        {
            let mut file = std::fs::File::create(output)?;
            file.write_all(rendered.as_bytes())?;
        }
        info!(template = name, output = %output.display(), "Rendered template written");
        Ok(RenderDisposition::Written(output.to_path_buf()))
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::embedded()
    }
}

/// Substitute `%(name)s` placeholders in `body` from `context`.
pub fn render_str(template: &str, body: &str, context: &TemplateContext) -> Result<String> {
    // Matches an escaped percent or a placeholder; leaves other percent
    // signs alone.
    let pattern = Regex::new(r"%%|%\((?P<name>[A-Za-z_][A-Za-z0-9_]*)\)s").unwrap();

    let mut result = String::with_capacity(body.len());
    let mut last_end = 0;
    for found in pattern.captures_iter(body) {
        let whole = found.get(0).unwrap();
        result.push_str(&body[last_end..whole.start()]);
        last_end = whole.end();

        match found.name("name") {
            None => result.push('%'),
            Some(name) => {
                let value = context.get(name.as_str()).ok_or_else(|| {
                    CoreError::UnresolvedPlaceholder {
                        template: template.to_string(),
                        name: name.as_str().to_string(),
                    }
                })?;
                result.push_str(value);
            }
        }
    }
    result.push_str(&body[last_end..]);

    debug!(template, placeholders = context.len(), "Rendered template");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::{AssumeYes, NonInteractive};

    fn context(pairs: &[(&str, &str)]) -> TemplateContext {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_substitutes_placeholder() {
        let result = render_str("t", "%(name)s", &context(&[("name", "value")])).unwrap();
        assert_eq!(result, "value");
    }

    #[test]
    fn test_render_mixed_text() {
        let result = render_str(
            "t",
            "ServerName %(host)s\nAlias /media/ %(media)s/",
            &context(&[("host", "beta.example.com"), ("media", "/srv/media")]),
        )
        .unwrap();
        assert_eq!(
            result,
            "ServerName beta.example.com\nAlias /media/ /srv/media/"
        );
    }

    #[test]
    fn test_render_unresolved_placeholder_fails() {
        let err = render_str("t", "%(missing)s", &context(&[])).unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnresolvedPlaceholder { name, .. } if name == "missing"
        ));
    }

    #[test]
    fn test_render_escaped_percent() {
        let result = render_str("t", "100%% of %(x)s", &context(&[("x", "it")])).unwrap();
        assert_eq!(result, "100% of it");
    }

    #[test]
    fn test_render_plain_percent_untouched() {
        let result = render_str("t", "Order allow,deny 50%", &context(&[])).unwrap();
        assert_eq!(result, "Order allow,deny 50%");
    }

    #[test]
    fn test_embedded_wsgi_variants() {
        let renderer = TemplateRenderer::embedded();
        let ctx = context(&[
            ("project", "demo"),
            ("settings", "settings_beta"),
            ("site_packages", "lib/python2.7/site-packages"),
        ]);

        let modern = renderer.render("wsgi.py", Some("django1.6"), &ctx).unwrap();
        assert!(modern.contains("get_wsgi_application"));
        assert!(modern.contains("demo.settings_beta"));

        let legacy = renderer.render("wsgi.py", Some("django1.3"), &ctx).unwrap();
        assert!(legacy.contains("WSGIHandler"));
        assert!(legacy.contains("lib/python2.7/site-packages"));
    }

    #[test]
    fn test_unknown_template_fails() {
        let renderer = TemplateRenderer::embedded();
        let err = renderer.render("nginx.conf", None, &context(&[])).unwrap_err();
        assert!(matches!(err, CoreError::MissingTemplate { .. }));
    }

    #[test]
    fn test_render_to_file_declined_writes_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let output = temp_dir.path().join("wsgi_beta.py");

        let renderer = TemplateRenderer::embedded();
        let ctx = context(&[("project", "demo"), ("settings", "settings_beta")]);
        let disposition = renderer
            .render_to_file("wsgi.py", None, &ctx, &output, &NonInteractive)
            .unwrap();

        assert_eq!(disposition, RenderDisposition::Declined);
        assert!(!output.exists());
    }

    #[test]
    fn test_render_to_file_confirmed_writes() {
        let temp_dir = tempfile::tempdir().unwrap();
        let output = temp_dir.path().join("wsgi_beta.py");

        let renderer = TemplateRenderer::embedded();
        let ctx = context(&[("project", "demo"), ("settings", "settings_beta")]);
        let disposition = renderer
            .render_to_file("wsgi.py", None, &ctx, &output, &AssumeYes)
            .unwrap();

        assert_eq!(disposition, RenderDisposition::Written(output.clone()));
        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.contains("demo.settings_beta"));
    }
}
