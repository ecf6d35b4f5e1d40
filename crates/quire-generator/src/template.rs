//! Template engine.
//!
//! Wraps a [`minijinja::Environment`] configured once per build. The engine is
//! only ever borrowed immutably: each compiled template owns a private copy of
//! the base environment, so any number of workers can compile and render at
//! the same time without a lock. Templates pulled in by `include` or `extends`
//! are loaded on demand into that private copy.

use std::path::Path;

use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use quire_core::{AutoescapePolicy, UndefinedPolicy};

use crate::context::BuildContext;

/// A template parsed from one source file, ready to render.
#[derive(Debug)]
pub struct CompiledTemplate {
    name: String,
    env: Environment<'static>,
}

impl CompiledTemplate {
    /// Name the template was compiled under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Explicitly constructed template engine shared by every item of a build.
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    base: Environment<'static>,
    undefined: UndefinedPolicy,
    autoescape: AutoescapePolicy,
}

impl TemplateEngine {
    /// Create an engine with the given undefined-variable policy.
    ///
    /// Trailing newlines are kept so output mirrors the source byte for byte
    /// outside template tags. HTML escaping follows the template name's
    /// extension (`.html`, `.htm`, `.xml`) until
    /// [`with_autoescape`](Self::with_autoescape) says otherwise.
    #[must_use]
    pub fn new(undefined: UndefinedPolicy) -> Self {
        let mut base = Environment::new();
        base.set_keep_trailing_newline(true);
        base.set_undefined_behavior(match undefined {
            UndefinedPolicy::Lenient => UndefinedBehavior::Lenient,
            UndefinedPolicy::Strict => UndefinedBehavior::Strict,
        });
        Self {
            base,
            undefined,
            autoescape: AutoescapePolicy::default(),
        }
    }

    /// Choose which templates HTML-escape their output.
    #[must_use]
    pub fn with_autoescape(mut self, policy: AutoescapePolicy) -> Self {
        match policy {
            AutoescapePolicy::ByExtension => self
                .base
                .set_auto_escape_callback(minijinja::default_auto_escape_callback),
            AutoescapePolicy::Always => self.base.set_auto_escape_callback(|_| AutoEscape::Html),
            AutoescapePolicy::Never => self.base.set_auto_escape_callback(|_| AutoEscape::None),
        }
        self.autoescape = policy;
        self
    }

    /// Resolve `include`, `extends` and `import` against files under `root`.
    ///
    /// Names are `/`-separated paths relative to `root`. Names with a segment
    /// starting with `.` never resolve.
    #[must_use]
    pub fn with_template_root(mut self, root: impl AsRef<Path>) -> Self {
        self.base.set_loader(minijinja::path_loader(root.as_ref()));
        self
    }

    /// Undefined-variable policy this engine was built with.
    #[must_use]
    pub fn undefined_policy(&self) -> UndefinedPolicy {
        self.undefined
    }

    /// Autoescape policy this engine was built with.
    #[must_use]
    pub fn autoescape_policy(&self) -> AutoescapePolicy {
        self.autoescape
    }

    /// Parse `source` under `name`.
    ///
    /// Syntax errors carry `name` and the offending line.
    pub fn compile(
        &self,
        name: &str,
        source: String,
    ) -> Result<CompiledTemplate, minijinja::Error> {
        let mut env = self.base.clone();
        env.add_template_owned(name.to_string(), source)?;
        Ok(CompiledTemplate {
            name: name.to_string(),
            env,
        })
    }

    /// Evaluate a compiled template against `context`.
    pub fn render(
        &self,
        template: &CompiledTemplate,
        context: &BuildContext,
    ) -> Result<Vec<u8>, minijinja::Error> {
        let rendered = template.env.get_template(&template.name)?.render(context)?;
        Ok(rendered.into_bytes())
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new(UndefinedPolicy::default())
    }
}
