//! Build configuration.
//!
//! A `quire.toml` file names the three directory roots, a free-form
//! `[environment]` table exposed to every template, and the render policies.
//! Everything here is read once before a build and never changes during it.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Environment mapping handed to templates as `environment`.
pub type Environment = BTreeMap<String, serde_json::Value>;

/// Main configuration structure for quire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Directory roots.
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Values exposed to templates under `environment`.
    #[serde(default)]
    pub environment: Environment,

    /// Render policies.
    #[serde(default)]
    pub render: RenderConfig,
}

/// Directory roots, relative to the working directory unless absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Root of the template tree.
    #[serde(default = "default_content_dir")]
    pub content: String,

    /// Root of the static asset tree. No copy happens when unset.
    #[serde(default, rename = "static")]
    pub static_dir: Option<String>,

    /// Root of the generated tree.
    #[serde(default = "default_output_dir")]
    pub output: String,
}

/// Processing order of discovered items.
///
/// Rendering never depends on the order; build logs and per-item side
/// effects do. Every variant ends with the normalized path as a final key, so
/// each one is a strict total order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderPolicy {
    /// Fewer path segments first, then normalized path.
    #[default]
    DepthThenPath,
    /// Normalized path only.
    Path,
    /// Fewer path segments first, then base name, then normalized path.
    DepthThenName,
}

/// What a template sees when it looks up a value that does not exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UndefinedPolicy {
    /// Undefined values render as the empty string.
    #[default]
    Lenient,
    /// Undefined values are render errors.
    Strict,
}

/// Which templates HTML-escape their output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AutoescapePolicy {
    /// Escape `.html`, `.htm` and `.xml` templates only.
    #[default]
    ByExtension,
    /// Escape every template.
    Always,
    /// Never escape.
    Never,
}

/// How the build reacts to a failing item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop at the first failure.
    #[default]
    FailStop,
    /// Attempt every item and report every failure.
    CollectAll,
}

/// Render settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Processing order.
    #[serde(default)]
    pub order: OrderPolicy,

    /// Undefined variable handling.
    #[serde(default)]
    pub undefined: UndefinedPolicy,

    /// HTML escaping of rendered values.
    #[serde(default)]
    pub autoescape: AutoescapePolicy,

    /// Failure handling.
    #[serde(default)]
    pub failure: FailurePolicy,

    /// Number of render workers. `1` renders sequentially.
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Remove the output root before building.
    #[serde(default)]
    pub clean: bool,
}

fn default_content_dir() -> String {
    "content".to_string()
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_jobs() -> usize {
    1
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            content: default_content_dir(),
            static_dir: None,
            output: default_output_dir(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            order: OrderPolicy::default(),
            undefined: UndefinedPolicy::default(),
            autoescape: AutoescapePolicy::default(),
            failure: FailurePolicy::default(),
            jobs: default_jobs(),
            clean: false,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::parse(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        Ok(config)
    }

    /// Parse and validate configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file, overlaid with `QUIRE__SECTION__KEY`
    /// environment variables.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        Self::load_with_env_source(path, None)
    }

    fn load_with_env_source(
        path: &Path,
        vars: Option<std::collections::HashMap<String, String>>,
    ) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(
                config::Environment::with_prefix("QUIRE")
                    .separator("__")
                    .try_parsing(true)
                    .source(vars),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.directory.content.is_empty() {
            return Err(CoreError::config("directory.content cannot be empty"));
        }

        if self.directory.output.is_empty() {
            return Err(CoreError::config("directory.output cannot be empty"));
        }

        if self.directory.content == self.directory.output {
            return Err(CoreError::config(
                "directory.output must differ from directory.content",
            ));
        }

        if self.render.jobs == 0 {
            return Err(CoreError::config("render.jobs must be at least 1"));
        }

        if self.directory.static_dir.as_deref() == Some("") {
            tracing::warn!("directory.static is empty, static assets will not be copied");
        }

        Ok(())
    }

    /// Content root as a path.
    #[must_use]
    pub fn content_dir(&self) -> PathBuf {
        PathBuf::from(&self.directory.content)
    }

    /// Output root as a path.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.directory.output)
    }

    /// Static root as a path, if one is configured.
    #[must_use]
    pub fn static_dir(&self) -> Option<PathBuf> {
        self.directory
            .static_dir
            .as_deref()
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
    }
}
