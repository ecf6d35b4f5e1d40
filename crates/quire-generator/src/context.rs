//! Per-item render context.

use std::sync::Arc;

use quire_core::{ContentItem, Environment};
use serde::Serialize;

/// Data a template sees while it renders.
///
/// Serialized into the template as `path`, `dir`, `name`, and `environment`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildContext {
    path: String,
    dir: String,
    name: String,
    environment: Arc<Environment>,
}

impl BuildContext {
    /// Relative path with `/` separators.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Directory part of [`Self::path`], empty at the content root.
    #[must_use]
    pub fn dir(&self) -> &str {
        &self.dir
    }

    /// File name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Environment snapshot shared by every item of the build.
    #[must_use]
    pub fn environment(&self) -> &Environment {
        &self.environment
    }
}

/// Builds a [`BuildContext`] per item from one environment snapshot.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    environment: Arc<Environment>,
}

impl ContextBuilder {
    /// Snapshot `environment`.
    ///
    /// The map is copied here, so later changes to the caller's map do not
    /// reach any context built from this builder.
    #[must_use]
    pub fn new(environment: &Environment) -> Self {
        Self {
            environment: Arc::new(environment.clone()),
        }
    }

    /// Build the context for one item.
    #[must_use]
    pub fn build(&self, item: &ContentItem) -> BuildContext {
        BuildContext {
            path: item.normalized_path(),
            dir: item.directory(),
            name: item.base_name().to_string(),
            environment: Arc::clone(&self.environment),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use serde_json::json;

    use super::*;

    fn item(relative: &str) -> ContentItem {
        ContentItem::new(
            &Path::new("content").join(relative),
            Path::new("content"),
            Path::new("output"),
        )
        .unwrap()
    }

    #[test]
    fn test_context_fields() {
        let env = Environment::from([("name".to_string(), json!("demo"))]);
        let builder = ContextBuilder::new(&env);

        let ctx = builder.build(&item("a/b/c.txt"));

        assert_eq!(ctx.path(), "a/b/c.txt");
        assert_eq!(ctx.dir(), "a/b");
        assert_eq!(ctx.name(), "c.txt");
        assert_eq!(ctx.environment()["name"], json!("demo"));
    }

    #[test]
    fn test_root_file_has_empty_dir() {
        let ctx = ContextBuilder::new(&Environment::new()).build(&item("index.txt"));
        assert_eq!(ctx.path(), "index.txt");
        assert_eq!(ctx.dir(), "");
    }

    #[test]
    fn test_environment_is_snapshot() {
        let mut env = Environment::from([("name".to_string(), json!("before"))]);
        let builder = ContextBuilder::new(&env);

        let first = builder.build(&item("a.txt"));
        env.insert("name".to_string(), json!("after"));
        env.insert("extra".to_string(), json!(1));
        let second = builder.build(&item("b.txt"));

        for ctx in [&first, &second] {
            assert_eq!(ctx.environment()["name"], json!("before"));
            assert!(!ctx.environment().contains_key("extra"));
        }
    }

    #[test]
    fn test_serialized_shape() {
        let env = Environment::from([("site".to_string(), json!({"title": "Docs"}))]);
        let ctx = ContextBuilder::new(&env).build(&item("guide/intro.md"));

        let value = serde_json::to_value(&ctx).unwrap();

        assert_eq!(
            value,
            json!({
                "path": "guide/intro.md",
                "dir": "guide",
                "name": "intro.md",
                "environment": {"site": {"title": "Docs"}}
            })
        );
    }
}
