//! quire Generator Library
//!
//! Render pipeline for quire: discover source files, order them, build a
//! context per file, render through the template engine and write into a
//! mirrored output tree.
//!
//! # Modules
//!
//! - [`discover`] - Content tree traversal
//! - [`order`] - Deterministic processing order
//! - [`context`] - Per-item render context
//! - [`template`] - Template engine wrapper
//! - [`output`] - Atomic output writes
//! - [`assets`] - Static asset copying
//! - [`build`] - Build orchestration

pub mod assets;
pub mod build;
pub mod context;
pub mod discover;
pub mod error;
pub mod order;
pub mod output;
pub mod template;

pub use assets::AssetCopier;
pub use build::{BuildPhase, BuildReport, BuildStats, Builder, CancelFlag, CheckReport};
pub use context::{BuildContext, ContextBuilder};
pub use discover::Discoverer;
pub use error::{BuildError, ErrorKind, Result};
pub use template::{CompiledTemplate, TemplateEngine};
