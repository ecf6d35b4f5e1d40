//! quire Core Library
//!
//! Core types, path mapping, configuration, and error handling for the quire
//! template renderer.

pub mod config;
pub mod content;
pub mod error;

pub use config::{
    AutoescapePolicy, Config, Environment, FailurePolicy, OrderPolicy, UndefinedPolicy,
};
pub use content::{ContentItem, static_output_dir};
pub use error::{CoreError, Result};
