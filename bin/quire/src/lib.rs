//! quire CLI Library
//!
//! Command implementations behind the `quire` binary, exposed as a library so
//! they can be driven from integration tests.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (build, check)
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use quire::cmd;
//!
//! # async fn demo() -> color_eyre::eyre::Result<()> {
//! cmd::build::run(Path::new("quire.toml"), cmd::build::BuildOptions::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod cmd;

// Re-export core types for convenience
pub use quire_core::Config;
pub use quire_generator::{BuildReport, BuildStats, Builder};

/// Initialize tracing with the specified verbosity level.
///
/// # Arguments
///
/// * `verbose` - Verbosity level (0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE)
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
