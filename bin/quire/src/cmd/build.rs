//! Build command - renders the content tree

use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use color_eyre::eyre::{Result, WrapErr};
use quire_core::{Config, FailurePolicy, UndefinedPolicy};
use quire_generator::{Builder, CancelFlag};

/// Command-line overrides applied on top of the configuration file.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Output directory override.
    pub output: Option<PathBuf>,
    /// Worker count override.
    pub jobs: Option<usize>,
    /// Collect every failure instead of stopping at the first.
    pub keep_going: bool,
    /// Treat undefined variables as errors.
    pub strict: bool,
    /// Deadline for the whole build.
    pub timeout: Option<Duration>,
}

/// Load configuration and apply CLI overrides.
pub fn load_config(config_path: &Path, options: &BuildOptions) -> Result<Config> {
    let mut config =
        Config::load_with_env(config_path).wrap_err("Failed to load configuration")?;

    if let Some(output) = &options.output {
        tracing::info!(output = %output.display(), "Overriding output directory from CLI");
        config.directory.output = output.to_string_lossy().to_string();
    }

    if let Some(jobs) = options.jobs {
        config.render.jobs = jobs;
    }

    if options.keep_going {
        config.render.failure = FailurePolicy::CollectAll;
    }

    if options.strict {
        config.render.undefined = UndefinedPolicy::Strict;
    }

    config
        .validate()
        .wrap_err("Invalid command-line overrides")?;

    Ok(config)
}

/// Run the build command.
///
/// Ctrl-C stops the build after the file currently rendering.
pub async fn run(config_path: &Path, options: BuildOptions) -> Result<()> {
    let start = Instant::now();
    tracing::info!(?config_path, ?options, "Starting build");

    let config = load_config(config_path, &options)?;
    tracing::debug!(?config, "Loaded configuration");

    let output = config.output_dir();
    let cancel = CancelFlag::new();
    let mut builder = Builder::from_config(config).with_cancel(cancel.clone());
    if let Some(timeout) = options.timeout {
        builder = builder.with_deadline(timeout);
    }

    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current file");
            cancel.cancel();
        }
    });

    let report = tokio::task::spawn_blocking(move || builder.build())
        .await
        .wrap_err("Build task failed")?;
    interrupt.abort();

    let duration = start.elapsed();

    if !report.is_success() {
        println!();
        println!("  Build failed ({} error(s)):", report.failures.len());
        for failure in &report.failures {
            println!("  ✗ {failure}");
        }
        println!();

        let count = report.failures.len();
        return report
            .into_result()
            .map(|_| ())
            .wrap_err(format!("Build failed with {count} error(s)"));
    }

    // Print build statistics
    println!();
    println!("  Build completed successfully!");
    println!();
    println!("  Files:      {}", report.stats.pages);
    println!("  Assets:     {}", report.stats.assets);
    println!();
    println!("  Duration:   {:.2}s", duration.as_secs_f64());
    println!("  Output:     {}", output.display());
    println!();

    tracing::info!(stats = ?report.stats, ?duration, "Build completed successfully");

    Ok(())
}
