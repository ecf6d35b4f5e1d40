//! Check command - compile templates without writing output

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr, bail};
use quire_core::Config;
use quire_generator::Builder;

/// Run the check command.
///
/// Loads the configuration, verifies the configured directories, and
/// compiles every template in the content tree.
pub fn run(config_path: &Path) -> Result<()> {
    tracing::info!(?config_path, "Checking configuration and templates");

    println!("Checking configuration...");
    let config = Config::load_with_env(config_path).wrap_err("Failed to load configuration")?;
    println!("  ✓ Configuration valid");

    let mut errors = 0;

    println!("\nChecking directories...");
    if let Some(static_dir) = config.static_dir() {
        if static_dir.is_dir() {
            println!("  ✓ {} exists", static_dir.display());
        } else {
            println!("  ✗ static directory {} does not exist", static_dir.display());
            errors += 1;
        }
    }

    println!("\nChecking templates...");
    let report = Builder::from_config(config).check();
    for failure in &report.failures {
        println!("  ✗ {failure}");
    }
    errors += report.failures.len();
    if report.failures.is_empty() {
        println!("  ✓ {} template(s) compiled", report.checked);
    }

    println!();
    if errors > 0 {
        bail!("Check failed with {errors} error(s)");
    }

    println!("All checks passed!");
    Ok(())
}
