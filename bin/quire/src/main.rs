//! quire CLI
//!
//! Renders a content tree of templates into a mirrored output tree.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use clap::Parser;
use color_eyre::eyre::Result;

/// Command-line interface for quire.
#[derive(Parser)]
#[command(
    name = "quire",
    version,
    about = "Render a tree of templates into a mirrored output tree"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "quire.toml")]
    config: std::path::PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Render every template and copy static assets
    Build {
        /// Override the output directory
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
        /// Number of render workers
        #[arg(short, long)]
        jobs: Option<usize>,
        /// Attempt every file and report all failures
        #[arg(long)]
        keep_going: bool,
        /// Treat undefined template variables as errors
        #[arg(long)]
        strict: bool,
        /// Abort the build after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Compile every template without writing output
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    quire::init_tracing(cli.verbose);

    match cli.command {
        Commands::Build {
            output,
            jobs,
            keep_going,
            strict,
            timeout,
        } => {
            let options = quire::cmd::build::BuildOptions {
                output,
                jobs,
                keep_going,
                strict,
                timeout: timeout.map(std::time::Duration::from_secs),
            };
            quire::cmd::build::run(&cli.config, options).await?;
        }
        Commands::Check => {
            quire::cmd::check::run(&cli.config)?;
        }
    }

    Ok(())
}
