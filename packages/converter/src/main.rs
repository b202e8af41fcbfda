//! CLI entry point for md2orchestra.

use clap::Parser;
use mdorchestra_converter::cli::{self, Cli};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // WARN by default, DEBUG with --verbose; RUST_LOG wins when set
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli::execute(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
