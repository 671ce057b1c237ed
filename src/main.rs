use clap::Parser;

use auxpass::cli::{self, Cli};
use auxpass::init_logging;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    })?;

    tracing::debug!("auxpass {} (built {})", auxpass::VERSION, auxpass::BUILD_DATE);

    cli::run(cli)
}
