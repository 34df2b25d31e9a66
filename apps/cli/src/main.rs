//! nbtoc CLI: table of contents for Jupyter notebooks.
//!
//! Reads a notebook (given explicitly or detected from the running Jupyter
//! session) and prints a nested Markdown link list of its headings.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
