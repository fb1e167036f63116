//! contractgen CLI — international service agreement generator.
//!
//! Renders DOCX and PDF agreements from a request, stores a record of every
//! generation, and serves the stored documents back.

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
