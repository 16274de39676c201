//! llmsforge CLI: turns a documentation tree into LLM-ready artifacts.
//!
//! Resolves variables and snippet includes, then emits per-page files,
//! category bundles, a full-corpus JSONL file, `llms.txt`, and a site index.

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
