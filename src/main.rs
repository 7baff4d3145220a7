//! Command-line interface for managing fireproofed domains.

use clap::Parser;

mod cli;
use cli::Cli;

fn main() -> anyhow::Result<()> {
    Cli::parse().run()
}
