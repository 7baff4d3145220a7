use std::path::Path;

use clap::Parser;
use tracing::instrument;

use super::{open_for_update, terminal::Colorize};

/// Command arguments for `fireproof clear`.
#[derive(Debug, Parser)]
pub struct Clear {
    /// Confirm that every fireproofed domain should be removed
    #[arg(long)]
    yes: bool,
}

impl Clear {
    #[instrument]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        if !self.yes {
            anyhow::bail!("Refusing to clear fireproof domains without --yes");
        }

        let mut fireproof = open_for_update(root)?;
        let count = fireproof.index().len();
        fireproof.clear_all()?;

        println!(
            "{}",
            format!("Cleared {count} fireproof domain(s)").success()
        );
        Ok(())
    }
}
