use std::path::Path;

use clap::Parser;
use tracing::instrument;

use super::open;

/// Command arguments for `fireproof burnable`.
#[derive(Debug, Parser)]
pub struct Burnable {
    /// Hosts to filter
    #[arg(num_args = 1.., required = true)]
    hosts: Vec<String>,
}

impl Burnable {
    #[instrument]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let fireproof = open(root)?;

        for host in fireproof.burnable(self.hosts.iter().map(String::as_str)) {
            println!("{host}");
        }

        Ok(())
    }
}
