use std::path::Path;

use clap::Parser;
use tracing::instrument;
use url::Url;

use super::{open, terminal::Colorize};

/// Command arguments for `fireproof check`.
#[derive(Debug, Parser)]
pub struct Check {
    /// A host name, cookie domain or URL
    target: String,

    /// Treat the target as a cookie `Domain` attribute (a leading `.` is
    /// ignored)
    #[arg(long, conflicts_with = "url")]
    cookie: bool,

    /// Treat the target as a URL and check its host
    #[arg(long)]
    url: bool,

    /// Only match explicitly fireproofed domains, not their superdomains
    #[arg(long, conflicts_with_all = ["cookie", "url"])]
    exact: bool,
}

impl Check {
    #[instrument]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let fireproof = open(root)?;

        let is_fireproof = if self.cookie {
            fireproof.is_fireproof_cookie_domain(&self.target)
        } else if self.url {
            let url = Url::parse(&self.target)
                .map_err(|e| anyhow::anyhow!("Invalid URL '{}': {e}", self.target))?;
            fireproof.is_url_fireproof(&url)
        } else if self.exact {
            fireproof.index().contains(&self.target, false)
        } else {
            fireproof.is_fireproof(&self.target)
        };

        if is_fireproof {
            println!("{}", format!("🔥 {} is fireproof", self.target).success());
        } else {
            println!("{}", format!("{} is not fireproof", self.target).dim());
        }

        Ok(())
    }
}
