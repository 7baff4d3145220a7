use std::{fs, path::Path};

use tracing::instrument;

use super::{state_dir, terminal::Colorize};

#[instrument]
pub fn run(root: &Path) -> anyhow::Result<()> {
    let dir = state_dir(root);
    if dir.exists() {
        anyhow::bail!(
            "Already initialized (found existing {} directory)",
            dir.display()
        );
    }

    fs::create_dir_all(&dir)
        .map_err(|e| anyhow::anyhow!("Failed to create {}: {e}", dir.display()))?;

    let config = fireproof::Config::default();
    config
        .save(&dir.join("config.toml"))
        .map_err(|e| anyhow::anyhow!("Failed to create config.toml: {e}"))?;

    println!(
        "{}",
        format!("Initialized fireproof domains in {}", dir.display()).success()
    );
    println!("  Created: config.toml");
    println!();
    println!("Next steps:");
    println!("  fireproof add example.com");

    Ok(())
}
