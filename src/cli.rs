use std::path::{Path, PathBuf};

mod burnable;
mod check;
mod clear;
mod init;
mod list;
mod terminal;

use anyhow::Context;
use burnable::Burnable;
use check::Check;
use clap::ArgAction;
use clear::Clear;
use fireproof::{
    Config, DomainStore, Error as FireproofError, FileStore, FireproofDomains, MemoryStore,
    NormalizedDomain,
};
use list::List;
use terminal::Colorize;
use tracing::instrument;

/// Name of the directory holding configuration and the default store.
const STATE_DIR: &str = ".fireproof";

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The directory containing the `.fireproof` state directory
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command
            .unwrap_or_else(|| Command::List(List::default()))
            .run(&self.root)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Initialize a fireproof state directory
    Init,

    /// Fireproof one or more domains
    Add(Add),

    /// Stop fireproofing one or more domains
    Remove(Remove),

    /// Fireproof a domain if it isn't already, otherwise stop fireproofing it
    Toggle(Toggle),

    /// List fireproofed domains (default)
    List(List),

    /// Check whether a host or cookie domain is fireproof
    Check(Check),

    /// Print the hosts whose data would be cleared
    Burnable(Burnable),

    /// Stop fireproofing every domain
    Clear(Clear),
}

impl Command {
    fn run(self, root: &Path) -> anyhow::Result<()> {
        match self {
            Self::Init => init::run(root)?,
            Self::Add(command) => command.run(root)?,
            Self::Remove(command) => command.run(root)?,
            Self::Toggle(command) => command.run(root)?,
            Self::List(command) => command.run(root)?,
            Self::Check(command) => command.run(root)?,
            Self::Burnable(command) => command.run(root)?,
            Self::Clear(command) => command.run(root)?,
        }
        Ok(())
    }
}

fn state_dir(root: &Path) -> PathBuf {
    root.join(STATE_DIR)
}

fn load_config(root: &Path) -> Config {
    let path = state_dir(root).join("config.toml");
    Config::load(&path).unwrap_or_else(|e| {
        tracing::debug!("Failed to load config: {e}");
        Config::default()
    })
}

/// Opens the configured store and loads every fireproofed domain from it.
fn open(root: &Path) -> anyhow::Result<FireproofDomains<Box<dyn DomainStore>>> {
    open_with(&load_config(root), root)
}

/// Opens the store for a command that changes the fireproofed set.
///
/// An ephemeral store starts empty on every run and is dropped when the
/// command exits, so changes to it are refused rather than silently lost.
fn open_for_update(root: &Path) -> anyhow::Result<FireproofDomains<Box<dyn DomainStore>>> {
    let config = load_config(root);
    if config.ephemeral {
        anyhow::bail!(
            "Refusing to modify an ephemeral store: changes would be lost when this command exits"
        );
    }
    open_with(&config, root)
}

fn open_with(
    config: &Config,
    root: &Path,
) -> anyhow::Result<FireproofDomains<Box<dyn DomainStore>>> {
    let store: Box<dyn DomainStore> = if config.ephemeral {
        tracing::debug!("Using ephemeral domain store");
        Box::new(MemoryStore::new())
    } else {
        let path = config.store_path(&state_dir(root));
        tracing::debug!("Using domain store at {}", path.display());
        Box::new(FileStore::new(path))
    };

    if config.fail_open {
        Ok(FireproofDomains::load(store))
    } else {
        FireproofDomains::try_load(store).context("Failed to load fireproof domains")
    }
}

#[derive(Debug, clap::Parser)]
pub struct Add {
    /// The domains to fireproof
    #[arg(num_args = 1.., required = true)]
    domains: Vec<String>,
}

impl Add {
    #[instrument]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        let mut domains = open_for_update(root)?;

        for domain in self.domains {
            match domains.add(&domain) {
                Ok(added) => println!("{}", format!("🔥 Fireproofed {added}").success()),
                Err(FireproofError::Duplicate(e)) => {
                    println!("{}", format!("ℹ️  Already fireproof: {}", e.domain).dim());
                }
                Err(e) => return Err(e).with_context(|| format!("Failed to fireproof {domain}")),
            }
        }

        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Remove {
    /// The domains to stop fireproofing
    #[arg(num_args = 1.., required = true)]
    domains: Vec<String>,
}

impl Remove {
    #[instrument]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        let mut domains = open_for_update(root)?;

        for domain in self.domains {
            match domains.remove(&domain) {
                Ok(_) => println!("{}", format!("Removed {domain}").success()),
                Err(FireproofError::NotFound(_)) => {
                    println!("{}", format!("⚠️  Not fireproof: {domain}").warning());
                }
                Err(e) => return Err(e).with_context(|| format!("Failed to remove {domain}")),
            }
        }

        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Toggle {
    /// The domain to toggle
    domain: String,
}

impl Toggle {
    #[instrument]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        let mut domains = open_for_update(root)?;

        let (domain, now_fireproof) = self.apply(&mut domains)?;

        if now_fireproof {
            println!("{}", format!("🔥 Fireproofed {domain}").success());
        } else {
            println!("{}", format!("Removed {domain}").dim());
        }

        Ok(())
    }

    /// Toggles the domain, returning its normalized form and whether it is
    /// now fireproof.
    fn apply<S: DomainStore>(
        &self,
        domains: &mut FireproofDomains<S>,
    ) -> anyhow::Result<(NormalizedDomain, bool)> {
        let context = || format!("Failed to toggle {}", self.domain);
        let domain = NormalizedDomain::new(&self.domain).with_context(context)?;
        let now_fireproof = domains.toggle(&self.domain).with_context(context)?;
        Ok((domain, now_fireproof))
    }
}
