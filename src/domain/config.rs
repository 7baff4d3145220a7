use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Configuration for a fireproof domains repository.
///
/// This struct holds settings that control where fireproofed domains are
/// persisted and how persistence failures are treated at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Path of the domain store document.
    ///
    /// Relative paths are resolved against the `.fireproof` directory.
    store_file: PathBuf,

    /// Keep fireproofed domains in memory only.
    ///
    /// Nothing is read from or written to the store file. Useful for private
    /// browsing sessions and tests.
    pub ephemeral: bool,

    /// Whether a store that cannot be read is treated as empty.
    ///
    /// When `true` (default): startup continues with no fireproofed domains.
    /// When `false`: the load error is reported to the caller.
    pub fail_open: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_file: default_store_file(),
            ephemeral: false,
            fail_open: true,
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the configured store file, as written in the configuration.
    #[must_use]
    pub fn store_file(&self) -> &Path {
        &self.store_file
    }

    /// Resolves the store file against a base directory.
    ///
    /// Absolute paths are returned unchanged.
    #[must_use]
    pub fn store_path(&self, base: &Path) -> PathBuf {
        base.join(&self.store_file)
    }

    /// Sets the store file path.
    pub fn set_store_file(&mut self, path: PathBuf) {
        self.store_file = path;
    }
}

fn default_store_file() -> PathBuf {
    PathBuf::from("domains.toml")
}

const fn default_fail_open() -> bool {
    true
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_store_file")]
        store_file: PathBuf,

        #[serde(default)]
        ephemeral: bool,

        #[serde(default = "default_fail_open")]
        fail_open: bool,
    },
}

impl From<Versions> for super::Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                store_file,
                ephemeral,
                fail_open,
            } => Self {
                store_file,
                ephemeral,
                fail_open,
            },
        }
    }
}

impl From<super::Config> for Versions {
    fn from(config: super::Config) -> Self {
        Self::V1 {
            store_file: config.store_file,
            ephemeral: config.ephemeral,
            fail_open: config.fail_open,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\nstore_file = \"custom.toml\"\nephemeral = true\nfail_open = false\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.store_file(), Path::new("custom.toml"));
        assert!(config.ephemeral);
        assert!(!config.fail_open);
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(error.starts_with("Failed to read config file:"));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nephemeral = \"sometimes\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.starts_with("Failed to parse config file:"));
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        let mut config = Config::default();
        config.set_store_file(PathBuf::from("elsewhere/domains.toml"));
        config.fail_open = false;

        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn relative_store_file_resolves_against_base() {
        let config = Config::default();
        assert_eq!(
            config.store_path(Path::new("/data/.fireproof")),
            PathBuf::from("/data/.fireproof/domains.toml")
        );
    }
}
