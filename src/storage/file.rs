//! A filesystem backed store of fireproofed domains
//!
//! The [`FileStore`] keeps every record in a single TOML document. Each
//! mutation rewrites the document through a temporary sibling file that is
//! then renamed into place, so an interrupted write never leaves a truncated
//! store behind.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    domain::NormalizedDomain,
    storage::{DomainStore, RecordId, StoreError, StoredDomain},
};

/// A TOML-file backed [`DomainStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Opens a store at the given path.
    ///
    /// The file does not need to exist; a missing file is an empty store and
    /// is created on the first write.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The path of the store document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Vec<StoredDomain>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No domain store at {}", self.path.display());
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let document: Document = toml::from_str(&content).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;

        Ok(document.into_records())
    }

    fn write(&self, records: Vec<StoredDomain>) -> Result<(), StoreError> {
        let io_error = |source: io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        let content = toml::to_string_pretty(&Document::from_records(records))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let tmp_path = self.path.with_extension("toml.tmp");
        fs::write(&tmp_path, content).map_err(io_error)?;
        fs::rename(&tmp_path, &self.path).map_err(io_error)
    }
}

impl DomainStore for FileStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn load_all(&self) -> Result<Vec<StoredDomain>, StoreError> {
        self.read()
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn add_record(&mut self, domain: &NormalizedDomain) -> Result<RecordId, StoreError> {
        let mut records = self.read()?;
        let record = StoredDomain::new(domain);
        let id = record.id;
        records.push(record);
        self.write(records)?;
        Ok(id)
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn remove_record(&mut self, id: RecordId) -> Result<(), StoreError> {
        let mut records = self.read()?;
        let before = records.len();
        records.retain(|record| record.id != id);
        if records.len() == before {
            return Err(StoreError::RecordNotFound(id));
        }
        self.write(records)
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn clear(&mut self) -> Result<(), StoreError> {
        self.write(Vec::new())
    }
}

/// The serialized versions of the store document.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Document {
    #[serde(rename = "1")]
    V1 {
        #[serde(default)]
        domains: Vec<StoredDomain>,
    },
}

impl Document {
    const fn from_records(domains: Vec<StoredDomain>) -> Self {
        Self::V1 { domains }
    }

    fn into_records(self) -> Vec<StoredDomain> {
        match self {
            Self::V1 { domains } => domains,
        }
    }
}
