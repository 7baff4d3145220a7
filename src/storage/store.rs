use std::{fmt, io, path::PathBuf, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::NormalizedDomain;

/// Opaque identifier of a persisted domain record.
///
/// Returned by [`DomainStore::add_record`] and kept by the index so that the
/// exact record can be deleted later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Generates a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn uuid(self) -> Uuid {
        self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for RecordId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fireproofed domain as persisted by a [`DomainStore`].
///
/// The domain is kept as the raw string that was written. It is normalized
/// again when replayed into the index, so records written by older versions
/// with different normalization rules are still accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDomain {
    /// Identifier of the record.
    pub id: RecordId,
    /// The stored domain string.
    pub domain: String,
    /// When the record was written.
    pub created: DateTime<Utc>,
}

impl StoredDomain {
    /// Creates a new record for a domain, with a fresh id and the current
    /// time.
    #[must_use]
    pub fn new(domain: &NormalizedDomain) -> Self {
        Self {
            id: RecordId::new(),
            domain: domain.to_string(),
            created: Utc::now(),
        }
    }
}

/// Errors raised by a [`DomainStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be read or written.
    #[error("failed to access domain store at {path}: {source}")]
    Io {
        /// Path of the store document.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The store document is not valid.
    #[error("failed to parse domain store at {path}: {source}")]
    Parse {
        /// Path of the store document.
        path: PathBuf,
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// The records could not be serialized.
    #[error("failed to serialize domain store: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// No record exists with the given id.
    #[error("no domain record with id {0}")]
    RecordNotFound(RecordId),
}

/// Durable storage for fireproofed domains.
///
/// Implementations own the persisted records; the in-memory
/// [`DomainIndex`](crate::DomainIndex) is rebuilt from [`load_all`] at
/// startup and refers back to records by [`RecordId`].
///
/// [`load_all`]: DomainStore::load_all
pub trait DomainStore {
    /// Returns every persisted record.
    ///
    /// # Errors
    ///
    /// Returns an error if the records cannot be read.
    fn load_all(&self) -> Result<Vec<StoredDomain>, StoreError>;

    /// Persists a new record for `domain` and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn add_record(&mut self, domain: &NormalizedDomain) -> Result<RecordId, StoreError>;

    /// Deletes the record with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RecordNotFound`] if no such record exists, or an
    /// error if the store cannot be written.
    fn remove_record(&mut self, id: RecordId) -> Result<(), StoreError>;

    /// Deletes every record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn clear(&mut self) -> Result<(), StoreError>;
}

impl<S: DomainStore + ?Sized> DomainStore for Box<S> {
    fn load_all(&self) -> Result<Vec<StoredDomain>, StoreError> {
        (**self).load_all()
    }

    fn add_record(&mut self, domain: &NormalizedDomain) -> Result<RecordId, StoreError> {
        (**self).add_record(domain)
    }

    fn remove_record(&mut self, id: RecordId) -> Result<(), StoreError> {
        (**self).remove_record(id)
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        (**self).clear()
    }
}
