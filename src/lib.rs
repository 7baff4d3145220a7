//! Fireproof domains
//!
//! Tracks the set of website domains whose data is exempt from browsing-data
//! clearing, and answers whether a host, cookie domain or URL is covered.

pub mod domain;
pub use domain::{
    AddError, Config, DomainIndex, DomainNotFoundError, DuplicateDomainError, InvalidDomainError,
    NormalizedDomain,
};

/// Persistent storage of fireproofed domains.
pub mod storage;
pub use storage::{DomainStore, FileStore, MemoryStore, RecordId, StoreError, StoredDomain};

pub mod fireproof;
pub use fireproof::{Change, Error, FireproofDomains};
