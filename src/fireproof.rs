//! The caller-facing fireproof domains manager.
//!
//! [`FireproofDomains`] couples a [`DomainIndex`] with a [`DomainStore`]. It
//! is built once when the application is composed and handed by reference to
//! whatever needs to ask "should this site's data survive a clear?".
//!
//! Every mutation is persisted first; the in-memory index only changes once
//! the store has accepted the write. A store failure therefore leaves the
//! index exactly as it was.
//!
//! Observers that need to refresh when the set changes call
//! [`FireproofDomains::subscribe`] and receive a [`Change`] for every
//! successful mutation.

use std::sync::mpsc;

use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::{
    domain::{
        AddError, DomainIndex, DomainNotFoundError, DuplicateDomainError, InvalidDomainError,
        NormalizedDomain,
    },
    storage::{DomainStore, RecordId, StoreError, StoredDomain},
};

/// Errors returned by [`FireproofDomains`] mutations.
#[derive(Debug, Error)]
pub enum Error {
    /// The input could not be normalized into a domain.
    #[error(transparent)]
    Invalid(#[from] InvalidDomainError),

    /// The domain is already fireproof.
    #[error(transparent)]
    Duplicate(#[from] DuplicateDomainError),

    /// The domain is not fireproof.
    #[error(transparent)]
    NotFound(#[from] DomainNotFoundError),

    /// The persistent store rejected the change.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AddError> for Error {
    fn from(error: AddError) -> Self {
        match error {
            AddError::Invalid(e) => Self::Invalid(e),
            AddError::Duplicate(e) => Self::Duplicate(e),
        }
    }
}

/// A successful change to the set of fireproofed domains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// The domain was fireproofed.
    Added(NormalizedDomain),
    /// The domain is no longer fireproof.
    Removed(NormalizedDomain),
    /// Every domain was removed.
    Cleared,
}

/// The set of fireproofed domains, backed by a persistent store.
#[derive(Debug)]
pub struct FireproofDomains<S> {
    index: DomainIndex,
    store: S,
    subscribers: Vec<mpsc::Sender<Change>>,
}

impl<S: DomainStore> FireproofDomains<S> {
    /// Loads all persisted domains from the store.
    ///
    /// If the store cannot be read, this fails open: the manager starts with
    /// no fireproofed domains and the error is logged. Use [`try_load`] to
    /// handle the error instead.
    ///
    /// [`try_load`]: FireproofDomains::try_load
    #[must_use]
    pub fn load(store: S) -> Self {
        let records = store.load_all().unwrap_or_else(|e| {
            tracing::warn!("Failed to load fireproof domains, starting empty: {e}");
            Vec::new()
        });
        Self::replay(store, records)
    }

    /// Loads all persisted domains from the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn try_load(store: S) -> Result<Self, StoreError> {
        let records = store.load_all()?;
        Ok(Self::replay(store, records))
    }

    /// Rebuilds the index from persisted records.
    ///
    /// Invalid records are skipped. A record that duplicates an earlier one
    /// is deleted from the store, so the store converges on one record per
    /// domain.
    fn replay(mut store: S, records: Vec<StoredDomain>) -> Self {
        let mut index = DomainIndex::with_capacity(records.len());
        let mut redundant = Vec::new();

        for record in records {
            match index.add(&record.domain, record.id) {
                Ok(_) => {}
                Err(AddError::Invalid(e)) => {
                    tracing::warn!("Skipping stored record {}: {e}", record.id);
                }
                Err(AddError::Duplicate(e)) => {
                    tracing::debug!("Stored record {} duplicates {}", record.id, e.existing);
                    redundant.push(record.id);
                }
            }
        }

        for id in redundant {
            if let Err(e) = store.remove_record(id) {
                tracing::warn!("Failed to prune duplicate record {id}: {e}");
            }
        }

        tracing::debug!("Loaded {} fireproof domains", index.len());
        Self {
            index,
            store,
            subscribers: Vec::new(),
        }
    }

    /// Fireproofs a domain.
    ///
    /// Returns the normalized domain that was stored.
    ///
    /// # Errors
    ///
    /// - [`Error::Invalid`] if the domain cannot be normalized
    /// - [`Error::Duplicate`] if the domain is already fireproof
    /// - [`Error::Store`] if the record cannot be persisted
    #[instrument(skip(self))]
    pub fn add(&mut self, domain: &str) -> Result<NormalizedDomain, Error> {
        let normalized = NormalizedDomain::new(domain)?;
        if let Some(existing) = self.index.id(domain) {
            return Err(DuplicateDomainError {
                domain: normalized,
                existing,
            }
            .into());
        }

        let id = self.store.add_record(&normalized)?;
        let added = self.index.add(domain, id)?;

        tracing::info!("Fireproofed {added}");
        self.notify(&Change::Added(added.clone()));
        Ok(added)
    }

    /// Removes a domain from the fireproof set.
    ///
    /// Returns the id of the deleted record.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the domain is not fireproof
    /// - [`Error::Store`] if the record cannot be deleted
    #[instrument(skip(self))]
    pub fn remove(&mut self, domain: &str) -> Result<RecordId, Error> {
        let not_found = || DomainNotFoundError(domain.to_string());
        let normalized = NormalizedDomain::new(domain).map_err(|_| not_found())?;
        let id = self.index.id(domain).ok_or_else(not_found)?;

        self.store.remove_record(id)?;
        let removed = self.index.remove(domain)?;

        tracing::info!("Removed fireproofing for {normalized}");
        self.notify(&Change::Removed(normalized));
        Ok(removed)
    }

    /// Adds the domain if it is not fireproof, removes it otherwise.
    ///
    /// Returns whether the domain is fireproof afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the domain cannot be normalized or the store
    /// rejects the change.
    pub fn toggle(&mut self, domain: &str) -> Result<bool, Error> {
        if self.index.contains(domain, false) {
            self.remove(domain)?;
            Ok(false)
        } else {
            self.add(domain)?;
            Ok(true)
        }
    }

    /// Removes every fireproofed domain.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be cleared. The in-memory set is
    /// left unchanged in that case.
    #[instrument(skip(self))]
    pub fn clear_all(&mut self) -> Result<(), Error> {
        self.store.clear()?;
        self.index.clear();
        tracing::info!("Cleared all fireproof domains");
        self.notify(&Change::Cleared);
        Ok(())
    }

    /// Registers an observer of changes to the fireproofed set.
    ///
    /// Each successful [`add`], [`remove`], [`toggle`] or [`clear_all`]
    /// sends one [`Change`]. Failed mutations send nothing. Dropping the
    /// receiver unsubscribes.
    ///
    /// [`add`]: FireproofDomains::add
    /// [`remove`]: FireproofDomains::remove
    /// [`toggle`]: FireproofDomains::toggle
    /// [`clear_all`]: FireproofDomains::clear_all
    #[must_use = "dropping the receiver unsubscribes immediately"]
    pub fn subscribe(&mut self) -> mpsc::Receiver<Change> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    fn notify(&mut self, change: &Change) {
        self.subscribers.retain(|tx| tx.send(change.clone()).is_ok());
        tracing::trace!("Notified {} subscribers of {change:?}", self.subscribers.len());
    }
}

impl<S> FireproofDomains<S> {
    /// Whether a host is fireproof.
    ///
    /// Matches explicitly fireproofed domains and superdomains of them.
    #[must_use]
    pub fn is_fireproof(&self, domain: &str) -> bool {
        self.index.contains(domain, true)
    }

    /// Whether a cookie with the given `Domain` attribute is fireproof.
    ///
    /// A leading `.` (the legacy marker for domain cookies) is ignored.
    #[must_use]
    pub fn is_fireproof_cookie_domain(&self, cookie_domain: &str) -> bool {
        let domain = cookie_domain.strip_prefix('.').unwrap_or(cookie_domain);
        self.index.contains(domain, true)
    }

    /// Whether the host of a URL is fireproof.
    ///
    /// URLs without a host (`about:blank`, `data:` URLs) are never fireproof.
    #[must_use]
    pub fn is_url_fireproof(&self, url: &Url) -> bool {
        url.host_str().is_some_and(|host| self.is_fireproof(host))
    }

    /// Filters hosts down to those whose data may be cleared.
    #[must_use]
    pub fn burnable<'a, I>(&self, hosts: I) -> Vec<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        hosts
            .into_iter()
            .filter(|host| !self.is_fireproof(host))
            .collect()
    }

    /// The explicitly fireproofed domains, sorted.
    #[must_use]
    pub fn domains(&self) -> Vec<NormalizedDomain> {
        let mut domains: Vec<_> = self.index.domains().cloned().collect();
        domains.sort();
        domains
    }

    /// The underlying index.
    #[must_use]
    pub const fn index(&self) -> &DomainIndex {
        &self.index
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the manager, returning the store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }
}
