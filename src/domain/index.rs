//! In-memory index of fireproofed domains.
//!
//! The [`DomainIndex`] knows nothing about how domains are persisted. It maps
//! each explicitly fireproofed domain to the [`RecordId`] of its stored record
//! and keeps a derived reverse index from every superdomain to the
//! fireproofed domains beneath it, so that cookie-scope checks (where the
//! cookie's domain is often a parent of the fireproofed host) are a single
//! hash lookup.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::instrument;

use crate::{
    domain::normalized::{InvalidDomainError, NormalizedDomain},
    storage::RecordId,
};

/// An index of fireproofed domains and their superdomains.
///
/// Two maps are kept in lock-step:
/// - `domains_to_ids`: the explicit set of fireproofed domains, keyed by
///   normalized domain, with the id of the persisted record.
/// - `superdomains_to_subdomains`: for every fireproofed domain with more than
///   two labels, each of its superdomains maps to the set of fireproofed
///   domains below it. Empty sets are never stored.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DomainIndex {
    domains_to_ids: HashMap<NormalizedDomain, RecordId>,
    superdomains_to_subdomains: HashMap<NormalizedDomain, HashSet<NormalizedDomain>>,
}

/// The domain is already present in the index.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("domain {domain} is already fireproof")]
pub struct DuplicateDomainError {
    /// The normalized domain that was already present.
    pub domain: NormalizedDomain,
    /// The id of the record already associated with the domain.
    pub existing: RecordId,
}

/// The domain is not present in the index.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("domain '{0}' is not fireproof")]
pub struct DomainNotFoundError(pub String);

/// Errors that can occur when adding a domain to the index.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddError {
    /// The input could not be normalized into a domain.
    #[error(transparent)]
    Invalid(#[from] InvalidDomainError),
    /// The domain is already present.
    #[error(transparent)]
    Duplicate(#[from] DuplicateDomainError),
}

impl DomainIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty index with room for `capacity` domains.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            domains_to_ids: HashMap::with_capacity(capacity),
            superdomains_to_subdomains: HashMap::with_capacity(capacity),
        }
    }

    /// Adds a domain with the id of its persisted record.
    ///
    /// Returns the normalized domain that was inserted.
    ///
    /// # Errors
    ///
    /// - [`AddError::Invalid`] if `domain` cannot be normalized
    /// - [`AddError::Duplicate`] if the normalized domain is already present.
    ///   The index is left untouched and the existing id is kept.
    #[instrument(level = "trace", skip(self))]
    pub fn add(&mut self, domain: &str, id: RecordId) -> Result<NormalizedDomain, AddError> {
        let domain = NormalizedDomain::new(domain)?;

        if let Some(&existing) = self.domains_to_ids.get(&domain) {
            return Err(DuplicateDomainError { domain, existing }.into());
        }

        // Validate every key before touching either map.
        let superdomains = domain
            .superdomains()
            .map(NormalizedDomain::new)
            .collect::<Result<Vec<_>, _>>()?;

        for superdomain in superdomains {
            self.superdomains_to_subdomains
                .entry(superdomain)
                .or_default()
                .insert(domain.clone());
        }

        self.domains_to_ids.insert(domain.clone(), id);
        Ok(domain)
    }

    /// Removes a domain, returning the id of its persisted record.
    ///
    /// Superdomain entries that no longer have any fireproofed subdomains are
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`DomainNotFoundError`] if the domain is not present (or cannot
    /// be normalized). The index is not modified.
    #[instrument(level = "trace", skip(self))]
    pub fn remove(&mut self, domain: &str) -> Result<RecordId, DomainNotFoundError> {
        let not_found = || DomainNotFoundError(domain.to_string());

        let normalized = NormalizedDomain::new(domain).map_err(|_| not_found())?;
        let (normalized, id) = self
            .domains_to_ids
            .remove_entry(&normalized)
            .ok_or_else(not_found)?;

        for superdomain in normalized.superdomains() {
            let now_empty = self
                .superdomains_to_subdomains
                .get_mut(superdomain)
                .is_some_and(|subdomains| {
                    subdomains.remove(&normalized);
                    subdomains.is_empty()
                });

            if now_empty {
                self.superdomains_to_subdomains.remove(superdomain);
            }
        }

        Ok(id)
    }

    /// Checks whether a domain is fireproof.
    ///
    /// A domain matches if it was added explicitly. When
    /// `including_superdomains` is set it also matches if it is a superdomain
    /// of any explicitly added domain (`example.com` matches once
    /// `mail.example.com` has been added).
    ///
    /// Input that cannot be normalized never matches.
    #[must_use]
    pub fn contains(&self, domain: &str, including_superdomains: bool) -> bool {
        let Ok(domain) = NormalizedDomain::new(domain) else {
            tracing::debug!("Rejected lookup of invalid domain '{domain}'");
            return false;
        };

        self.domains_to_ids.contains_key(&domain)
            || (including_superdomains && self.superdomains_to_subdomains.contains_key(&domain))
    }

    /// Checks whether a domain is a superdomain of any fireproofed domain.
    #[must_use]
    pub fn contains_superdomain(&self, superdomain: &str) -> bool {
        NormalizedDomain::new(superdomain)
            .is_ok_and(|domain| self.superdomains_to_subdomains.contains_key(&domain))
    }

    /// Returns the record id for an explicitly fireproofed domain.
    #[must_use]
    pub fn id(&self, domain: &str) -> Option<RecordId> {
        let domain = NormalizedDomain::new(domain).ok()?;
        self.domains_to_ids.get(&domain).copied()
    }

    /// Returns the fireproofed domains beneath a superdomain.
    #[must_use]
    pub fn subdomains(&self, superdomain: &str) -> Option<&HashSet<NormalizedDomain>> {
        let superdomain = NormalizedDomain::new(superdomain).ok()?;
        self.superdomains_to_subdomains.get(&superdomain)
    }

    /// Iterates over the explicitly fireproofed domains, in no particular
    /// order.
    pub fn domains(&self) -> impl Iterator<Item = &NormalizedDomain> {
        self.domains_to_ids.keys()
    }

    /// Iterates over `(domain, record id)` pairs, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = (&NormalizedDomain, RecordId)> {
        self.domains_to_ids.iter().map(|(domain, &id)| (domain, id))
    }

    /// The number of explicitly fireproofed domains.
    #[must_use]
    pub fn len(&self) -> usize {
        self.domains_to_ids.len()
    }

    /// Whether no domains are fireproofed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.domains_to_ids.is_empty()
    }

    /// Removes every domain and superdomain entry.
    pub fn clear(&mut self) {
        self.domains_to_ids.clear();
        self.superdomains_to_subdomains.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use test_case::test_case;

    use super::*;

    fn domains(index: &DomainIndex) -> BTreeSet<&str> {
        index.domains().map(NormalizedDomain::as_str).collect()
    }

    #[test]
    fn added_domain_is_contained() {
        let mut index = DomainIndex::new();
        let id = RecordId::new();

        let added = index.add("example.com", id).unwrap();

        assert_eq!(added.as_str(), "example.com");
        assert!(index.contains("example.com", true));
        assert!(index.contains("example.com", false));
        assert_eq!(domains(&index), BTreeSet::from(["example.com"]));
        assert_eq!(index.id("example.com"), Some(id));
    }

    #[test_case("www.example.com"; "www prefix")]
    #[test_case("example.com"; "bare")]
    #[test_case("EXAMPLE.com"; "uppercase")]
    fn duplicate_is_rejected_and_keeps_original_id(duplicate: &str) {
        let mut index = DomainIndex::new();
        let original = RecordId::new();
        index.add("example.com", original).unwrap();

        let error = index.add(duplicate, RecordId::new()).unwrap_err();

        assert_eq!(
            error,
            AddError::Duplicate(DuplicateDomainError {
                domain: NormalizedDomain::new("example.com").unwrap(),
                existing: original,
            })
        );
        assert_eq!(index.id("example.com"), Some(original));
        assert_eq!(domains(&index), BTreeSet::from(["example.com"]));
    }

    #[test]
    fn www_and_bare_domain_share_a_key() {
        let mut with_www = DomainIndex::new();
        let mut without_www = DomainIndex::new();
        let id = RecordId::new();

        let a = with_www.add("www.example.com", id).unwrap();
        let b = without_www.add("example.com", id).unwrap();

        assert_eq!(a, b);
        assert_eq!(with_www, without_www);
    }

    #[test]
    fn invalid_domain_is_rejected() {
        let mut index = DomainIndex::new();
        let error = index.add("a..b", RecordId::new()).unwrap_err();
        assert!(matches!(error, AddError::Invalid(_)));
        assert!(index.is_empty());
    }

    #[test]
    fn subdomain_registers_every_superdomain() {
        let mut index = DomainIndex::new();
        index.add("mail.sub.example.com", RecordId::new()).unwrap();

        assert!(index.contains_superdomain("sub.example.com"));
        assert!(index.contains_superdomain("example.com"));
        assert!(!index.contains_superdomain("com"));
        assert!(index.contains("example.com", true));
        assert!(!index.contains("example.com", false));
        assert!(!index.contains_superdomain("mail.sub.example.com"));
    }

    #[test]
    fn second_level_domain_registers_no_superdomains() {
        let mut index = DomainIndex::new();
        index.add("example.com", RecordId::new()).unwrap();

        assert!(!index.contains_superdomain("com"));
        assert!(index.subdomains("com").is_none());
    }

    #[test]
    fn ip_address_registers_no_superdomains() {
        let mut index = DomainIndex::new();
        index.add("192.168.0.1", RecordId::new()).unwrap();

        assert!(index.contains("192.168.0.1", true));
        assert!(!index.contains("0.1", true));
        assert!(!index.contains("168.0.1", true));

        index.remove("192.168.0.1").unwrap();
        assert_eq!(index, DomainIndex::new());
    }

    #[test]
    fn superdomain_tracks_all_subdomains() {
        let mut index = DomainIndex::new();
        index.add("mail.example.com", RecordId::new()).unwrap();
        index.add("news.example.com", RecordId::new()).unwrap();

        let subdomains: BTreeSet<_> = index
            .subdomains("example.com")
            .unwrap()
            .iter()
            .map(NormalizedDomain::as_str)
            .collect();
        assert_eq!(
            subdomains,
            BTreeSet::from(["mail.example.com", "news.example.com"])
        );
    }

    #[test]
    fn removing_subdomain_returns_its_id() {
        let mut index = DomainIndex::new();
        let id = RecordId::new();
        index.add("mail.example.com", id).unwrap();

        assert_eq!(index.remove("mail.example.com"), Ok(id));
        assert!(!index.contains_superdomain("example.com"));
        assert!(!index.contains("mail.example.com", true));
        assert!(index.is_empty());
    }

    #[test]
    fn superdomain_survives_until_last_subdomain_is_removed() {
        let mut index = DomainIndex::new();
        index.add("mail.example.com", RecordId::new()).unwrap();
        index.add("news.example.com", RecordId::new()).unwrap();

        index.remove("mail.example.com").unwrap();
        assert!(index.contains_superdomain("example.com"));

        index.remove("news.example.com").unwrap();
        assert!(!index.contains_superdomain("example.com"));
        assert_eq!(index, DomainIndex::new());
    }

    #[test]
    fn removing_explicit_parent_keeps_superdomain_entry() {
        let mut index = DomainIndex::new();
        index.add("example.com", RecordId::new()).unwrap();
        index.add("mail.example.com", RecordId::new()).unwrap();

        index.remove("example.com").unwrap();

        assert!(!index.contains("example.com", false));
        assert!(index.contains("example.com", true));
    }

    #[test]
    fn removing_via_www_prefix_finds_the_entry() {
        let mut index = DomainIndex::new();
        let id = RecordId::new();
        index.add("example.com", id).unwrap();

        assert_eq!(index.remove("www.example.com"), Ok(id));
    }

    #[test_case("notpresent.com"; "unknown")]
    #[test_case(""; "invalid")]
    fn removing_unknown_domain_is_not_found(domain: &str) {
        let mut index = DomainIndex::new();
        index.add("mail.example.com", RecordId::new()).unwrap();
        let before = index.clone();

        assert_eq!(
            index.remove(domain),
            Err(DomainNotFoundError(domain.to_string()))
        );
        assert_eq!(index, before);
    }

    #[test]
    fn removing_superdomain_only_entry_is_not_found() {
        let mut index = DomainIndex::new();
        index.add("mail.example.com", RecordId::new()).unwrap();

        assert!(index.remove("example.com").is_err());
        assert!(index.contains_superdomain("example.com"));
    }

    #[test]
    fn lookups_of_invalid_input_do_not_match() {
        let mut index = DomainIndex::new();
        index.add("example.com", RecordId::new()).unwrap();

        assert!(!index.contains("", true));
        assert!(!index.contains_superdomain(" "));
        assert!(index.id("..").is_none());
    }

    #[test]
    fn clear_empties_both_maps() {
        let mut index = DomainIndex::with_capacity(4);
        index.add("mail.example.com", RecordId::new()).unwrap();
        index.add("example.org", RecordId::new()).unwrap();

        index.clear();

        assert!(index.is_empty());
        assert!(!index.contains_superdomain("example.com"));
        assert_eq!(index, DomainIndex::new());
    }

    #[test]
    fn entries_pair_domains_with_ids() {
        let mut index = DomainIndex::new();
        let id = RecordId::new();
        index.add("www.example.com", id).unwrap();

        let entries: Vec<_> = index
            .entries()
            .map(|(domain, id)| (domain.as_str(), id))
            .collect();
        assert_eq!(entries, vec![("example.com", id)]);
        assert_eq!(index.len(), 1);
    }
}
