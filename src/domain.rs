//! Domain models for fireproofing.
//!
//! This module contains the core domain types: normalized domain names, the
//! in-memory containment index and configuration.

mod config;
pub use config::Config;

/// In-memory index of fireproofed domains and their superdomains.
pub mod index;
pub use index::{AddError, DomainIndex, DomainNotFoundError, DuplicateDomainError};

/// Normalized domain names.
pub mod normalized;
pub use normalized::{InvalidDomainError, NormalizedDomain};
