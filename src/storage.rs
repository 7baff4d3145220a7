pub mod file;
pub mod memory;
mod store;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::{DomainStore, RecordId, StoreError, StoredDomain};
