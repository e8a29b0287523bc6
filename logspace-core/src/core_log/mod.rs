//! Replicated log collaborator
//!
//! Contracts consumed from the external append-only log engine, plus an
//! in-process engine for tests and embedding.

mod entry;
mod memory;

pub use entry::{
    EntryMetadata, LogEntry, LogStore, PutOptions, RegistryStore, StoreAddress,
};
pub use memory::{MemoryLogStore, MemoryRegistry};
