//! logspace-core
//!
//! Per-identity, per-application storage namespaces ("spaces") projected over
//! a replicated, append-only, content-addressed log. Each space exposes two
//! key-value views of the same log: a plaintext public view and an encrypted
//! private view, plus a lightweight registry of subscribed conversation
//! threads encoded as specially-prefixed public keys.
//!
//! The replicated log engine and the identity/keyring service are external
//! collaborators; this crate defines their contracts in [`core_log`] and
//! [`core_identity`] and ships in-process implementations suitable for tests
//! and embedding.

pub mod config;
pub mod core_identity;
pub mod core_log;
pub mod core_space;
pub mod core_thread;
pub mod logging;

pub use config::SpaceConfig;
pub use core_space::{Space, SpaceError, SpaceOptions, SpaceResult};
pub use logging::{init_logging, LogLevel};
