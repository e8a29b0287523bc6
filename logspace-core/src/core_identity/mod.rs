//! Identity/keyring collaborator
//!
//! Per-space symmetric key material and the identity service contract spaces
//! depend on for consent, sub-DIDs and identity-proof signing.

mod keyring;
mod provider;

pub use keyring::{SpaceKeyring, SymCiphertext, NONCE_LEN};
pub use provider::{verify_jwt, IdentityProvider, LocalIdentity};
