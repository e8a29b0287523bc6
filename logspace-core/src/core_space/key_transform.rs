//! Logical-to-physical key derivation
//!
//! Both views share one physical key space in the underlying log,
//! partitioned by reserved prefixes. The public mapping is reversible by
//! stripping the prefix; the private mapping is a salted one-way hash, so the
//! logical key can only be recovered from the decrypted envelope.

use super::errors::{SpaceError, SpaceResult};
use sha2::{Digest, Sha256};

/// Physical prefix of public-view entries
pub const PUBLIC_PREFIX: &str = "pub_";

/// Physical prefix of private-view entries
pub const PRIVATE_PREFIX: &str = "priv_";

fn ensure_key(logical: &str) -> SpaceResult<()> {
    if logical.is_empty() {
        return Err(SpaceError::InvalidArgument("key is undefined".to_string()));
    }
    Ok(())
}

/// Physical key of a public-view entry
pub fn public_key(logical: &str) -> SpaceResult<String> {
    ensure_key(logical)?;
    Ok(format!("{}{}", PUBLIC_PREFIX, logical))
}

/// Logical key of a public physical key, `None` when the key is not public
pub fn public_logical_key(physical: &str) -> Option<&str> {
    physical.strip_prefix(PUBLIC_PREFIX)
}

/// Physical key of a private-view entry: `priv_` + hex(SHA-256(salt || key))
pub fn private_key(salt: &[u8], logical: &str) -> SpaceResult<String> {
    ensure_key(logical)?;
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(logical.as_bytes());
    Ok(format!("{}{}", PRIVATE_PREFIX, hex::encode(hasher.finalize())))
}

/// Whether a physical key belongs to the private view
pub fn is_private_key(physical: &str) -> bool {
    physical.starts_with(PRIVATE_PREFIX)
}
