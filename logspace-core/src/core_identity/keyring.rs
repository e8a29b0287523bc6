//! Per-space key material
//!
//! Each space gets one symmetric key and one database salt, derived from the
//! identity's master seed with the space name as the derivation context:
//! deterministic per space, unlinkable across spaces, not reversible to the
//! seed. Encryption is AES-256-GCM with a fresh random 96-bit nonce per entry.

use crate::core_space::errors::{SpaceError, SpaceResult};
use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroize;

/// Nonce length of AES-256-GCM
pub const NONCE_LEN: usize = 12;

const DERIVE_DOMAIN: &[u8] = b"logspace-keyring-v1";

/// Ciphertext plus the nonce it was sealed with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymCiphertext {
    pub ciphertext: Vec<u8>,
    pub nonce: [u8; NONCE_LEN],
}

/// Symmetric key material scoped to one space
pub struct SpaceKeyring {
    salt: [u8; 32],
    cipher: Aes256Gcm,
}

impl SpaceKeyring {
    /// Derive the keyring for `space_name` from a master seed
    pub fn derive(master_seed: &[u8], space_name: &str) -> SpaceResult<Self> {
        let hk = Hkdf::<Sha256>::new(Some(DERIVE_DOMAIN), master_seed);

        let mut okm = [0u8; 64];
        hk.expand(format!("space:{}", space_name).as_bytes(), &mut okm)
            .map_err(|e| SpaceError::Identity(format!("key derivation failed: {}", e)))?;

        let mut salt = [0u8; 32];
        salt.copy_from_slice(&okm[32..]);

        let key = Key::<Aes256Gcm>::from_slice(&okm[..32]);
        let cipher = Aes256Gcm::new(key);
        okm.zeroize();

        Ok(SpaceKeyring { salt, cipher })
    }

    /// Salt mixed into private-view key hashing
    pub fn db_salt(&self) -> &[u8; 32] {
        &self.salt
    }

    /// Encrypt a plaintext under this space's key
    pub fn sym_encrypt(&self, plaintext: &[u8]) -> SpaceResult<SymCiphertext> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| SpaceError::Identity(format!("encryption failed: {}", e)))?;

        Ok(SymCiphertext {
            ciphertext,
            nonce: nonce_bytes,
        })
    }

    /// Decrypt a ciphertext sealed by [`sym_encrypt`](Self::sym_encrypt)
    ///
    /// Fails with [`SpaceError::Decryption`] when authentication fails, which
    /// covers both key mismatch and tampered data.
    pub fn sym_decrypt(&self, ciphertext: &[u8], nonce: &[u8]) -> SpaceResult<Vec<u8>> {
        if nonce.len() != NONCE_LEN {
            return Err(SpaceError::Decryption(format!(
                "invalid nonce length: {}",
                nonce.len()
            )));
        }

        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| SpaceError::Decryption("authentication failed".to_string()))
    }
}

impl std::fmt::Debug for SpaceKeyring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpaceKeyring").finish_non_exhaustive()
    }
}
