//! Private-view entry codec
//!
//! A private entry is an envelope `{key, value}` carrying the original
//! logical key (the physical key is a one-way hash and cannot be reversed).
//! The envelope is serialized as JSON, padded to a fixed block size so entry
//! lengths leak less about content, then sealed with the space's symmetric
//! key. The stored payload is `{ciphertext, nonce}`, base64-encoded.

use super::errors::{SpaceError, SpaceResult};
use crate::core_identity::SpaceKeyring;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// The `{key, value}` structure encrypted as one private-view entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub key: String,
    pub value: Value,
}

/// Pad with NUL bytes up to the next multiple of `block_size`
///
/// Already-aligned input (including empty input) is returned unchanged.
pub fn pad(s: &str, block_size: usize) -> String {
    let rem = s.len() % block_size;
    if rem == 0 {
        return s.to_string();
    }
    let mut padded = String::with_capacity(s.len() + block_size - rem);
    padded.push_str(s);
    for _ in 0..(block_size - rem) {
        padded.push('\0');
    }
    padded
}

/// Strip trailing NUL padding
///
/// Known limitation: content that legitimately ends in NUL bytes would lose
/// them. JSON-serialized envelopes never end in NUL, so the round-trip holds
/// for everything this codec produces.
pub fn unpad(s: &str) -> &str {
    s.trim_end_matches('\0')
}

/// Serialize, pad and encrypt an envelope into its stored payload
pub fn encrypt_entry(
    envelope: &Envelope,
    keyring: &SpaceKeyring,
    block_size: usize,
) -> SpaceResult<Value> {
    let serialized = serde_json::to_string(envelope)?;
    let padded = pad(&serialized, block_size);
    let sealed = keyring.sym_encrypt(padded.as_bytes())?;

    Ok(json!({
        "ciphertext": BASE64.encode(&sealed.ciphertext),
        "nonce": BASE64.encode(sealed.nonce),
    }))
}

/// Decrypt, unpad and deserialize a stored payload back into its envelope
///
/// Every failure mode surfaces as [`SpaceError::Decryption`]: a malformed
/// payload, failed authentication or an envelope that does not parse all
/// indicate key mismatch or corruption.
pub fn decrypt_entry(stored: &Value, keyring: &SpaceKeyring) -> SpaceResult<Envelope> {
    let malformed = |what: &str| SpaceError::Decryption(format!("malformed private entry: {}", what));

    let ciphertext = stored
        .get("ciphertext")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("missing ciphertext"))?;
    let nonce = stored
        .get("nonce")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("missing nonce"))?;

    let ciphertext = BASE64
        .decode(ciphertext)
        .map_err(|_| malformed("ciphertext encoding"))?;
    let nonce = BASE64.decode(nonce).map_err(|_| malformed("nonce encoding"))?;

    let plaintext = keyring.sym_decrypt(&ciphertext, &nonce)?;
    let text = String::from_utf8(plaintext).map_err(|_| malformed("plaintext encoding"))?;

    serde_json::from_str(unpad(&text))
        .map_err(|e| SpaceError::Decryption(format!("envelope does not parse: {}", e)))
}
