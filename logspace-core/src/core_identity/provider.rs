//! Identity collaborator contract and a local provider
//!
//! Spaces consume the identity service through [`IdentityProvider`]: keyring
//! initialization (with its consent signal), per-space sub-DIDs and JWT
//! signing. [`LocalIdentity`] is a self-contained provider backed by a master
//! seed: HKDF-derived per-space Ed25519 keys, `did:key`-style identifiers and
//! compact EdDSA JWS tokens.

use super::keyring::SpaceKeyring;
use crate::core_space::errors::{SpaceError, SpaceResult};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use hkdf::Hkdf;
use serde_json::{json, Value};
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use zeroize::Zeroizing;

/// Identity/keyring service consumed by spaces
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Ensure key material exists for `space_name`. Returns `true` when the
    /// keyring was newly created, i.e. user consent was newly required.
    async fn init_keyring_by_name(&self, space_name: &str) -> SpaceResult<bool>;

    /// Keyring for an initialized space
    async fn keyring(&self, space_name: &str) -> SpaceResult<Arc<SpaceKeyring>>;

    /// DID of the sub-identity owning `space_name`
    async fn sub_did(&self, space_name: &str) -> SpaceResult<String>;

    /// Sign `claims` as a compact JWT bound to `space_name`
    async fn sign_jwt(&self, claims: Value, space_name: &str) -> SpaceResult<String>;
}

/// Seed-backed identity provider
pub struct LocalIdentity {
    seed: Zeroizing<Vec<u8>>,
    keyrings: RwLock<HashMap<String, Arc<SpaceKeyring>>>,
}

impl LocalIdentity {
    /// Build a provider from a 32-byte master seed
    pub fn new(seed: [u8; 32]) -> Self {
        LocalIdentity {
            seed: Zeroizing::new(seed.to_vec()),
            keyrings: RwLock::new(HashMap::new()),
        }
    }

    /// Build a provider with a random master seed
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut seed = [0u8; 32];
        rand::rng().fill_bytes(&mut seed);
        Self::new(seed)
    }

    fn signing_key(&self, space_name: &str) -> SpaceResult<SigningKey> {
        let hk = Hkdf::<Sha256>::new(Some(b"logspace-sub-identity-v1"), &self.seed);
        let mut secret = Zeroizing::new([0u8; 32]);
        hk.expand(format!("did:{}", space_name).as_bytes(), secret.as_mut())
            .map_err(|e| SpaceError::Identity(format!("sub-key derivation failed: {}", e)))?;
        Ok(SigningKey::from_bytes(&secret))
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    async fn init_keyring_by_name(&self, space_name: &str) -> SpaceResult<bool> {
        let mut keyrings = self.keyrings.write().await;
        if keyrings.contains_key(space_name) {
            return Ok(false);
        }
        let keyring = SpaceKeyring::derive(&self.seed, space_name)?;
        keyrings.insert(space_name.to_string(), Arc::new(keyring));
        tracing::debug!(space = space_name, "keyring initialized");
        Ok(true)
    }

    async fn keyring(&self, space_name: &str) -> SpaceResult<Arc<SpaceKeyring>> {
        self.keyrings
            .read()
            .await
            .get(space_name)
            .cloned()
            .ok_or_else(|| {
                SpaceError::Identity(format!("no keyring initialized for space {}", space_name))
            })
    }

    async fn sub_did(&self, space_name: &str) -> SpaceResult<String> {
        let key = self.signing_key(space_name)?;
        let encoded = bs58::encode(key.verifying_key().as_bytes()).into_string();
        Ok(format!("did:key:z{}", encoded))
    }

    async fn sign_jwt(&self, claims: Value, space_name: &str) -> SpaceResult<String> {
        let key = self.signing_key(space_name)?;
        let did = self.sub_did(space_name).await?;

        let mut claims = match claims {
            Value::Object(map) => map,
            Value::Null => serde_json::Map::new(),
            other => {
                return Err(SpaceError::InvalidArgument(format!(
                    "JWT claims must be an object, got {}",
                    other
                )))
            }
        };
        claims.insert("iss".to_string(), json!(did));
        claims.insert("space".to_string(), json!(space_name));
        let iat = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        claims.insert("iat".to_string(), json!(iat));

        let header = json!({ "alg": "EdDSA", "typ": "JWT" });
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&Value::Object(claims))?)
        );

        let signature = key.sign(signing_input.as_bytes());
        Ok(format!(
            "{}.{}",
            signing_input,
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        ))
    }
}

/// Verify a compact EdDSA JWT produced by [`IdentityProvider::sign_jwt`]
///
/// The verifying key is recovered from the token's own `iss` claim
/// (`did:key:z<base58 public key>`). Returns the verified claims.
pub fn verify_jwt(token: &str) -> SpaceResult<Value> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(SpaceError::Identity("malformed JWT".to_string()));
    }

    let header: Value = serde_json::from_slice(
        &URL_SAFE_NO_PAD
            .decode(parts[0])
            .map_err(|e| SpaceError::Identity(format!("invalid JWT header: {}", e)))?,
    )?;
    if header.get("alg").and_then(Value::as_str) != Some("EdDSA") {
        return Err(SpaceError::Identity("unsupported JWT algorithm".to_string()));
    }

    let claims: Value = serde_json::from_slice(
        &URL_SAFE_NO_PAD
            .decode(parts[1])
            .map_err(|e| SpaceError::Identity(format!("invalid JWT claims: {}", e)))?,
    )?;

    let issuer = claims
        .get("iss")
        .and_then(Value::as_str)
        .ok_or_else(|| SpaceError::Identity("JWT missing iss claim".to_string()))?;
    let encoded_key = issuer
        .strip_prefix("did:key:z")
        .ok_or_else(|| SpaceError::Identity(format!("unsupported issuer DID: {}", issuer)))?;
    let key_bytes = bs58::decode(encoded_key)
        .into_vec()
        .map_err(|e| SpaceError::Identity(format!("invalid issuer key encoding: {}", e)))?;
    let key_bytes: [u8; 32] = key_bytes
        .try_into()
        .map_err(|_| SpaceError::Identity("invalid issuer key length".to_string()))?;
    let verifying_key = VerifyingKey::from_bytes(&key_bytes)
        .map_err(|e| SpaceError::Identity(format!("invalid issuer key: {}", e)))?;

    let sig_bytes = URL_SAFE_NO_PAD
        .decode(parts[2])
        .map_err(|e| SpaceError::Identity(format!("invalid JWT signature: {}", e)))?;
    let signature = Signature::from_slice(&sig_bytes)
        .map_err(|e| SpaceError::Identity(format!("invalid JWT signature: {}", e)))?;

    let signing_input = format!("{}.{}", parts[0], parts[1]);
    verifying_key
        .verify(signing_input.as_bytes(), &signature)
        .map_err(|_| SpaceError::Identity("JWT signature verification failed".to_string()))?;

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_consent_flag_only_on_first_init() {
        let identity = LocalIdentity::generate();
        assert!(identity.init_keyring_by_name("notes").await.unwrap());
        assert!(!identity.init_keyring_by_name("notes").await.unwrap());
    }

    #[tokio::test]
    async fn test_keyring_requires_init() {
        let identity = LocalIdentity::generate();
        assert!(matches!(
            identity.keyring("notes").await,
            Err(SpaceError::Identity(_))
        ));

        identity.init_keyring_by_name("notes").await.unwrap();
        assert!(identity.keyring("notes").await.is_ok());
    }

    #[tokio::test]
    async fn test_sub_did_is_stable_and_scoped() {
        let identity = LocalIdentity::new([3u8; 32]);
        let a = identity.sub_did("notes").await.unwrap();
        let b = identity.sub_did("notes").await.unwrap();
        let c = identity.sub_did("photos").await.unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("did:key:z"));
    }

    #[tokio::test]
    async fn test_sign_and_verify_jwt() {
        let identity = LocalIdentity::generate();
        let token = identity
            .sign_jwt(json!({ "hello": "world" }), "notes")
            .await
            .unwrap();

        let claims = verify_jwt(&token).unwrap();
        assert_eq!(claims["hello"], json!("world"));
        assert_eq!(claims["space"], json!("notes"));
        assert_eq!(
            claims["iss"],
            json!(identity.sub_did("notes").await.unwrap())
        );
    }

    #[tokio::test]
    async fn test_empty_claims_sign_verifies() {
        let identity = LocalIdentity::generate();
        let token = identity.sign_jwt(json!({}), "notes").await.unwrap();

        let claims = verify_jwt(&token).unwrap();
        assert_eq!(claims["space"], json!("notes"));
        assert!(claims.get("iat").is_some());
    }

    #[tokio::test]
    async fn test_tampered_jwt_rejected() {
        let identity = LocalIdentity::generate();
        let token = identity.sign_jwt(json!({ "n": 1 }), "notes").await.unwrap();

        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        parts[1] = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&json!({
                "n": 2,
                "iss": verify_jwt(&token).unwrap()["iss"],
            }))
            .unwrap(),
        );
        let forged = parts.join(".");

        assert!(verify_jwt(&forged).is_err());
    }

    #[tokio::test]
    async fn test_non_object_claims_rejected() {
        let identity = LocalIdentity::generate();
        let result = identity.sign_jwt(json!([1, 2]), "notes").await;
        assert!(matches!(result, Err(SpaceError::InvalidArgument(_))));
    }
}
