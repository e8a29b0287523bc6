//! Type definitions for spaces and thread addresses

use super::errors::{SpaceError, SpaceResult};
use crate::core_log::EntryMetadata;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Address scheme of thread stores
pub const ADDRESS_SCHEME: &str = "logspace";

/// Minimum length of an address root hash
const MIN_ROOT_LEN: usize = 32;

/// Lifecycle of a space, advancing forward only
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Constructed, `open()` not yet called
    Uninitialized,
    /// Keyring requested, store being opened
    Loading,
    /// Background replay against peers in flight; local writes already work
    Syncing,
    /// Sync and self-publication complete
    Ready,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Loading => "loading",
            LifecycleState::Syncing => "syncing",
            LifecycleState::Ready => "ready",
        };
        write!(f, "{}", s)
    }
}

/// Full address of a thread store: `/logspace/<root>/<dbname>`
///
/// `<root>` is the base58 content hash of the store manifest and `<dbname>`
/// is `<space-name>.<thread-name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ThreadAddress {
    root: String,
    db_name: String,
}

impl ThreadAddress {
    /// Build an address from its components, validating both
    pub fn new(root: impl Into<String>, db_name: impl Into<String>) -> SpaceResult<Self> {
        let addr = ThreadAddress {
            root: root.into(),
            db_name: db_name.into(),
        };
        addr.validate()?;
        Ok(addr)
    }

    /// Parse and validate a full address string
    pub fn parse(s: &str) -> SpaceResult<Self> {
        let invalid = || SpaceError::InvalidAddress(s.to_string());

        let rest = s
            .strip_prefix('/')
            .and_then(|r| r.strip_prefix(ADDRESS_SCHEME))
            .and_then(|r| r.strip_prefix('/'))
            .ok_or_else(invalid)?;

        let (root, db_name) = rest.split_once('/').ok_or_else(invalid)?;
        ThreadAddress::new(root, db_name).map_err(|_| invalid())
    }

    /// Whether `s` parses as a well-formed thread address
    pub fn is_valid(s: &str) -> bool {
        Self::parse(s).is_ok()
    }

    fn validate(&self) -> SpaceResult<()> {
        let invalid = |reason: &str| {
            SpaceError::InvalidAddress(format!("{} ({})", self, reason))
        };

        if self.root.len() < MIN_ROOT_LEN || !self.root.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(invalid("bad root hash"));
        }
        // dbname must be <space>.<thread> with both parts present
        match self.db_name.split_once('.') {
            Some((space, thread)) if !space.is_empty() && !thread.is_empty() => Ok(()),
            _ => Err(invalid("bad db name")),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    /// Space-name component of the db name
    pub fn space_name(&self) -> &str {
        self.db_name.split_once('.').map(|(s, _)| s).unwrap_or("")
    }

    /// Thread-name component of the db name
    pub fn thread_name(&self) -> &str {
        self.db_name.split_once('.').map(|(_, t)| t).unwrap_or("")
    }

    /// Whether this address belongs to `space`
    pub fn belongs_to(&self, space: &str) -> bool {
        self.space_name() == space
    }
}

impl fmt::Display for ThreadAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}/{}", ADDRESS_SCHEME, self.root, self.db_name)
    }
}

impl FromStr for ThreadAddress {
    type Err = SpaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ThreadAddress::parse(s)
    }
}

impl TryFrom<String> for ThreadAddress {
    type Error = SpaceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        ThreadAddress::parse(&s)
    }
}

impl From<ThreadAddress> for String {
    fn from(addr: ThreadAddress) -> String {
        addr.to_string()
    }
}

/// Registry record stored under public key `thread-<address>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadSubscription {
    pub address: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_mod: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<bool>,
}

impl ThreadSubscription {
    /// Minimal record carrying only the address
    pub fn from_address(address: &ThreadAddress) -> Self {
        ThreadSubscription {
            address: address.to_string(),
            name: None,
            root_mod: None,
            members: None,
        }
    }
}

/// A decoded value together with the engine metadata of its entry
#[derive(Debug, Clone, PartialEq)]
pub struct ValueWithMeta {
    pub value: Value,
    pub meta: EntryMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_addr() -> String {
        format!("/logspace/{}/myspace.chat", "Q".repeat(40))
    }

    #[test]
    fn test_lifecycle_ordering() {
        assert!(LifecycleState::Uninitialized < LifecycleState::Loading);
        assert!(LifecycleState::Loading < LifecycleState::Syncing);
        assert!(LifecycleState::Syncing < LifecycleState::Ready);
    }

    #[test]
    fn test_parse_valid_address() {
        let addr = ThreadAddress::parse(&valid_addr()).unwrap();
        assert_eq!(addr.space_name(), "myspace");
        assert_eq!(addr.thread_name(), "chat");
        assert_eq!(addr.to_string(), valid_addr());
        assert!(addr.belongs_to("myspace"));
        assert!(!addr.belongs_to("other"));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in [
            "",
            "not-an-address",
            "/otherscheme/QQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQ/a.b",
            "/logspace/short/a.b",
            "/logspace/QQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQ/noseparator",
            "/logspace/QQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQ/.thread",
            "/logspace/QQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQQ/space.",
            "/logspace/QQQQ!QQQQQQQQQQQQQQQQQQQQQQQQQQQQ/a.b",
        ] {
            assert!(!ThreadAddress::is_valid(bad), "should reject {:?}", bad);
        }
    }

    #[test]
    fn test_thread_name_may_contain_dots() {
        let addr =
            ThreadAddress::parse(&format!("/logspace/{}/sp.team.general", "Q".repeat(40))).unwrap();
        assert_eq!(addr.space_name(), "sp");
        assert_eq!(addr.thread_name(), "team.general");
    }

    #[test]
    fn test_address_serde_roundtrip() {
        let addr = ThreadAddress::parse(&valid_addr()).unwrap();
        let encoded = serde_json::to_string(&addr).unwrap();
        let decoded: ThreadAddress = serde_json::from_str(&encoded).unwrap();
        assert_eq!(addr, decoded);
    }

    #[test]
    fn test_subscription_record_skips_absent_fields() {
        let addr = ThreadAddress::parse(&valid_addr()).unwrap();
        let record = ThreadSubscription::from_address(&addr);
        let encoded = serde_json::to_value(&record).unwrap();
        assert_eq!(encoded.as_object().unwrap().len(), 1);
        assert_eq!(encoded["address"], serde_json::json!(valid_addr()));
    }
}
