//! Dual-view key-value spaces over an append-only log
//!
//! The space layer projects one replicated log into a plaintext public view
//! and an encrypted private view, drives the open/sync lifecycle, and keeps
//! the thread subscription registry inside the public view.

pub mod codec;
pub mod errors;
pub mod key_transform;
pub mod space;
pub mod threads;
pub mod types;
pub mod view;

pub use codec::Envelope;
pub use errors::{SpaceError, SpaceResult};
pub use key_transform::{PRIVATE_PREFIX, PUBLIC_PREFIX};
pub use space::{ConsentCallback, Space, SpaceOptions, PROOF_DID_KEY};
pub use threads::{JoinThreadOptions, SubscribeConfig, THREAD_KEY_PREFIX};
pub use types::{LifecycleState, ThreadAddress, ThreadSubscription, ValueWithMeta};
pub use view::{DecodedEntry, PrivateCodec, PrivateView, PublicCodec, PublicView, SpaceStore, ViewCodec};
