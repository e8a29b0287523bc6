/*
    End-to-End Space Lifecycle Test

    Validates the full space stack working together:
    - Identity and keyring derivation
    - Space open: consent, store load, registry announcement
    - Background sync and self-published identity proof
    - Public/private view reads and writes
    - Thread join/subscribe registry
*/

use logspace_core::config::SpaceConfig;
use logspace_core::core_identity::{verify_jwt, IdentityProvider, LocalIdentity};
use logspace_core::core_log::{LogStore, MemoryLogStore, MemoryRegistry, RegistryStore};
use logspace_core::core_space::{
    JoinThreadOptions, LifecycleState, SubscribeConfig, SpaceError, SpaceOptions, PROOF_DID_KEY,
};
use logspace_core::Space;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn build_space(
    name: &str,
    store: Arc<MemoryLogStore>,
    registry: Arc<MemoryRegistry>,
    identity: Arc<LocalIdentity>,
    options: SpaceOptions,
) -> Arc<Space> {
    Space::new(
        name,
        store as Arc<dyn LogStore>,
        registry as Arc<dyn RegistryStore>,
        identity as Arc<dyn IdentityProvider>,
        options,
    )
}

/// Scenario:
/// 1. Alice opens a fresh space and the consent callback fires
/// 2. The space syncs, self-publishes its identity proof, and goes ready
/// 3. Alice writes to both views; each view only sees its own keys
/// 4. Alice joins a thread, which auto-subscribes it
/// 5. A second session over the same log sees everything without re-publishing
#[tokio::test]
async fn test_full_space_session() {
    println!("Phase 1: open");
    let store = Arc::new(MemoryLogStore::new("journal", "alice"));
    let registry = Arc::new(MemoryRegistry::new());
    let identity = Arc::new(LocalIdentity::new([42u8; 32]));

    let consent_seen = Arc::new(AtomicBool::new(false));
    let consent_flag = consent_seen.clone();
    let options = SpaceOptions {
        config: SpaceConfig::default(),
        consent_callback: Some(Arc::new(move |needed| {
            if needed {
                consent_flag.store(true, Ordering::SeqCst);
            }
        })),
    };

    let space = build_space("journal", store.clone(), registry.clone(), identity.clone(), options);
    space.open().await.unwrap();
    space.await_synced().await.unwrap();

    assert!(consent_seen.load(Ordering::SeqCst), "fresh keyring requires consent");
    assert_eq!(space.state().await, LifecycleState::Ready);
    assert_eq!(registry.entries(10).await.unwrap().len(), 1);

    println!("Phase 2: identity proof");
    let public = space.public().unwrap();
    let proof = public.get(PROOF_DID_KEY).await.unwrap().unwrap();
    let claims = verify_jwt(proof.as_str().unwrap()).unwrap();
    assert_eq!(claims["space"], json!("journal"));
    assert_eq!(claims["iss"], json!(space.did().await.unwrap()));

    println!("Phase 3: dual views");
    let private = space.private().unwrap();
    public.set("city", json!("Lisbon")).await.unwrap();
    private.set("diary", json!({ "mood": "fine" })).await.unwrap();

    assert_eq!(public.get("city").await.unwrap(), Some(json!("Lisbon")));
    assert_eq!(
        private.get("diary").await.unwrap(),
        Some(json!({ "mood": "fine" }))
    );
    // Views never observe each other's keys
    assert_eq!(public.get("diary").await.unwrap(), None);
    assert_eq!(private.get("city").await.unwrap(), None);
    assert!(!public.all().await.unwrap().contains_key("diary"));
    assert!(!private.all().await.unwrap().contains_key("city"));

    // Private payloads are ciphertext on the wire
    let raw: Vec<String> = store
        .log_entries()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.value.to_string())
        .collect();
    assert!(!raw.iter().any(|v| v.contains("fine")));

    println!("Phase 4: threads");
    let thread = space
        .join_thread("travel", JoinThreadOptions::default())
        .await
        .unwrap();
    let address = thread.address().await.unwrap();
    assert!(address.belongs_to("journal"));

    let subs = space.subscribed_threads().await.unwrap();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].address, address.to_string());

    println!("Phase 5: second session");
    let session2 = build_space(
        "journal",
        store.clone(),
        registry.clone(),
        identity.clone(),
        SpaceOptions::default(),
    );
    session2.open().await.unwrap();
    session2.await_synced().await.unwrap();

    // Same address, no duplicate registry entry, no re-published proof
    assert_eq!(session2.address().await, space.address().await);
    assert_eq!(registry.entries(10).await.unwrap().len(), 1);
    let proofs = store
        .log_entries()
        .await
        .unwrap()
        .into_iter()
        .filter(|e| e.key == format!("pub_{}", PROOF_DID_KEY))
        .count();
    assert_eq!(proofs, 1);

    // The second session decrypts the first session's private data
    let private2 = session2.private().unwrap();
    assert_eq!(
        private2.get("diary").await.unwrap(),
        Some(json!({ "mood": "fine" }))
    );
    assert_eq!(session2.subscribed_threads().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_concurrent_writes_from_one_session() {
    let space = build_space(
        "busy",
        Arc::new(MemoryLogStore::new("busy", "alice")),
        Arc::new(MemoryRegistry::new()),
        Arc::new(LocalIdentity::new([3u8; 32])),
        SpaceOptions::default(),
    );
    space.open().await.unwrap();
    space.await_synced().await.unwrap();

    let public = space.public().unwrap();
    let writes = (0..16).map(|i| {
        let view = public.clone();
        async move { view.set(&format!("k{i}"), json!(i)).await }
    });
    for result in futures::future::join_all(writes).await {
        result.unwrap();
    }

    let snapshot = public.all().await.unwrap();
    // 16 keys plus the self-published identity proof
    assert_eq!(snapshot.len(), 17);
    assert_eq!(snapshot["k7"], json!(7));
}

#[tokio::test]
async fn test_cross_space_join_rejected_end_to_end() {
    let space = build_space(
        "mine",
        Arc::new(MemoryLogStore::new("mine", "alice")),
        Arc::new(MemoryRegistry::new()),
        Arc::new(LocalIdentity::new([1u8; 32])),
        SpaceOptions::default(),
    );
    space.open().await.unwrap();
    space.await_synced().await.unwrap();

    let foreign = format!("/logspace/{}/theirs.chat", "a".repeat(44));
    let err = space
        .join_thread(&foreign, JoinThreadOptions::default())
        .await
        .unwrap_err();
    match err {
        SpaceError::CrossSpace { address, space } => {
            assert_eq!(address, foreign);
            assert_eq!(space, "mine");
        }
        other => panic!("expected CrossSpace, got {other:?}"),
    }
}

#[tokio::test]
async fn test_subscriptions_survive_sessions_and_unsubscribe() {
    let store = Arc::new(MemoryLogStore::new("pm", "bob"));
    let registry = Arc::new(MemoryRegistry::new());
    let identity = Arc::new(LocalIdentity::new([2u8; 32]));

    let space = build_space("pm", store.clone(), registry.clone(), identity.clone(), SpaceOptions::default());
    space.open().await.unwrap();
    space.await_synced().await.unwrap();

    let addr_a = format!("/logspace/{}/pm.alpha", "b".repeat(40));
    let addr_b = format!("/logspace/{}/pm.beta", "c".repeat(40));
    space
        .subscribe_thread(&addr_a, SubscribeConfig::default())
        .await
        .unwrap();
    space
        .subscribe_thread(
            &addr_b,
            SubscribeConfig {
                name: Some("beta".to_string()),
                members: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let session2 = build_space("pm", store, registry, identity, SpaceOptions::default());
    session2.open().await.unwrap();
    session2.await_synced().await.unwrap();

    let subs = session2.subscribed_threads().await.unwrap();
    assert_eq!(subs.len(), 2);
    let beta = subs.iter().find(|s| s.address == addr_b).unwrap();
    assert_eq!(beta.name.as_deref(), Some("beta"));
    assert_eq!(beta.members, Some(true));

    session2.unsubscribe_thread(&addr_a).await.unwrap();
    let subs = session2.subscribed_threads().await.unwrap();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].address, addr_b);
}
