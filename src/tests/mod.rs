// Tests module
// End-to-end update-pass scenarios over the real verifier, plus
// property tests for the registry's structural guarantees.

mod scenarios {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::sync::Arc;
    use tempfile::tempdir;
    use tokio::sync::RwLock;

    use crate::credential::CredentialVerifier;
    use crate::fetch::FetchError;
    use crate::registry::store::RocksDbStore;
    use crate::registry::{PeerRegistry, RegistryError};
    use crate::test_utils::{
        mined_credential, FixedClock, MemoryStore, StaticCredentialClient, TEST_POW_BITS,
    };
    use crate::types::PeerAddr;
    use crate::update::{RegistryUpdater, UpdateOutcome};

    // ===== HELPERS =====

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 25, 12, 0, 0).unwrap()
    }

    fn verifier() -> CredentialVerifier {
        CredentialVerifier::new(Arc::new(FixedClock(now())), 86_400, 60, TEST_POW_BITS, 64)
    }

    fn seeded(addrs: &[PeerAddr]) -> (Arc<RwLock<PeerRegistry>>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let mut registry = PeerRegistry::open(store.clone()).unwrap();
        for addr in addrs {
            registry.add(addr.clone()).unwrap();
        }
        (Arc::new(RwLock::new(registry)), store)
    }

    fn updater(
        registry: Arc<RwLock<PeerRegistry>>,
        client: StaticCredentialClient,
    ) -> RegistryUpdater {
        RegistryUpdater::new(registry, Arc::new(client), verifier())
    }

    // ===== UPDATE PASS SCENARIOS =====

    #[tokio::test]
    async fn test_fresh_valid_credential_rescores() {
        let a = PeerAddr::new("a", 80);
        let (registry, _) = seeded(&[a.clone()]);

        let client = StaticCredentialClient::new().with_body(&a, mined_credential(&a, now(), 1));
        let report = updater(registry.clone(), client).update().await.unwrap();

        assert_eq!(report.entries, vec![(a.clone(), UpdateOutcome::Rescored(1))]);

        let peers = registry.read().await.enumerate();
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].addr, a);
        assert_eq!(peers[0].strength, 1);
    }

    #[tokio::test]
    async fn test_server_error_evicts_as_unreachable() {
        let a = PeerAddr::new("a", 80);
        let (registry, _) = seeded(&[a.clone()]);

        let client = StaticCredentialClient::new().with_error(&a, FetchError::Status(500));
        let report = updater(registry.clone(), client).update().await.unwrap();

        assert_eq!(
            report.entries,
            vec![(a, UpdateOutcome::EvictedUnreachable(FetchError::Status(500)))]
        );
        assert!(registry.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_foreign_credential_evicts_as_invalid() {
        let a = PeerAddr::new("a", 80);
        let b = PeerAddr::new("b", 80);
        let (registry, _) = seeded(&[a.clone()]);

        // A perfectly valid credential, but mined for peer b
        let client = StaticCredentialClient::new().with_body(&a, mined_credential(&b, now(), 1));
        let report = updater(registry.clone(), client).update().await.unwrap();

        assert_eq!(report.entries, vec![(a, UpdateOutcome::EvictedInvalid)]);
        assert!(registry.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_mixed_pass_keeps_only_the_proven_peer() {
        let a = PeerAddr::new("a", 80);
        let b = PeerAddr::new("b", 81);
        let (registry, _) = seeded(&[a.clone(), b.clone()]);

        let client = StaticCredentialClient::new()
            .with_body(&a, mined_credential(&a, now(), 3))
            .with_error(
                &b,
                FetchError::Transport("connection refused".to_string()),
            );
        let report = updater(registry.clone(), client).update().await.unwrap();

        // Report order follows registry order
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.entries[0], (a.clone(), UpdateOutcome::Rescored(3)));
        assert_eq!(report.entries[1].0, b);

        let peers = registry.read().await.enumerate();
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].addr, a);
        assert_eq!(peers[0].strength, 3);
    }

    #[tokio::test]
    async fn test_cleared_registry_updates_to_an_empty_report() {
        let a = PeerAddr::new("a", 80);
        let b = PeerAddr::new("b", 81);
        let (registry, _) = seeded(&[a, b]);

        assert_eq!(registry.write().await.clear().unwrap(), 2);
        assert!(registry.read().await.enumerate().is_empty());

        let report = updater(registry.clone(), StaticCredentialClient::new())
            .update()
            .await
            .unwrap();
        assert!(report.entries.is_empty());
    }

    #[tokio::test]
    async fn test_every_survivor_verified_and_every_evictee_gone() {
        let a = PeerAddr::new("a", 80);
        let b = PeerAddr::new("b", 81);
        let c = PeerAddr::new("c", 82);
        let (registry, _) = seeded(&[a.clone(), b.clone(), c.clone()]);

        let client = StaticCredentialClient::new()
            .with_body(&a, mined_credential(&a, now(), 2))
            .with_body(&b, "not json at all".to_string())
            .with_error(&c, FetchError::Transport("timed out".to_string()));
        let report = updater(registry.clone(), client).update().await.unwrap();

        let remaining = registry.read().await.enumerate();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].addr, a);

        for (addr, outcome) in &report.entries {
            let present = remaining.iter().any(|p| &p.addr == addr);
            match outcome {
                UpdateOutcome::Rescored(_) => assert!(present),
                _ => assert!(!present),
            }
        }
    }

    #[tokio::test]
    async fn test_new_verdict_replaces_the_cached_strength() {
        let a = PeerAddr::new("a", 80);
        let (registry, _) = seeded(&[a.clone()]);

        // Stale high score from an earlier pass; this pass proves less
        registry.write().await.rescore(&a, 5).unwrap();

        let client = StaticCredentialClient::new().with_body(&a, mined_credential(&a, now(), 2));
        let report = updater(registry.clone(), client).update().await.unwrap();

        assert_eq!(report.entries, vec![(a, UpdateOutcome::Rescored(2))]);
        assert_eq!(registry.read().await.enumerate()[0].strength, 2);
    }

    #[tokio::test]
    async fn test_stale_credential_evicts_as_invalid() {
        let a = PeerAddr::new("a", 80);
        let (registry, _) = seeded(&[a.clone()]);

        let issued = now() - Duration::seconds(2 * 86_400);
        let client = StaticCredentialClient::new().with_body(&a, mined_credential(&a, issued, 1));
        let report = updater(registry.clone(), client).update().await.unwrap();

        assert_eq!(report.entries, vec![(a, UpdateOutcome::EvictedInvalid)]);
        assert!(registry.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_aborts_the_pass() {
        let a = PeerAddr::new("a", 80);
        let (registry, store) = seeded(&[a.clone()]);

        store.fail_saves(true);
        let client = StaticCredentialClient::new().with_error(&a, FetchError::Status(503));

        let err = updater(registry.clone(), client).update().await.unwrap_err();
        assert!(matches!(err, RegistryError::Store(_)));

        // The failed eviction must not have touched memory or disk
        assert_eq!(registry.read().await.len(), 1);
        assert_eq!(store.saved().len(), 1);
    }

    #[tokio::test]
    async fn test_pass_results_survive_reopen() {
        let dir = tempdir().unwrap();
        let a = PeerAddr::new("a", 80);
        let b = PeerAddr::new("b", 81);

        {
            let store = Arc::new(RocksDbStore::open(dir.path()).unwrap());
            let mut registry = PeerRegistry::open(store).unwrap();
            registry.add(a.clone()).unwrap();
            registry.add(b.clone()).unwrap();
            let registry = Arc::new(RwLock::new(registry));

            let client = StaticCredentialClient::new()
                .with_body(&a, mined_credential(&a, now(), 2))
                .with_error(&b, FetchError::Transport("timed out".to_string()));
            RegistryUpdater::new(registry, Arc::new(client), verifier())
                .update()
                .await
                .unwrap();
        }

        {
            let store = Arc::new(RocksDbStore::open(dir.path()).unwrap());
            let registry = PeerRegistry::open(store).unwrap();
            let peers = registry.enumerate();
            assert_eq!(peers.len(), 1);
            assert_eq!(peers[0].addr, a);
            assert_eq!(peers[0].strength, 2);
        }
    }
}

mod properties {
    use proptest::prelude::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    use crate::registry::PeerRegistry;
    use crate::test_utils::MemoryStore;
    use crate::types::PeerAddr;

    fn addr_strategy() -> impl Strategy<Value = PeerAddr> {
        ("[a-d]", 1u16..5u16).prop_map(|(host, port)| PeerAddr::new(host, port))
    }

    fn registry_of(addrs: &[PeerAddr]) -> PeerRegistry {
        let mut registry = PeerRegistry::open(Arc::new(MemoryStore::new())).unwrap();
        for addr in addrs {
            registry.add(addr.clone()).unwrap();
        }
        registry
    }

    proptest! {
        #[test]
        fn enumerate_never_holds_duplicates(
            addrs in proptest::collection::vec(addr_strategy(), 0..30)
        ) {
            let registry = registry_of(&addrs);

            let peers = registry.enumerate();
            let unique: HashSet<_> = peers.iter().map(|p| p.addr.clone()).collect();
            prop_assert_eq!(unique.len(), peers.len());
        }

        #[test]
        fn re_adding_changes_nothing(
            addrs in proptest::collection::vec(addr_strategy(), 1..20),
            strength in 0u32..100u32,
        ) {
            let mut registry = registry_of(&addrs);
            let target = addrs[0].clone();
            registry.rescore(&target, strength).unwrap();

            let before = registry.enumerate();
            prop_assert!(!registry.add(target).unwrap());
            prop_assert_eq!(registry.enumerate(), before);
        }

        #[test]
        fn removing_an_absent_peer_changes_nothing(
            addrs in proptest::collection::vec(addr_strategy(), 0..10)
        ) {
            let mut registry = registry_of(&addrs);
            let absent = PeerAddr::new("nowhere", 9999);

            let before = registry.enumerate();
            prop_assert!(!registry.remove(&absent).unwrap());
            prop_assert_eq!(registry.enumerate(), before);
        }
    }
}
