//! Cart resolution across sessions, users and backend outages.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use biblio_client::CartResolver;
use biblio_client::store::{CartPointerStore, FileCartPointerStore, MemoryCartPointerStore};
use biblio_core::{CartId, UserId};
use biblio_integration_tests::{Call, InMemoryBackend};

fn resolver(backend: &Arc<InMemoryBackend>, pointer: Arc<dyn CartPointerStore>) -> CartResolver {
    CartResolver::new(backend.clone(), pointer)
}

#[tokio::test]
async fn test_anonymous_cart_survives_restart() {
    let backend = InMemoryBackend::new();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cart.json");

    let first = resolver(&backend, Arc::new(FileCartPointerStore::new(&path)))
        .resolve_cart(None)
        .await
        .unwrap();

    // A fresh process reads the same pointer file.
    let second = resolver(&backend, Arc::new(FileCartPointerStore::new(&path)))
        .resolve_cart(None)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(backend.carts().len(), 1);
    assert_eq!(
        backend
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::CreateCart(_)))
            .count(),
        1
    );
}

#[tokio::test]
async fn test_logged_in_user_gets_their_existing_cart() {
    let backend = InMemoryBackend::new();
    let anonymous = backend.seed_cart(None);
    let owned = backend.seed_cart(Some(42));
    let pointer = Arc::new(MemoryCartPointerStore::with_cart(anonymous));

    let resolved = resolver(&backend, pointer.clone())
        .resolve_cart(Some(UserId::new(42)))
        .await
        .unwrap();

    assert_eq!(resolved, owned);
    assert_eq!(pointer.get().unwrap(), Some(owned));
}

#[tokio::test]
async fn test_anonymous_cart_kept_after_login_without_owned_cart() {
    let backend = InMemoryBackend::new();
    let anonymous = backend.seed_cart(None);
    let pointer = Arc::new(MemoryCartPointerStore::with_cart(anonymous));

    let resolved = resolver(&backend, pointer)
        .resolve_cart(Some(UserId::new(7)))
        .await
        .unwrap();

    assert_eq!(resolved, anonymous);
    assert!(!backend.calls().iter().any(|c| matches!(c, Call::CreateCart(_))));
}

#[tokio::test]
async fn test_switching_user_never_reuses_previous_users_cart() {
    let backend = InMemoryBackend::new();
    let dir = tempfile::tempdir().unwrap();
    let pointer: Arc<dyn CartPointerStore> =
        Arc::new(FileCartPointerStore::new(dir.path().join("cart.json")));

    let alice = resolver(&backend, pointer.clone())
        .resolve_cart(Some(UserId::new(1)))
        .await
        .unwrap();
    let bob = resolver(&backend, pointer.clone())
        .resolve_cart(Some(UserId::new(2)))
        .await
        .unwrap();

    assert_ne!(alice, bob);
    assert_eq!(backend.calls().last(), Some(&Call::CreateCart(Some(UserId::new(2)))));
    assert_eq!(pointer.get().unwrap(), Some(bob));

    let bob_cart = backend.carts().into_iter().find(|c| c.id == bob).unwrap();
    assert_eq!(bob_cart.owner(), Some(UserId::new(2)));
}

#[tokio::test]
async fn test_deleted_cart_is_replaced() {
    let backend = InMemoryBackend::new();
    let pointer = Arc::new(MemoryCartPointerStore::new());
    let resolver = resolver(&backend, pointer.clone());

    let first = resolver.resolve_cart(None).await.unwrap();
    backend.seed_cart(Some(9));
    backend.drop_cart(first);

    let second = resolver.resolve_cart(None).await.unwrap();

    assert_ne!(first, second);
    assert_eq!(pointer.get().unwrap(), Some(second));
}

#[tokio::test]
async fn test_outage_never_loses_stored_cart() {
    let backend = InMemoryBackend::new();
    let cart = backend.seed_cart(None);
    let pointer = Arc::new(MemoryCartPointerStore::with_cart(cart));
    let resolver = resolver(&backend, pointer.clone()).with_max_unvalidated_uses(2);

    backend.set_offline(true);
    for _ in 0..4 {
        assert_eq!(resolver.resolve_cart(None).await.unwrap(), cart);
        assert_eq!(pointer.get().unwrap(), Some(cart));
    }

    backend.set_offline(false);
    assert_eq!(resolver.resolve_cart(None).await.unwrap(), cart);
    assert_eq!(pointer.unvalidated_uses(), 0);
    assert_eq!(backend.carts().len(), 1);
}

#[tokio::test]
async fn test_unconfirmed_cart_is_replaced_after_bound() {
    let backend = InMemoryBackend::new();
    let unknown = CartId::new(77);
    let pointer = Arc::new(MemoryCartPointerStore::with_cart(unknown));
    let resolver = resolver(&backend, pointer.clone()).with_max_unvalidated_uses(2);

    // The backend lists no carts at all, so the stored id is never confirmed.
    assert_eq!(resolver.resolve_cart(None).await.unwrap(), unknown);
    assert_eq!(resolver.resolve_cart(None).await.unwrap(), unknown);

    let replacement = resolver.resolve_cart(None).await.unwrap();
    assert_ne!(replacement, unknown);
    assert_eq!(pointer.get().unwrap(), Some(replacement));
    assert_eq!(pointer.unvalidated_uses(), 0);
}

#[tokio::test]
async fn test_validated_use_resets_outage_count() {
    let backend = InMemoryBackend::new();
    let cart = backend.seed_cart(None);
    let pointer = Arc::new(MemoryCartPointerStore::with_cart(cart));
    let resolver = resolver(&backend, pointer.clone()).with_max_unvalidated_uses(1);

    backend.set_offline(true);
    assert_eq!(resolver.resolve_cart(None).await.unwrap(), cart);

    backend.set_offline(false);
    assert_eq!(resolver.resolve_cart(None).await.unwrap(), cart);
    assert_eq!(pointer.unvalidated_uses(), 0);

    backend.set_offline(true);
    assert_eq!(resolver.resolve_cart(None).await.unwrap(), cart);
}

#[tokio::test]
async fn test_resolution_lists_all_carts_once() {
    let backend = InMemoryBackend::new();
    backend.seed_cart(Some(3));
    let pointer = Arc::new(MemoryCartPointerStore::new());

    resolver(&backend, pointer)
        .resolve_cart(Some(UserId::new(3)))
        .await
        .unwrap();

    assert_eq!(backend.calls(), vec![Call::ListCarts(None)]);
}

#[tokio::test]
async fn test_unreadable_pointer_file_is_ignored() {
    let backend = InMemoryBackend::new();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cart.json");
    std::fs::write(&path, "not json").unwrap();

    let resolved = resolver(&backend, Arc::new(FileCartPointerStore::new(&path)))
        .resolve_cart(None)
        .await
        .unwrap();

    assert!(backend.carts().iter().any(|c| c.id == resolved));
    assert_eq!(
        FileCartPointerStore::new(&path).get().unwrap(),
        Some(resolved)
    );
}
