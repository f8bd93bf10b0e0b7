use anyhow::Result;
use livesale::ledger::{
    CancelOutcome, ClaimOutcome, ItemUpdate, MemoryStockStore, ProcessingLocks,
    ReservationLedger, StockSnapshot, StockStore,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

fn store() -> Arc<MemoryStockStore> {
    Arc::new(MemoryStockStore::new(70))
}

// ============================================================================
// Store transactions
// ============================================================================

#[tokio::test]
async fn claim_is_idempotent_per_owner() {
    let store = store();

    let first = store
        .claim(12, "Malee", "u1", Some(150), "anchor")
        .await
        .expect("claim failed");
    assert_eq!(first, ClaimOutcome::Claimed);

    // a retried delivery of the same claim changes nothing
    let second = store
        .claim(12, "Malee", "u1", Some(150), "anchor")
        .await
        .expect("claim failed");
    assert_eq!(second, ClaimOutcome::AlreadyOwned);

    let snapshot = store.snapshot().await;
    let item = snapshot.items.get(&12).expect("item missing");
    assert_eq!(item.owner_name, "Malee");
    assert!(item.queue.is_empty(), "no queue entry for the owner");
}

#[tokio::test]
async fn later_claims_join_the_queue_in_order() {
    let store = store();

    store.claim(5, "A", "ua", None, "anchor").await.unwrap();
    let queued = store.claim(5, "B", "ub", None, "anchor").await.unwrap();
    assert_eq!(queued, ClaimOutcome::Queued);
    let again = store.claim(5, "B", "ub", None, "anchor").await.unwrap();
    assert_eq!(again, ClaimOutcome::AlreadyQueued);
    store.claim(5, "C", "uc", None, "anchor").await.unwrap();

    let snapshot = store.snapshot().await;
    let item = snapshot.items.get(&5).expect("item missing");
    let waiters: Vec<_> = item.queue.iter().map(|q| q.owner_name.as_str()).collect();
    assert_eq!(waiters, vec!["B", "C"]);
}

#[tokio::test]
async fn cancel_promotes_the_queue_head() {
    let store = store();

    store.claim(5, "A", "ua", Some(80), "anchor").await.unwrap();
    store.claim(5, "B", "ub", None, "anchor").await.unwrap();
    store.claim(5, "C", "uc", None, "anchor").await.unwrap();

    let outcome = store.cancel(5).await.unwrap().expect("item existed");
    assert_eq!(outcome.previous_owner, "A");
    assert_eq!(outcome.next_owner.as_deref(), Some("B"));

    let snapshot = store.snapshot().await;
    let item = snapshot.items.get(&5).expect("item must survive promotion");
    assert_eq!(item.owner_name, "B");
    assert_eq!(item.source, "queue");
    // the price stays with the item across the hand-off
    assert_eq!(item.price, Some(80));
    let waiters: Vec<_> = item.queue.iter().map(|q| q.owner_name.as_str()).collect();
    assert_eq!(waiters, vec!["C"]);
}

#[tokio::test]
async fn cancel_with_empty_queue_frees_the_item() {
    let store = store();

    store.claim(9, "A", "ua", None, "anchor").await.unwrap();
    let outcome = store.cancel(9).await.unwrap().expect("item existed");
    assert_eq!(outcome.previous_owner, "A");
    assert_eq!(outcome.next_owner, None);

    let snapshot = store.snapshot().await;
    assert!(!snapshot.items.contains_key(&9));
}

#[tokio::test]
async fn cancel_of_unclaimed_item_is_a_noop() {
    let store = store();
    assert!(store.cancel(42).await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_claims_produce_one_owner_and_one_waiter() {
    let store = store();

    let (a, b) = tokio::join!(
        store.claim(7, "A", "ua", None, "anchor"),
        store.claim(7, "B", "ub", None, "anchor"),
    );
    let outcomes = [a.unwrap(), b.unwrap()];

    assert!(
        outcomes.contains(&ClaimOutcome::Claimed),
        "exactly one claim must win: {:?}",
        outcomes
    );
    assert!(
        outcomes.contains(&ClaimOutcome::Queued),
        "the loser must queue: {:?}",
        outcomes
    );

    let snapshot = store.snapshot().await;
    let item = snapshot.items.get(&7).expect("item missing");
    assert_eq!(item.queue.len(), 1);
    assert_ne!(item.owner_uid, item.queue[0].owner_uid);
}

#[tokio::test]
async fn update_fields_mirrors_the_current_item() {
    let store = store();

    store
        .update_fields(
            3,
            ItemUpdate {
                price: Some(120),
                size: Some("XL".to_string()),
            },
        )
        .await
        .unwrap();

    let snapshot = store.snapshot().await;
    // nothing is claimed yet, but the overlay channel has the announcement
    assert!(!snapshot.items.contains_key(&3));
    let current = snapshot.current_item.expect("current item missing");
    assert_eq!(current.id, 3);
    assert_eq!(current.price, Some(120));
    assert_eq!(current.size.as_deref(), Some("XL"));
}

#[tokio::test]
async fn stock_size_never_shrinks() {
    let store = store();

    store.expand_stock_size(90).await.unwrap();
    assert_eq!(store.snapshot().await.stock_size, 90);

    store.expand_stock_size(50).await.unwrap();
    assert_eq!(store.snapshot().await.stock_size, 90);
}

#[tokio::test]
async fn subscribers_see_every_change() {
    let store = store();
    let mut updates = store.subscribe();

    store.claim(12, "Malee", "u1", None, "anchor").await.unwrap();
    updates.changed().await.expect("store dropped");
    assert!(updates.borrow().items.contains_key(&12));
}

// ============================================================================
// Ledger layer
// ============================================================================

#[tokio::test]
async fn processing_locks_serialize_per_id() {
    let locks = ProcessingLocks::new();

    let guard = locks.acquire(7).await;
    assert!(
        tokio::time::timeout(Duration::from_millis(50), locks.acquire(7))
            .await
            .is_err(),
        "same id must wait while held"
    );
    assert!(
        tokio::time::timeout(Duration::from_millis(50), locks.acquire(8))
            .await
            .is_ok(),
        "other ids stay free"
    );

    drop(guard);
    assert!(
        tokio::time::timeout(Duration::from_millis(50), locks.acquire(7))
            .await
            .is_ok(),
        "released on drop"
    );
}

#[tokio::test]
async fn ledger_expands_capacity_for_high_ids() {
    let ledger = ReservationLedger::new(store());

    ledger.ensure_capacity(90).await.unwrap();
    assert_eq!(ledger.store().snapshot().await.stock_size, 90);

    // ids within bounds change nothing
    ledger.ensure_capacity(10).await.unwrap();
    assert_eq!(ledger.store().snapshot().await.stock_size, 90);
}

#[tokio::test]
async fn ledger_claim_passes_through_the_store() {
    let ledger = ReservationLedger::new(store());

    let result = ledger
        .claim(12, "Malee", "u1", Some(150), "anchor")
        .await
        .unwrap();
    assert_eq!(result, ClaimOutcome::Claimed);

    let result = ledger.claim(12, "B", "ub", None, "anchor").await.unwrap();
    assert_eq!(result, ClaimOutcome::Queued);
}

/// Wraps the in-memory store with a slow claim path, the way a remote
/// document store behaves under load.
struct SlowClaimStore {
    inner: MemoryStockStore,
    delay: Duration,
}

#[async_trait::async_trait]
impl StockStore for SlowClaimStore {
    async fn claim(
        &self,
        id: u32,
        owner_name: &str,
        owner_uid: &str,
        price: Option<u32>,
        source: &str,
    ) -> Result<ClaimOutcome> {
        tokio::time::sleep(self.delay).await;
        self.inner.claim(id, owner_name, owner_uid, price, source).await
    }

    async fn cancel(&self, id: u32) -> Result<Option<CancelOutcome>> {
        self.inner.cancel(id).await
    }

    async fn update_fields(&self, id: u32, update: ItemUpdate) -> Result<()> {
        self.inner.update_fields(id, update).await
    }

    async fn expand_stock_size(&self, new_max: u32) -> Result<()> {
        self.inner.expand_stock_size(new_max).await
    }

    async fn snapshot(&self) -> StockSnapshot {
        self.inner.snapshot().await
    }

    fn subscribe(&self) -> watch::Receiver<StockSnapshot> {
        self.inner.subscribe()
    }
}

#[tokio::test]
async fn racing_claims_on_slow_storage_both_reach_the_store() {
    let ledger = ReservationLedger::new(Arc::new(SlowClaimStore {
        inner: MemoryStockStore::new(70),
        delay: Duration::from_millis(100),
    }));

    // two rival buyers hit the same id while storage is mid-flight; the
    // loser must wait its turn and queue, never vanish
    let (a, b) = tokio::join!(
        ledger.claim(7, "A", "ua", None, "anchor"),
        ledger.claim(7, "B", "ub", None, "anchor"),
    );
    let outcomes = [a.unwrap(), b.unwrap()];

    assert!(
        outcomes.contains(&ClaimOutcome::Claimed),
        "exactly one claim must win: {:?}",
        outcomes
    );
    assert!(
        outcomes.contains(&ClaimOutcome::Queued),
        "the other must queue, not disappear: {:?}",
        outcomes
    );

    let snapshot = ledger.store().snapshot().await;
    let item = snapshot.items.get(&7).expect("item missing");
    assert_eq!(item.queue.len(), 1);
}
