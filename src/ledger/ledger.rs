use anyhow::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::info;

use super::store::{CancelOutcome, ClaimOutcome, ItemUpdate, StockStore};

/// Per-item-id exclusion held for the duration of one claim attempt.
///
/// The store transaction serializes the write itself; this lock stretches
/// the exclusion over the whole claim, so a rival buyer racing a slow
/// storage round-trip waits its turn and still reaches the queue instead
/// of being lost. Retried deliveries of the same utterance are harmless
/// either way: the store reports them as `already_owned`/`already_queued`.
#[derive(Default)]
pub struct ProcessingLocks {
    // Never pruned; ids are bounded by the id policy and entries are tiny
    table: Mutex<HashMap<u32, Arc<AsyncMutex<()>>>>,
}

impl ProcessingLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other claim attempt holds this id. The guard frees
    /// the id on every exit path, including errors.
    pub async fn acquire(&self, id: u32) -> OwnedMutexGuard<()> {
        let slot = {
            let mut table = self.table.lock().expect("processing lock table poisoned");
            Arc::clone(table.entry(id).or_default())
        };
        slot.lock_owned().await
    }
}

/// Applies pipeline actions against shared inventory state.
///
/// All mutation goes through the store's transactional primitive; the
/// ledger adds the processing lock, stock-size bookkeeping, and logging.
pub struct ReservationLedger {
    store: Arc<dyn StockStore>,
    locks: ProcessingLocks,
}

impl ReservationLedger {
    pub fn new(store: Arc<dyn StockStore>) -> Self {
        Self {
            store,
            locks: ProcessingLocks::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn StockStore> {
        &self.store
    }

    /// Grow the session stock size when an utterance references an id above
    /// the current bound. Never shrinks.
    pub async fn ensure_capacity(&self, id: u32) -> Result<()> {
        let snapshot = self.store.snapshot().await;
        if id > snapshot.stock_size {
            info!(id, from = snapshot.stock_size, "expanding stock size");
            self.store.expand_stock_size(id).await?;
        }
        Ok(())
    }

    pub async fn claim(
        &self,
        id: u32,
        owner_name: &str,
        owner_uid: &str,
        price: Option<u32>,
        source: &str,
    ) -> Result<ClaimOutcome> {
        let _guard = self.locks.acquire(id).await;

        let outcome = self
            .store
            .claim(id, owner_name, owner_uid, price, source)
            .await?;

        info!(id, owner = owner_name, ?outcome, "claim applied");
        Ok(outcome)
    }

    pub async fn cancel(&self, id: u32) -> Result<Option<CancelOutcome>> {
        let outcome = self.store.cancel(id).await?;
        match &outcome {
            Some(result) => info!(
                id,
                previous = %result.previous_owner,
                next = ?result.next_owner,
                "cancel applied"
            ),
            None => info!(id, "cancel ignored, item does not exist"),
        }
        Ok(outcome)
    }

    pub async fn update_fields(&self, id: u32, update: ItemUpdate) -> Result<()> {
        info!(id, price = ?update.price, size = ?update.size, "updating item fields");
        self.store.update_fields(id, update).await
    }
}
