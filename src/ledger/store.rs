use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::{watch, Mutex};

/// A would-be buyer waiting for an item someone else currently owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub owner_name: String,
    pub owner_uid: String,
    pub requested_at: DateTime<Utc>,
}

/// One inventory slot. Exists only while somebody owns it; an item with no
/// owner is simply absent from the map, so an existing item never has an
/// empty `owner_name` and a deleted item can have no queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockItem {
    pub owner_name: String,
    pub owner_uid: String,
    pub claimed_at: DateTime<Utc>,
    pub price: Option<u32>,
    pub size: Option<String>,
    /// How this claim happened ("anchor", "ai", "manual-voice", "queue", ...)
    pub source: String,
    pub queue: Vec<QueueEntry>,
}

/// The "currently displayed item" side-channel for overlay/voice context.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentItem {
    pub id: u32,
    pub price: Option<u32>,
    pub size: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Read model delivered to subscribers on every change.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StockSnapshot {
    pub items: HashMap<u32, StockItem>,
    pub stock_size: u32,
    pub current_item: Option<CurrentItem>,
}

/// Result of a claim attempt. Callers must branch on this; none of these
/// are errors, racing buyers are the normal case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimOutcome {
    /// The caller now owns the item
    Claimed,
    /// The caller already owned it (idempotent no-op)
    AlreadyOwned,
    /// Someone else owns it; the caller joined the tail of the queue
    Queued,
    /// Someone else owns it and the caller was already waiting
    AlreadyQueued,
}

/// What a cancel did, for announcing the hand-off.
#[derive(Debug, Clone, Serialize)]
pub struct CancelOutcome {
    pub previous_owner: String,
    /// Promoted head-of-queue, or None when the item went back to empty
    pub next_owner: Option<String>,
}

/// Non-claiming metadata update.
#[derive(Debug, Clone, Default)]
pub struct ItemUpdate {
    pub price: Option<u32>,
    pub size: Option<String>,
}

/// Transactional inventory storage seam.
///
/// Every mutation is a single-writer read-modify-write inside the store;
/// callers never get to read-then-write the map themselves. The in-memory
/// implementation below stands in for a persistent document store.
#[async_trait::async_trait]
pub trait StockStore: Send + Sync {
    async fn claim(
        &self,
        id: u32,
        owner_name: &str,
        owner_uid: &str,
        price: Option<u32>,
        source: &str,
    ) -> Result<ClaimOutcome>;

    /// Returns None when the item did not exist.
    async fn cancel(&self, id: u32) -> Result<Option<CancelOutcome>>;

    async fn update_fields(&self, id: u32, update: ItemUpdate) -> Result<()>;

    /// Grows the stock size; never shrinks.
    async fn expand_stock_size(&self, new_max: u32) -> Result<()>;

    async fn snapshot(&self) -> StockSnapshot;

    /// Read-model subscription: receives the full snapshot on every change.
    fn subscribe(&self) -> watch::Receiver<StockSnapshot>;
}

/// In-memory [`StockStore`] with a single mutex as the transaction
/// primitive. Two concurrent claims on the same id serialize here, so
/// exactly one wins and the other queues.
pub struct MemoryStockStore {
    state: Mutex<StockSnapshot>,
    updates: watch::Sender<StockSnapshot>,
}

impl MemoryStockStore {
    pub fn new(initial_stock_size: u32) -> Self {
        let snapshot = StockSnapshot {
            items: HashMap::new(),
            stock_size: initial_stock_size,
            current_item: None,
        };
        let (updates, _) = watch::channel(snapshot.clone());
        Self {
            state: Mutex::new(snapshot),
            updates,
        }
    }

    fn publish(&self, state: &StockSnapshot) {
        // send_replace never fails even with zero receivers
        self.updates.send_replace(state.clone());
    }
}

#[async_trait::async_trait]
impl StockStore for MemoryStockStore {
    async fn claim(
        &self,
        id: u32,
        owner_name: &str,
        owner_uid: &str,
        price: Option<u32>,
        source: &str,
    ) -> Result<ClaimOutcome> {
        let mut state = self.state.lock().await;

        let outcome = match state.items.get_mut(&id) {
            None => {
                state.items.insert(
                    id,
                    StockItem {
                        owner_name: owner_name.to_string(),
                        owner_uid: owner_uid.to_string(),
                        claimed_at: Utc::now(),
                        price,
                        size: None,
                        source: source.to_string(),
                        queue: Vec::new(),
                    },
                );
                ClaimOutcome::Claimed
            }
            Some(item) if item.owner_uid == owner_uid => ClaimOutcome::AlreadyOwned,
            Some(item) => {
                if item.queue.iter().any(|entry| entry.owner_uid == owner_uid) {
                    ClaimOutcome::AlreadyQueued
                } else {
                    item.queue.push(QueueEntry {
                        owner_name: owner_name.to_string(),
                        owner_uid: owner_uid.to_string(),
                        requested_at: Utc::now(),
                    });
                    ClaimOutcome::Queued
                }
            }
        };

        self.publish(&state);
        Ok(outcome)
    }

    async fn cancel(&self, id: u32) -> Result<Option<CancelOutcome>> {
        let mut state = self.state.lock().await;

        let Some(item) = state.items.get(&id).cloned() else {
            return Ok(None);
        };

        let outcome = if item.queue.is_empty() {
            state.items.remove(&id);
            CancelOutcome {
                previous_owner: item.owner_name,
                next_owner: None,
            }
        } else {
            // Promote the head of the queue, carrying the item price over
            let next = item.queue[0].clone();
            state.items.insert(
                id,
                StockItem {
                    owner_name: next.owner_name.clone(),
                    owner_uid: next.owner_uid,
                    claimed_at: Utc::now(),
                    price: item.price,
                    size: item.size,
                    source: "queue".to_string(),
                    queue: item.queue[1..].to_vec(),
                },
            );
            CancelOutcome {
                previous_owner: item.owner_name,
                next_owner: Some(next.owner_name),
            }
        };

        self.publish(&state);
        Ok(Some(outcome))
    }

    async fn update_fields(&self, id: u32, update: ItemUpdate) -> Result<()> {
        let mut state = self.state.lock().await;

        if let Some(item) = state.items.get_mut(&id) {
            if update.price.is_some() {
                item.price = update.price;
            }
            if update.size.is_some() {
                item.size = update.size.clone();
            }
        }

        // Mirror to the overlay side-channel even if the item is not
        // claimed yet; the seller often announces price before anyone buys
        if update.price.is_some() || update.size.is_some() {
            state.current_item = Some(CurrentItem {
                id,
                price: update.price,
                size: update.size,
                updated_at: Utc::now(),
            });
        }

        self.publish(&state);
        Ok(())
    }

    async fn expand_stock_size(&self, new_max: u32) -> Result<()> {
        let mut state = self.state.lock().await;
        if new_max > state.stock_size {
            state.stock_size = new_max;
            self.publish(&state);
        }
        Ok(())
    }

    async fn snapshot(&self) -> StockSnapshot {
        self.state.lock().await.clone()
    }

    fn subscribe(&self) -> watch::Receiver<StockSnapshot> {
        self.updates.subscribe()
    }
}
