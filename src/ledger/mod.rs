//! Reservation ledger
//!
//! Applies extracted actions against shared inventory state: claim,
//! enqueue, promote, cancel. Per item, the lifecycle is
//! `Empty → Claimed → Claimed (with waiters)`; a cancel either promotes
//! the head of the queue or deletes the item. Concurrency safety comes
//! from the store's single-writer transaction plus a per-id processing
//! lock that serializes overlapping claim attempts on the same item.

mod ledger;
mod store;

pub use ledger::{ProcessingLocks, ReservationLedger};
pub use store::{
    CancelOutcome, ClaimOutcome, CurrentItem, ItemUpdate, MemoryStockStore, QueueEntry,
    StockItem, StockSnapshot, StockStore,
};
