//! Persistence port for the workflow engine.
//!
//! The engine reads snapshots through [`WorkflowStore`] and hands every
//! write back as a single [`ChangeSet`]. Implementations must commit a
//! change set all-or-nothing.

mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;
use vetted_core::workflow::{
    Bid, ChangeSet, EntityRef, HistoryEntry, IdApplication, Rfq, Vendor, WorkflowError,
};
use vetted_shared::types::{ApplicationId, BidId, RfqId, VendorId};

/// Named counters used for human-facing references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceKey {
    /// Application tracking numbers.
    Application,
    /// RFQ references.
    Rfq,
}

/// Storage collaborator of the workflow engine.
///
/// Lookups return `Ok(None)` for missing records; the engine maps that to
/// the matching not-found error. `Err` is reserved for storage failures and
/// constraint violations detected at commit time.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Loads an application.
    async fn application(&self, id: ApplicationId)
    -> Result<Option<IdApplication>, WorkflowError>;

    /// Loads a bid.
    async fn bid(&self, id: BidId) -> Result<Option<Bid>, WorkflowError>;

    /// Loads an RFQ.
    async fn rfq(&self, id: RfqId) -> Result<Option<Rfq>, WorkflowError>;

    /// Loads every bid on an RFQ.
    async fn bids_for_rfq(&self, rfq_id: RfqId) -> Result<Vec<Bid>, WorkflowError>;

    /// Loads a vendor.
    async fn vendor(&self, id: VendorId) -> Result<Option<Vendor>, WorkflowError>;

    /// Loads the history of an entity, oldest first.
    async fn history(&self, entity: EntityRef) -> Result<Vec<HistoryEntry>, WorkflowError>;

    /// Allocates the next number of a sequence, starting at 1.
    async fn next_sequence(&self, key: SequenceKey) -> Result<u64, WorkflowError>;

    /// Commits a change set atomically.
    ///
    /// # Errors
    /// * `WorkflowError::DuplicateBid` / `DuplicateVendorLink` on a uniqueness violation
    /// * a not-found error if a mutation targets a missing record
    ///
    /// Nothing is written when an error is returned.
    async fn commit(&self, changes: ChangeSet) -> Result<(), WorkflowError>;
}
