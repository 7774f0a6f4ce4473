//! In-memory implementation of [`WorkflowStore`].
//!
//! Commits are applied to a staged copy of the state under the write lock
//! and published only when every mutation succeeded. Writes planned from a
//! snapshot that is no longer current are refused with
//! [`WorkflowError::StaleWrite`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use vetted_core::workflow::{
    Bid, ChangeSet, EntityRef, HistoryEntry, IdApplication, Mutation, Rfq, Vendor, WorkflowError,
};
use vetted_shared::types::{ApplicationId, BidId, RfqId, VendorId};

use super::{SequenceKey, WorkflowStore};

#[derive(Debug, Clone, Default)]
struct StoreState {
    applications: HashMap<ApplicationId, IdApplication>,
    // Insertion order is the listing order.
    bids: Vec<Bid>,
    rfqs: HashMap<RfqId, Rfq>,
    vendors: HashMap<VendorId, Vendor>,
    history: Vec<HistoryEntry>,
    sequences: HashMap<SequenceKey, u64>,
    // Committed ahead of the next change set.
    interleaved: Option<ChangeSet>,
}

impl StoreState {
    fn apply(&mut self, mutation: Mutation) -> Result<(), WorkflowError> {
        match mutation {
            Mutation::SaveApplication(application) => {
                let expected = self
                    .applications
                    .get(&application.id)
                    .map_or(0, |stored| stored.revision + 1);
                if application.revision != expected {
                    return Err(WorkflowError::StaleWrite(EntityRef::Application(
                        application.id,
                    )));
                }
                self.applications.insert(application.id, *application);
            }
            Mutation::InsertBid(bid) => {
                if !self.rfqs.contains_key(&bid.rfq_id) {
                    return Err(WorkflowError::RfqNotFound(bid.rfq_id));
                }
                if !self.vendors.contains_key(&bid.vendor_id) {
                    return Err(WorkflowError::VendorNotFound(bid.vendor_id));
                }
                if self
                    .bids
                    .iter()
                    .any(|b| b.rfq_id == bid.rfq_id && b.vendor_id == bid.vendor_id)
                {
                    return Err(WorkflowError::DuplicateBid {
                        rfq_id: bid.rfq_id,
                        vendor_id: bid.vendor_id,
                    });
                }
                self.bids.push(*bid);
            }
            Mutation::SetBidState {
                bid_id,
                from,
                state,
                stamp,
            } => {
                let bid = self
                    .bids
                    .iter_mut()
                    .find(|b| b.id == bid_id)
                    .ok_or(WorkflowError::BidNotFound(bid_id))?;
                if bid.state != from {
                    return Err(WorkflowError::StaleWrite(EntityRef::Bid(bid_id)));
                }
                bid.state = state;
                bid.audit = Some(stamp);
            }
            Mutation::InsertRfq(rfq) => {
                self.rfqs.insert(rfq.id, *rfq);
            }
            Mutation::InsertVendor(vendor) => {
                self.vendors.insert(vendor.id, vendor);
            }
            Mutation::LinkVendor { rfq_id, vendor_id } => {
                if !self.vendors.contains_key(&vendor_id) {
                    return Err(WorkflowError::VendorNotFound(vendor_id));
                }
                let rfq = self.rfq_mut(rfq_id)?;
                if rfq.has_vendor(vendor_id) {
                    return Err(WorkflowError::DuplicateVendorLink { rfq_id, vendor_id });
                }
                rfq.vendors.push(vendor_id);
            }
            Mutation::UnlinkVendor { rfq_id, vendor_id } => {
                self.rfq_mut(rfq_id)?.vendors.retain(|v| *v != vendor_id);
            }
            Mutation::SetPrimaryVendor { rfq_id, vendor_id } => {
                self.rfq_mut(rfq_id)?.primary_vendor = Some(vendor_id);
            }
            Mutation::SetWinningBid { rfq_id, bid_id } => {
                if !self.bids.iter().any(|b| b.id == bid_id && b.rfq_id == rfq_id) {
                    return Err(WorkflowError::BidNotFound(bid_id));
                }
                self.rfq_mut(rfq_id)?.winning_bid = Some(bid_id);
            }
            Mutation::SetRfqState {
                rfq_id,
                from,
                state,
            } => {
                let rfq = self.rfq_mut(rfq_id)?;
                if rfq.state != from {
                    return Err(WorkflowError::StaleWrite(EntityRef::Rfq(rfq_id)));
                }
                rfq.state = state;
            }
            Mutation::AppendHistory(entry) => self.history.push(entry),
        }
        Ok(())
    }

    fn rfq_mut(&mut self, id: RfqId) -> Result<&mut Rfq, WorkflowError> {
        self.rfqs.get_mut(&id).ok_or(WorkflowError::RfqNotFound(id))
    }

    fn apply_all(&mut self, changes: ChangeSet) -> Result<(), WorkflowError> {
        let mut staged = self.clone();
        for mutation in changes {
            staged.apply(mutation)?;
        }
        *self = staged;
        Ok(())
    }
}

/// A [`WorkflowStore`] held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
    fail_next_commit: AtomicBool,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next commit fail with a storage error without writing anything.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Commits `changes` right before the next commit, as if another request
    /// had won the race to the store.
    pub async fn interleave_next_commit(&self, changes: ChangeSet) {
        self.state.write().await.interleaved = Some(changes);
    }

    /// Returns every bid, in insertion order.
    pub async fn bids(&self) -> Vec<Bid> {
        self.state.read().await.bids.clone()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryStore {
    async fn application(
        &self,
        id: ApplicationId,
    ) -> Result<Option<IdApplication>, WorkflowError> {
        Ok(self.state.read().await.applications.get(&id).cloned())
    }

    async fn bid(&self, id: BidId) -> Result<Option<Bid>, WorkflowError> {
        let state = self.state.read().await;
        Ok(state.bids.iter().find(|b| b.id == id).cloned())
    }

    async fn rfq(&self, id: RfqId) -> Result<Option<Rfq>, WorkflowError> {
        Ok(self.state.read().await.rfqs.get(&id).cloned())
    }

    async fn bids_for_rfq(&self, rfq_id: RfqId) -> Result<Vec<Bid>, WorkflowError> {
        let state = self.state.read().await;
        Ok(state
            .bids
            .iter()
            .filter(|b| b.rfq_id == rfq_id)
            .cloned()
            .collect())
    }

    async fn vendor(&self, id: VendorId) -> Result<Option<Vendor>, WorkflowError> {
        Ok(self.state.read().await.vendors.get(&id).cloned())
    }

    async fn history(&self, entity: EntityRef) -> Result<Vec<HistoryEntry>, WorkflowError> {
        let state = self.state.read().await;
        Ok(state
            .history
            .iter()
            .filter(|entry| entry.entity == entity)
            .cloned()
            .collect())
    }

    async fn next_sequence(&self, key: SequenceKey) -> Result<u64, WorkflowError> {
        let mut state = self.state.write().await;
        let counter = state.sequences.entry(key).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn commit(&self, changes: ChangeSet) -> Result<(), WorkflowError> {
        let mut state = self.state.write().await;
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(WorkflowError::Storage("commit rejected".into()));
        }

        if let Some(competing) = state.interleaved.take() {
            state.apply_all(competing)?;
            debug!("Committed interleaved change set");
        }

        let count = changes.len();
        state.apply_all(changes)?;

        debug!(mutations = count, "Committed change set");
        Ok(())
    }
}
