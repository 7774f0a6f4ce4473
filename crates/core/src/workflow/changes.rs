//! Change sets produced by workflow operations.
//!
//! Workflow services never write anything themselves. They return a
//! [`Plan`]: the resulting transition, every mutation that has to be
//! committed atomically for it, and the notifications to dispatch once the
//! commit succeeded.

use serde::Serialize;
use vetted_shared::types::{BidId, RfqId, VendorId};

use crate::workflow::application::IdApplication;
use crate::workflow::bid::Bid;
use crate::workflow::notification::Notification;
use crate::workflow::rfq::{Rfq, Vendor};
use crate::workflow::types::{AuditStamp, BidState, HistoryEntry, RfqState, Transition};

/// A single intended write.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    /// Insert or overwrite an application record.
    ///
    /// A new record carries revision 0. An overwrite carries the stored
    /// revision plus one and is refused when the stored record moved on.
    SaveApplication(Box<IdApplication>),
    /// Insert a new bid. Subject to the (RFQ, vendor) uniqueness constraint.
    InsertBid(Box<Bid>),
    /// Write a bid's state and audit stamp.
    SetBidState {
        /// The bid.
        bid_id: BidId,
        /// State the write was planned from.
        from: BidState,
        /// New state.
        state: BidState,
        /// Audit stamp of the write.
        stamp: AuditStamp,
    },
    /// Insert a new RFQ.
    InsertRfq(Box<Rfq>),
    /// Register a vendor.
    InsertVendor(Vendor),
    /// Append a vendor to the RFQ's vendor list.
    LinkVendor {
        /// The RFQ.
        rfq_id: RfqId,
        /// The vendor.
        vendor_id: VendorId,
    },
    /// Remove a vendor from the RFQ's vendor list.
    UnlinkVendor {
        /// The RFQ.
        rfq_id: RfqId,
        /// The vendor.
        vendor_id: VendorId,
    },
    /// Set the RFQ's primary vendor.
    SetPrimaryVendor {
        /// The RFQ.
        rfq_id: RfqId,
        /// The vendor.
        vendor_id: VendorId,
    },
    /// Record the RFQ's winning bid.
    SetWinningBid {
        /// The RFQ.
        rfq_id: RfqId,
        /// The winning bid.
        bid_id: BidId,
    },
    /// Write the RFQ's state.
    SetRfqState {
        /// The RFQ.
        rfq_id: RfqId,
        /// State the write was planned from.
        from: RfqState,
        /// New state.
        state: RfqState,
    },
    /// Append a history message.
    AppendHistory(HistoryEntry),
}

/// An ordered list of mutations that must be committed all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ChangeSet {
    mutations: Vec<Mutation>,
}

impl ChangeSet {
    /// Creates an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a mutation.
    pub fn push(&mut self, mutation: Mutation) {
        self.mutations.push(mutation);
    }

    /// Appends every mutation of `other`.
    pub fn extend(&mut self, other: impl IntoIterator<Item = Mutation>) {
        self.mutations.extend(other);
    }

    /// Returns the mutations in commit order.
    #[must_use]
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    /// Returns the number of mutations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// Returns true if nothing would be written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

impl IntoIterator for ChangeSet {
    type Item = Mutation;
    type IntoIter = std::vec::IntoIter<Mutation>;

    fn into_iter(self) -> Self::IntoIter {
        self.mutations.into_iter()
    }
}

impl From<Vec<Mutation>> for ChangeSet {
    fn from(mutations: Vec<Mutation>) -> Self {
        Self { mutations }
    }
}

/// The validated result of a workflow operation, not yet committed.
#[derive(Debug, Clone)]
pub struct Plan<S> {
    /// The transition of the targeted entity.
    pub transition: Transition<S>,
    /// Writes to commit atomically.
    pub changes: ChangeSet,
    /// Notifications to dispatch after a successful commit.
    pub notifications: Vec<Notification>,
}

impl<S> Plan<S> {
    /// Creates a plan without notifications.
    #[must_use]
    pub fn new(transition: Transition<S>, changes: ChangeSet) -> Self {
        Self {
            transition,
            changes,
            notifications: Vec::new(),
        }
    }

    /// Adds a notification to dispatch after commit.
    #[must_use]
    pub fn notify(mut self, notification: Notification) -> Self {
        self.notifications.push(notification);
        self
    }
}
