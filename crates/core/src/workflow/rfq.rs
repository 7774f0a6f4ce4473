//! RFQ records, vendor links and the confirmation guard.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use vetted_shared::types::{BidId, RfqId, UserId, VendorId};

use crate::workflow::bid::Bid;
use crate::workflow::changes::{ChangeSet, Mutation, Plan};
use crate::workflow::error::WorkflowError;
use crate::workflow::types::{EntityRef, RfqState, Transition};

/// A vendor that can be invited to RFQs and place bids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    /// Unique identifier.
    pub id: VendorId,
    /// Display name.
    pub name: String,
}

/// A product requested by an RFQ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfqLine {
    /// Requested product.
    #[serde(default)]
    pub product: Option<String>,
    /// Free-text description of what is needed.
    #[serde(default)]
    pub description: Option<String>,
    /// Requested quantity, one when omitted.
    #[serde(default = "default_line_qty")]
    pub product_qty: Decimal,
    /// Unit of measure.
    #[serde(default)]
    pub uom: Option<String>,
    /// Date the product is needed by.
    #[serde(default)]
    pub date_expected: Option<NaiveDate>,
    /// Notes for vendors.
    #[serde(default)]
    pub note: Option<String>,
}

fn default_line_qty() -> Decimal {
    Decimal::ONE
}

/// A request for quotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rfq {
    /// Unique identifier.
    pub id: RfqId,
    /// Human-facing reference, e.g. `RFQ0001`.
    pub reference: String,
    /// Purpose of the request.
    pub description: Option<String>,
    /// User who raised the request.
    pub requested_by: UserId,
    /// Deadline for bids.
    pub bid_deadline: Option<DateTime<Utc>>,
    /// Workflow state.
    pub state: RfqState,
    /// Vendor the RFQ will be confirmed with.
    pub primary_vendor: Option<VendorId>,
    /// Invited vendors, in stored order.
    pub vendors: Vec<VendorId>,
    /// Bid last selected as winner.
    #[serde(default)]
    pub winning_bid: Option<BidId>,
    /// Requested products.
    #[serde(default)]
    pub lines: Vec<RfqLine>,
    /// When the RFQ was created.
    pub created_at: DateTime<Utc>,
}

impl Rfq {
    /// Returns true if `vendor_id` is on the vendor list.
    #[must_use]
    pub fn has_vendor(&self, vendor_id: VendorId) -> bool {
        self.vendors.contains(&vendor_id)
    }
}

/// Stateless service for RFQ transitions and vendor constraints.
pub struct RfqWorkflow;

impl RfqWorkflow {
    /// Mark a draft RFQ as sent.
    ///
    /// # Returns
    /// * `Err(WorkflowError::NoVendors)` if there is neither a primary vendor nor a vendor list
    pub fn send(rfq: &Rfq) -> Result<Plan<RfqState>, WorkflowError> {
        Self::ensure_state(rfq, "send", &[RfqState::Draft])?;
        if rfq.primary_vendor.is_none() && rfq.vendors.is_empty() {
            return Err(WorkflowError::NoVendors(rfq.id));
        }
        Ok(Self::state_plan(rfq, RfqState::Sent, ChangeSet::new()))
    }

    /// Confirm an open RFQ with its primary vendor.
    ///
    /// Without a primary vendor, the first vendor on the list is promoted.
    /// With `prune` set, every other vendor link is removed. Bids are never touched.
    pub fn confirm(rfq: &Rfq, prune: bool) -> Result<Plan<RfqState>, WorkflowError> {
        Self::ensure_state(rfq, "confirm", &[RfqState::Draft, RfqState::Sent])?;

        let mut changes = ChangeSet::new();
        let primary = match rfq.primary_vendor {
            Some(vendor_id) => vendor_id,
            None => {
                let first = *rfq.vendors.first().ok_or(WorkflowError::NoVendors(rfq.id))?;
                changes.push(Mutation::SetPrimaryVendor {
                    rfq_id: rfq.id,
                    vendor_id: first,
                });
                first
            }
        };

        if prune {
            changes.extend(
                rfq.vendors
                    .iter()
                    .filter(|vendor_id| **vendor_id != primary)
                    .map(|vendor_id| Mutation::UnlinkVendor {
                        rfq_id: rfq.id,
                        vendor_id: *vendor_id,
                    }),
            );
        }

        Ok(Self::state_plan(rfq, RfqState::Confirmed, changes))
    }

    /// Cancel an RFQ that has not been confirmed.
    pub fn cancel(rfq: &Rfq) -> Result<Plan<RfqState>, WorkflowError> {
        Self::ensure_state(rfq, "cancel", &[RfqState::Draft, RfqState::Sent])?;
        Ok(Self::state_plan(rfq, RfqState::Cancelled, ChangeSet::new()))
    }

    /// Link a vendor to an RFQ.
    ///
    /// # Returns
    /// * `Err(WorkflowError::DuplicateVendorLink)` if the vendor is already linked
    pub fn link_vendor(rfq: &Rfq, vendor_id: VendorId) -> Result<Mutation, WorkflowError> {
        if rfq.has_vendor(vendor_id) {
            return Err(WorkflowError::DuplicateVendorLink {
                rfq_id: rfq.id,
                vendor_id,
            });
        }
        Ok(Mutation::LinkVendor {
            rfq_id: rfq.id,
            vendor_id,
        })
    }

    /// Check that `vendor_id` has no bid among `bids` yet.
    pub fn ensure_bid_unique(
        rfq_id: RfqId,
        bids: &[Bid],
        vendor_id: VendorId,
    ) -> Result<(), WorkflowError> {
        if bids
            .iter()
            .any(|bid| bid.rfq_id == rfq_id && bid.vendor_id == vendor_id)
        {
            return Err(WorkflowError::DuplicateBid { rfq_id, vendor_id });
        }
        Ok(())
    }

    fn ensure_state(
        rfq: &Rfq,
        transition: &'static str,
        allowed: &[RfqState],
    ) -> Result<(), WorkflowError> {
        if allowed.contains(&rfq.state) {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition {
                entity: EntityRef::Rfq(rfq.id),
                transition,
                from: rfq.state.as_str(),
            })
        }
    }

    fn state_plan(rfq: &Rfq, to: RfqState, mut changes: ChangeSet) -> Plan<RfqState> {
        changes.push(Mutation::SetRfqState {
            rfq_id: rfq.id,
            from: rfq.state,
            state: to,
        });
        Plan::new(Transition::new(EntityRef::Rfq(rfq.id), rfq.state, to), changes)
    }
}
