//! Vendor bids and the bid lifecycle.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use vetted_shared::types::{BidId, RfqId, VendorId};

use crate::workflow::cascade::plan_winner_cascade;
use crate::workflow::changes::{ChangeSet, Mutation, Plan};
use crate::workflow::error::WorkflowError;
use crate::workflow::rfq::{Rfq, RfqWorkflow};
use crate::workflow::types::{Actor, AuditStamp, BidState, EntityRef, HistoryEntry, Transition};

/// A vendor's priced response to an RFQ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    /// Unique identifier.
    pub id: BidId,
    /// The RFQ this bid answers.
    pub rfq_id: RfqId,
    /// The bidding vendor.
    pub vendor_id: VendorId,
    /// Offered quantity.
    pub product_qty: Decimal,
    /// Unit price.
    pub price_unit: Decimal,
    /// Total offer, entered by the vendor.
    pub price_total: Decimal,
    /// ISO currency code of the offer.
    pub currency: String,
    /// Expected arrival date.
    pub date_expected: Option<NaiveDate>,
    /// Free-text note.
    pub note: Option<String>,
    /// Workflow state.
    pub state: BidState,
    /// Last action taken on the bid.
    pub audit: Option<AuditStamp>,
}

/// Input for placing a bid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBid {
    /// The RFQ to bid on.
    pub rfq_id: RfqId,
    /// The bidding vendor.
    pub vendor_id: VendorId,
    /// Offered quantity, one when omitted.
    #[serde(default = "default_qty")]
    pub product_qty: Decimal,
    /// Unit price.
    pub price_unit: Decimal,
    /// Total offer.
    pub price_total: Decimal,
    /// ISO currency code.
    pub currency: String,
    /// Expected arrival date.
    pub date_expected: Option<NaiveDate>,
    /// Free-text note.
    pub note: Option<String>,
}

fn default_qty() -> Decimal {
    Decimal::ONE
}

/// An RFQ together with every bid placed on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RfqSnapshot {
    /// The RFQ.
    pub rfq: Rfq,
    /// Its bids, in listing order.
    pub bids: Vec<Bid>,
}

impl RfqSnapshot {
    /// Applies the writes in `mutations` that touch this RFQ or its bids.
    pub fn absorb(&mut self, mutations: &[Mutation]) {
        let rfq_id = self.rfq.id;
        for mutation in mutations {
            match mutation {
                Mutation::SetBidState {
                    bid_id,
                    state,
                    stamp,
                    ..
                } => {
                    if let Some(bid) = self.bids.iter_mut().find(|b| b.id == *bid_id) {
                        bid.state = *state;
                        bid.audit = Some(*stamp);
                    }
                }
                Mutation::InsertBid(bid) if bid.rfq_id == rfq_id => {
                    self.bids.push(bid.as_ref().clone());
                }
                Mutation::LinkVendor {
                    rfq_id: target,
                    vendor_id,
                } if *target == rfq_id && !self.rfq.has_vendor(*vendor_id) => {
                    self.rfq.vendors.push(*vendor_id);
                }
                Mutation::UnlinkVendor {
                    rfq_id: target,
                    vendor_id,
                } if *target == rfq_id => self.rfq.vendors.retain(|v| v != vendor_id),
                Mutation::SetPrimaryVendor {
                    rfq_id: target,
                    vendor_id,
                } if *target == rfq_id => self.rfq.primary_vendor = Some(*vendor_id),
                Mutation::SetWinningBid {
                    rfq_id: target,
                    bid_id,
                } if *target == rfq_id => self.rfq.winning_bid = Some(*bid_id),
                Mutation::SetRfqState {
                    rfq_id: target,
                    state,
                    ..
                } if *target == rfq_id => self.rfq.state = *state,
                _ => {}
            }
        }
    }
}

/// Stateless service for bid transitions.
pub struct BidWorkflow;

impl BidWorkflow {
    /// Place a new bid in `Draft`.
    ///
    /// # Returns
    /// * `Err(WorkflowError::RfqMismatch)` if `new.rfq_id` is not `rfq`
    /// * `Err(WorkflowError::DuplicateBid)` if the vendor already bid on `rfq`
    pub fn place(new: NewBid, rfq: &Rfq, bids: &[Bid]) -> Result<(Bid, Mutation), WorkflowError> {
        let bid = Bid {
            id: BidId::new(),
            rfq_id: new.rfq_id,
            vendor_id: new.vendor_id,
            product_qty: new.product_qty,
            price_unit: new.price_unit,
            price_total: new.price_total,
            currency: new.currency,
            date_expected: new.date_expected,
            note: new.note,
            state: BidState::Draft,
            audit: None,
        };
        if bid.rfq_id != rfq.id {
            return Err(WorkflowError::RfqMismatch {
                bid_id: bid.id,
                rfq_id: rfq.id,
            });
        }
        RfqWorkflow::ensure_bid_unique(rfq.id, bids, bid.vendor_id)?;

        let mutation = Mutation::InsertBid(Box::new(bid.clone()));
        Ok((bid, mutation))
    }

    /// Submit a draft bid for review.
    pub fn submit_review(bid: &Bid, actor: &Actor) -> Result<Plan<BidState>, WorkflowError> {
        Self::ensure_state(bid, "submit for review", &[BidState::Draft])?;
        Ok(Self::state_plan(bid, BidState::Review, actor))
    }

    /// Approve a bid under review, making it the winner of its RFQ.
    pub fn approve(
        bid: &Bid,
        rfq: &Rfq,
        bids: &[Bid],
        losing_state: BidState,
        actor: &Actor,
    ) -> Result<Plan<BidState>, WorkflowError> {
        Self::ensure_state(bid, "approve", &[BidState::Review])?;
        Self::winner_plan(bid, rfq, bids, losing_state, actor)
    }

    /// Reject a bid under review.
    pub fn reject(bid: &Bid, actor: &Actor) -> Result<Plan<BidState>, WorkflowError> {
        Self::ensure_state(bid, "reject", &[BidState::Review])?;
        Ok(Self::state_plan(bid, BidState::Rejected, actor))
    }

    /// Return a rejected bid to draft.
    pub fn reset_to_draft(bid: &Bid, actor: &Actor) -> Result<Plan<BidState>, WorkflowError> {
        Self::ensure_state(bid, "reset to draft", &[BidState::Rejected])?;
        Ok(Self::state_plan(bid, BidState::Draft, actor))
    }

    /// Mark a bid as won from any state.
    ///
    /// A bid that is already won is not written again, but the cascade is
    /// still planned so the RFQ ends up consistent.
    pub fn set_won(
        bid: &Bid,
        rfq: &Rfq,
        bids: &[Bid],
        losing_state: BidState,
        actor: &Actor,
    ) -> Result<Plan<BidState>, WorkflowError> {
        Self::winner_plan(bid, rfq, bids, losing_state, actor)
    }

    /// Mark several bids as won, in order, as one change set.
    ///
    /// Each selection is planned against `snapshots` as left by the previous
    /// ones, so when two bids share an RFQ the later one ends up as the
    /// winner. Nothing is planned when an id is missing from every snapshot.
    ///
    /// # Returns
    /// * `Ok((transitions, changes))` with one transition per id
    /// * `Err(WorkflowError::BidNotFound)` for the first unknown id
    pub fn set_won_batch(
        ids: &[BidId],
        snapshots: &mut [RfqSnapshot],
        losing_state: BidState,
        actor: &Actor,
    ) -> Result<(Vec<Transition<BidState>>, ChangeSet), WorkflowError> {
        let mut transitions = Vec::with_capacity(ids.len());
        let mut changes = ChangeSet::new();

        for id in ids {
            let snapshot = snapshots
                .iter_mut()
                .find(|snapshot| snapshot.bids.iter().any(|bid| bid.id == *id))
                .ok_or(WorkflowError::BidNotFound(*id))?;
            let bid = snapshot
                .bids
                .iter()
                .find(|bid| bid.id == *id)
                .cloned()
                .ok_or(WorkflowError::BidNotFound(*id))?;

            let plan = Self::set_won(&bid, &snapshot.rfq, &snapshot.bids, losing_state, actor)?;
            snapshot.absorb(plan.changes.mutations());
            transitions.push(plan.transition);
            changes.extend(plan.changes);
        }

        Ok((transitions, changes))
    }

    /// Mark a bid as lost.
    pub fn set_lost(bid: &Bid, actor: &Actor) -> Result<Plan<BidState>, WorkflowError> {
        if bid.state == BidState::Lost {
            return Err(Self::invalid(bid, "mark as lost"));
        }
        Ok(Self::state_plan(bid, BidState::Lost, actor))
    }

    /// Check if a user-initiated state transition is valid.
    ///
    /// Forced cascade writes are not covered by this table.
    #[must_use]
    pub fn is_valid_transition(from: BidState, to: BidState) -> bool {
        match (from, to) {
            (BidState::Draft, BidState::Review)
            | (BidState::Review, BidState::Rejected)
            | (BidState::Rejected, BidState::Draft) => true,
            (from, BidState::Won) => from != BidState::Won,
            (from, BidState::Lost) => from != BidState::Lost,
            _ => false,
        }
    }

    fn winner_plan(
        bid: &Bid,
        rfq: &Rfq,
        bids: &[Bid],
        losing_state: BidState,
        actor: &Actor,
    ) -> Result<Plan<BidState>, WorkflowError> {
        let stamp = AuditStamp::now(actor);
        let cascade = plan_winner_cascade(bid, rfq, bids, losing_state, &stamp)?;

        if bid.state == BidState::Won {
            let transition = Transition::unchanged(EntityRef::Bid(bid.id), BidState::Won);
            return Ok(Plan::new(transition, ChangeSet::from(cascade)));
        }

        let mut plan = Self::state_plan_stamped(bid, BidState::Won, actor, stamp);
        plan.changes.extend(cascade);
        Ok(plan)
    }

    fn state_plan(bid: &Bid, to: BidState, actor: &Actor) -> Plan<BidState> {
        Self::state_plan_stamped(bid, to, actor, AuditStamp::now(actor))
    }

    fn state_plan_stamped(
        bid: &Bid,
        to: BidState,
        actor: &Actor,
        stamp: AuditStamp,
    ) -> Plan<BidState> {
        let entity = EntityRef::Bid(bid.id);
        let changes = ChangeSet::from(vec![
            Mutation::SetBidState {
                bid_id: bid.id,
                from: bid.state,
                state: to,
                stamp,
            },
            Mutation::AppendHistory(HistoryEntry::new(
                entity,
                format!("Bid marked as {to} by {}", actor.name),
                &stamp,
            )),
        ]);
        Plan::new(Transition::new(entity, bid.state, to), changes)
    }

    fn ensure_state(
        bid: &Bid,
        transition: &'static str,
        allowed: &[BidState],
    ) -> Result<(), WorkflowError> {
        if allowed.contains(&bid.state) {
            Ok(())
        } else {
            Err(Self::invalid(bid, transition))
        }
    }

    fn invalid(bid: &Bid, transition: &'static str) -> WorkflowError {
        WorkflowError::InvalidTransition {
            entity: EntityRef::Bid(bid.id),
            transition,
            from: bid.state.as_str(),
        }
    }
}
