//! Winner cascade: the sibling and RFQ updates implied by a winning bid.
//!
//! Only the bid transitions that produce a winner call into this module.
//! The cascade is recomputed from the current snapshot every time, so
//! planning it twice for the same winner yields the same RFQ state.

use crate::workflow::bid::Bid;
use crate::workflow::changes::Mutation;
use crate::workflow::error::WorkflowError;
use crate::workflow::rfq::Rfq;
use crate::workflow::types::{AuditStamp, BidState};

/// Plans the cascade for `winner` on `rfq`.
///
/// - every other bid not already in `losing_state` is forced into it
/// - the winner's vendor is appended to the vendor list if missing
/// - the winner's vendor becomes the primary vendor
/// - the winner is recorded as the RFQ's winning bid
pub(crate) fn plan_winner_cascade(
    winner: &Bid,
    rfq: &Rfq,
    bids: &[Bid],
    losing_state: BidState,
    stamp: &AuditStamp,
) -> Result<Vec<Mutation>, WorkflowError> {
    if winner.rfq_id != rfq.id {
        return Err(WorkflowError::RfqMismatch {
            bid_id: winner.id,
            rfq_id: rfq.id,
        });
    }

    let mut mutations: Vec<Mutation> = bids
        .iter()
        .filter(|bid| bid.id != winner.id && bid.state != losing_state)
        .map(|bid| Mutation::SetBidState {
            bid_id: bid.id,
            from: bid.state,
            state: losing_state,
            stamp: *stamp,
        })
        .collect();

    if !rfq.has_vendor(winner.vendor_id) {
        mutations.push(Mutation::LinkVendor {
            rfq_id: rfq.id,
            vendor_id: winner.vendor_id,
        });
    }

    mutations.push(Mutation::SetPrimaryVendor {
        rfq_id: rfq.id,
        vendor_id: winner.vendor_id,
    });
    mutations.push(Mutation::SetWinningBid {
        rfq_id: rfq.id,
        bid_id: winner.id,
    });

    Ok(mutations)
}
