//! Property-based tests for BidWorkflow and the winner cascade.
//!
//! Plans are applied to an in-test RFQ snapshot so the RFQ invariants can
//! be checked after one or more winner selections.

use proptest::prelude::*;

use crate::workflow::bid::{Bid, BidWorkflow, RfqSnapshot};
use crate::workflow::changes::Mutation;
use crate::workflow::error::ErrorKind;
use crate::workflow::rfq::Rfq;
use crate::workflow::testing::{actor, bid_in, rfq_with};
use crate::workflow::types::BidState;

/// Strategy for generating random BidState values.
fn arb_state() -> impl Strategy<Value = BidState> {
    prop_oneof![
        Just(BidState::Draft),
        Just(BidState::Review),
        Just(BidState::Won),
        Just(BidState::Rejected),
        Just(BidState::Lost),
    ]
}

/// Strategy for the configured losing state.
fn arb_losing_state() -> impl Strategy<Value = BidState> {
    prop_oneof![Just(BidState::Rejected), Just(BidState::Lost)]
}

/// Builds an RFQ holding one bid per given state.
fn snapshot(states: &[BidState], listed_winner: bool, winner: usize) -> (Rfq, Vec<Bid>) {
    let mut rfq = rfq_with(None, vec![]);
    let bids: Vec<Bid> = states.iter().map(|state| bid_in(&rfq, *state)).collect();
    if listed_winner {
        rfq.vendors.push(bids[winner].vendor_id);
    }
    (rfq, bids)
}

/// Applies the RFQ and bid mutations of a plan to the snapshot.
fn apply(rfq: &mut Rfq, bids: &mut Vec<Bid>, mutations: &[Mutation]) {
    let mut snapshot = RfqSnapshot {
        rfq: rfq.clone(),
        bids: std::mem::take(bids),
    };
    snapshot.absorb(mutations);
    *rfq = snapshot.rfq;
    *bids = snapshot.bids;
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// After set_won, exactly one bid is won and its vendor is primary.
    #[test]
    fn prop_set_won_leaves_exactly_one_winner(
        states in prop::collection::vec(arb_state(), 1..8),
        winner_seed in any::<prop::sample::Index>(),
        listed_winner in any::<bool>(),
        losing in arb_losing_state(),
    ) {
        let winner = winner_seed.index(states.len());
        let (mut rfq, mut bids) = snapshot(&states, listed_winner, winner);
        let target = bids[winner].clone();

        let plan = BidWorkflow::set_won(&target, &rfq, &bids, losing, &actor()).unwrap();
        apply(&mut rfq, &mut bids, plan.changes.mutations());

        let won: Vec<_> = bids.iter().filter(|b| b.state == BidState::Won).collect();
        prop_assert_eq!(won.len(), 1);
        prop_assert_eq!(won[0].id, target.id);
        prop_assert_eq!(rfq.primary_vendor, Some(target.vendor_id));
        prop_assert_eq!(rfq.winning_bid, Some(target.id));
        prop_assert_eq!(
            rfq.vendors.iter().filter(|v| **v == target.vendor_id).count(),
            1
        );
        prop_assert!(bids.iter().filter(|b| b.id != target.id).all(|b| b.state == losing));
    }

    /// A second set_won on the same bid writes nothing new.
    #[test]
    fn prop_set_won_twice_is_stable(
        states in prop::collection::vec(arb_state(), 1..8),
        winner_seed in any::<prop::sample::Index>(),
        losing in arb_losing_state(),
    ) {
        let winner = winner_seed.index(states.len());
        let (mut rfq, mut bids) = snapshot(&states, false, winner);

        let first = BidWorkflow::set_won(&bids[winner].clone(), &rfq, &bids, losing, &actor()).unwrap();
        apply(&mut rfq, &mut bids, first.changes.mutations());
        let (rfq_after_first, bids_after_first) = (rfq.clone(), bids.clone());

        let second = BidWorkflow::set_won(&bids[winner].clone(), &rfq, &bids, losing, &actor()).unwrap();
        prop_assert!(!second.transition.applied);
        let only_pointer_mutations = second.changes.mutations().iter().all(|m| matches!(m, Mutation::SetPrimaryVendor { .. } | Mutation::SetWinningBid { .. }));
        prop_assert!(only_pointer_mutations);

        apply(&mut rfq, &mut bids, second.changes.mutations());
        prop_assert_eq!(rfq, rfq_after_first);
        prop_assert_eq!(bids, bids_after_first);
    }

    /// Every user-initiated transition outside the table is a validation error.
    #[test]
    fn prop_illegal_bid_transitions_fail(state in arb_state()) {
        let rfq = rfq_with(None, vec![]);
        let bid = bid_in(&rfq, state);
        let all = [bid.clone()];
        let actor = actor();

        let results = [
            (BidState::Review, BidWorkflow::submit_review(&bid, &actor)),
            (BidState::Rejected, BidWorkflow::reject(&bid, &actor)),
            (BidState::Draft, BidWorkflow::reset_to_draft(&bid, &actor)),
            (BidState::Lost, BidWorkflow::set_lost(&bid, &actor)),
        ];
        for (target, result) in results {
            match result {
                Ok(plan) => {
                    prop_assert!(BidWorkflow::is_valid_transition(state, target));
                    prop_assert_eq!(plan.transition.to, target);
                }
                Err(err) => {
                    prop_assert!(!BidWorkflow::is_valid_transition(state, target));
                    prop_assert_eq!(err.kind(), ErrorKind::Validation);
                }
            }
        }

        let approve = BidWorkflow::approve(&bid, &rfq, &all, BidState::Rejected, &actor);
        prop_assert_eq!(approve.is_ok(), state == BidState::Review);
        prop_assert_eq!(bid.state, state);
    }
}
