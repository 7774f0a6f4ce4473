//! Integration tests for the bid lifecycle and the winner cascade.

mod common;

use common::{harness, harness_losing_as_lost};
use rust_decimal_macros::dec;
use vetted_core::workflow::{
    BidState, BidWorkflow, EntityRef, ErrorKind, NewBid, NotificationTemplate, WorkflowError,
};
use vetted_shared::types::{BidId, RfqId};

#[tokio::test]
async fn test_approve_selects_single_winner() {
    let h = harness();
    let (acme, globex) = (h.vendor("Acme Supplies").await, h.vendor("Globex").await);
    let rfq = h.rfq(&[&globex]).await;
    let a = h.bid_in_review(&rfq, &acme).await;
    let b = h.bid_in_review(&rfq, &globex).await;

    let state = h.engine.approve_bid(a.id, &h.actor).await.unwrap();
    assert_eq!(state, BidState::Won);

    let bids = h.engine.bids_for_rfq(rfq.id).await.unwrap();
    let won: Vec<_> = bids.iter().filter(|bid| bid.state == BidState::Won).collect();
    assert_eq!(won.len(), 1);
    assert_eq!(won[0].id, a.id);
    assert_eq!(h.engine.bid(b.id).await.unwrap().state, BidState::Rejected);

    let rfq = h.engine.rfq(rfq.id).await.unwrap();
    assert_eq!(rfq.primary_vendor, Some(acme.id));
    assert_eq!(rfq.winning_bid, Some(a.id));
    assert_eq!(rfq.vendors, vec![globex.id, acme.id]);

    let history = h.engine.history(EntityRef::Bid(a.id)).await.unwrap();
    assert_eq!(
        history.last().map(|entry| entry.body.as_str()),
        Some("Bid marked as won by Grace Ochieng")
    );

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].template, NotificationTemplate::BidApprovedToast);
    assert_eq!(sent[0].entity, EntityRef::Bid(a.id));
    assert_eq!(
        sent[0].payload["message"],
        "Acme Supplies selected as winner for RFQ0001."
    );
}

#[tokio::test]
async fn test_reject_planned_before_a_committed_approval_is_refused() {
    let h = harness();
    let (acme, globex) = (h.vendor("Acme Supplies").await, h.vendor("Globex").await);
    let rfq = h.rfq(&[]).await;
    let a = h.bid_in_review(&rfq, &acme).await;
    let b = h.bid_in_review(&rfq, &globex).await;

    let bids = h.engine.bids_for_rfq(rfq.id).await.unwrap();
    let approval =
        BidWorkflow::approve(&a, &rfq, &bids, BidState::Rejected, &h.actor).unwrap();
    h.store.interleave_next_commit(approval.changes).await;

    let err = h.engine.reject_bid(a.id, &h.actor).await.unwrap_err();

    assert_eq!(err, WorkflowError::StaleWrite(EntityRef::Bid(a.id)));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    let states: Vec<_> = h
        .engine
        .bids_for_rfq(rfq.id)
        .await
        .unwrap()
        .into_iter()
        .map(|bid| (bid.id, bid.state))
        .collect();
    assert_eq!(
        states,
        vec![(a.id, BidState::Won), (b.id, BidState::Rejected)]
    );
    let rfq = h.engine.rfq(rfq.id).await.unwrap();
    assert_eq!(rfq.primary_vendor, Some(acme.id));
    assert_eq!(rfq.winning_bid, Some(a.id));
}

#[tokio::test]
async fn test_losing_state_is_configurable() {
    let h = harness_losing_as_lost();
    let (acme, globex) = (h.vendor("Acme Supplies").await, h.vendor("Globex").await);
    let rfq = h.rfq(&[]).await;
    let a = h.bid_in_review(&rfq, &acme).await;
    let b = h.bid(&rfq, &globex).await;

    h.engine.approve_bid(a.id, &h.actor).await.unwrap();

    assert_eq!(h.engine.losing_state(), BidState::Lost);
    assert_eq!(h.engine.bid(b.id).await.unwrap().state, BidState::Lost);
}

#[tokio::test]
async fn test_set_won_twice_is_stable() {
    let h = harness();
    let (acme, globex) = (h.vendor("Acme Supplies").await, h.vendor("Globex").await);
    let rfq = h.rfq(&[]).await;
    let a = h.bid(&rfq, &acme).await;
    h.bid(&rfq, &globex).await;

    h.engine.set_bid_won(a.id, &h.actor).await.unwrap();
    let rfq_once = h.engine.rfq(rfq.id).await.unwrap();
    let bids_once = h.engine.bids_for_rfq(rfq.id).await.unwrap();
    let history_once = h.engine.history(EntityRef::Bid(a.id)).await.unwrap();

    let state = h.engine.set_bid_won(a.id, &h.actor).await.unwrap();

    assert_eq!(state, BidState::Won);
    assert_eq!(h.engine.rfq(rfq.id).await.unwrap(), rfq_once);
    assert_eq!(h.engine.bids_for_rfq(rfq.id).await.unwrap(), bids_once);
    assert_eq!(
        h.engine.history(EntityRef::Bid(a.id)).await.unwrap(),
        history_once
    );
    assert_eq!(rfq_once.vendors, vec![acme.id]);
}

#[tokio::test]
async fn test_set_won_toast_names_vendor_and_rfq() {
    let h = harness();
    let acme = h.vendor("Acme Supplies").await;
    let rfq = h.rfq(&[&acme]).await;
    let bid = h.bid(&rfq, &acme).await;

    h.engine.set_bid_won(bid.id, &h.actor).await.unwrap();

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].payload["title"], "Bid Approved");
    assert_eq!(
        sent[0].payload["message"],
        "Acme Supplies selected as winner for RFQ0001."
    );
    assert_eq!(sent[0].payload["type"], "success");
}

#[tokio::test]
async fn test_set_bids_won_posts_one_toast() {
    let h = harness();
    let acme = h.vendor("Acme Supplies").await;
    let first = h.rfq(&[]).await;
    let second = h.rfq(&[]).await;
    let a = h.bid(&first, &acme).await;
    let b = h.bid(&second, &acme).await;

    let states = h
        .engine
        .set_bids_won(&[a.id, b.id], &h.actor)
        .await
        .unwrap();

    assert_eq!(states, vec![BidState::Won, BidState::Won]);
    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].payload["message"],
        "Selected bid(s) approved as winner."
    );
    assert_eq!(
        h.engine.rfq(second.id).await.unwrap().primary_vendor,
        Some(acme.id)
    );
}

#[tokio::test]
async fn test_set_bids_won_on_shared_rfq_keeps_the_later_bid() {
    let h = harness();
    let (acme, globex) = (h.vendor("Acme Supplies").await, h.vendor("Globex").await);
    let rfq = h.rfq(&[]).await;
    let a = h.bid(&rfq, &acme).await;
    let b = h.bid(&rfq, &globex).await;

    let states = h
        .engine
        .set_bids_won(&[a.id, b.id], &h.actor)
        .await
        .unwrap();

    assert_eq!(states, vec![BidState::Won, BidState::Won]);
    assert_eq!(h.engine.bid(a.id).await.unwrap().state, BidState::Rejected);
    assert_eq!(h.engine.bid(b.id).await.unwrap().state, BidState::Won);
    let rfq = h.engine.rfq(rfq.id).await.unwrap();
    assert_eq!(rfq.primary_vendor, Some(globex.id));
    assert_eq!(rfq.winning_bid, Some(b.id));
    assert_eq!(rfq.vendors, vec![acme.id, globex.id]);
}

#[tokio::test]
async fn test_failed_batch_commit_writes_no_winner() {
    let h = harness();
    let acme = h.vendor("Acme Supplies").await;
    let first = h.rfq(&[]).await;
    let second = h.rfq(&[]).await;
    let a = h.bid(&first, &acme).await;
    let b = h.bid(&second, &acme).await;

    h.store.fail_next_commit();
    let err = h
        .engine
        .set_bids_won(&[a.id, b.id], &h.actor)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(h.engine.bid(a.id).await.unwrap().state, BidState::Draft);
    assert_eq!(h.engine.bid(b.id).await.unwrap().state, BidState::Draft);
    assert_eq!(h.engine.rfq(first.id).await.unwrap().winning_bid, None);
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_set_bids_won_with_unknown_bid_writes_nothing() {
    let h = harness();
    let acme = h.vendor("Acme Supplies").await;
    let rfq = h.rfq(&[]).await;
    let bid = h.bid(&rfq, &acme).await;
    let missing = BidId::new();

    let err = h
        .engine
        .set_bids_won(&[bid.id, missing], &h.actor)
        .await
        .unwrap_err();

    assert_eq!(err, WorkflowError::BidNotFound(missing));
    assert_eq!(h.engine.bid(bid.id).await.unwrap().state, BidState::Draft);
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_failed_cascade_commit_leaves_no_partial_state() {
    let h = harness();
    let (acme, globex) = (h.vendor("Acme Supplies").await, h.vendor("Globex").await);
    let rfq = h.rfq(&[]).await;
    let a = h.bid_in_review(&rfq, &acme).await;
    let b = h.bid_in_review(&rfq, &globex).await;

    h.store.fail_next_commit();
    let err = h.engine.approve_bid(a.id, &h.actor).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(h.engine.bid(a.id).await.unwrap().state, BidState::Review);
    assert_eq!(h.engine.bid(b.id).await.unwrap().state, BidState::Review);
    let rfq = h.engine.rfq(rfq.id).await.unwrap();
    assert_eq!(rfq.primary_vendor, None);
    assert!(rfq.vendors.is_empty());
}

#[tokio::test]
async fn test_second_bid_for_vendor_conflicts() {
    let h = harness();
    let acme = h.vendor("Acme Supplies").await;
    let rfq = h.rfq(&[&acme]).await;
    h.bid(&rfq, &acme).await;

    let err = h
        .engine
        .create_bid(
            NewBid {
                rfq_id: rfq.id,
                vendor_id: acme.id,
                product_qty: dec!(1),
                price_unit: dec!(90.00),
                price_total: dec!(90.00),
                currency: "UGX".into(),
                date_expected: None,
                note: Some("Revised offer".into()),
            },
            &h.actor,
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(h.engine.bids_for_rfq(rfq.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_bid_on_missing_rfq_is_not_found() {
    let h = harness();
    let acme = h.vendor("Acme Supplies").await;
    let rfq_id = RfqId::new();

    let err = h
        .engine
        .create_bid(
            NewBid {
                rfq_id,
                vendor_id: acme.id,
                product_qty: dec!(1),
                price_unit: dec!(10),
                price_total: dec!(10),
                currency: "UGX".into(),
                date_expected: None,
                note: None,
            },
            &h.actor,
        )
        .await
        .unwrap_err();

    assert_eq!(err, WorkflowError::RfqNotFound(rfq_id));
}

#[tokio::test]
async fn test_review_cycle() {
    let h = harness();
    let acme = h.vendor("Acme Supplies").await;
    let rfq = h.rfq(&[&acme]).await;
    let bid = h.bid(&rfq, &acme).await;

    let err = h.engine.approve_bid(bid.id, &h.actor).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    let err = h.engine.reject_bid(bid.id, &h.actor).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    h.engine
        .submit_bid_for_review(bid.id, &h.actor)
        .await
        .unwrap();
    assert_eq!(
        h.engine.reject_bid(bid.id, &h.actor).await.unwrap(),
        BidState::Rejected
    );
    assert_eq!(
        h.engine.reset_bid_to_draft(bid.id, &h.actor).await.unwrap(),
        BidState::Draft
    );
    assert_eq!(
        h.engine.set_bid_lost(bid.id, &h.actor).await.unwrap(),
        BidState::Lost
    );
    assert!(h.engine.set_bid_lost(bid.id, &h.actor).await.is_err());

    let bodies: Vec<String> = h
        .engine
        .history(EntityRef::Bid(bid.id))
        .await
        .unwrap()
        .into_iter()
        .map(|entry| entry.body)
        .collect();
    assert_eq!(
        bodies,
        vec![
            "Bid marked as review by Grace Ochieng",
            "Bid marked as rejected by Grace Ochieng",
            "Bid marked as draft by Grace Ochieng",
            "Bid marked as lost by Grace Ochieng",
        ]
    );
}
