//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use vetted_core::intake::{NewApplication, NewRfq};
use vetted_core::workflow::{
    Actor, ApprovalNotes, Bid, Gender, IdApplication, NewBid, PhotoQuality, Rfq, Vendor,
    VerificationChecklist,
};
use vetted_engine::{ApprovalWorkflowEngine, InMemoryStore, RecordingNotifier};
use vetted_shared::types::UserId;
use vetted_shared::{AppConfig, LosingBidState};

pub type TestEngine = ApprovalWorkflowEngine<InMemoryStore, RecordingNotifier>;

pub struct Harness {
    pub engine: TestEngine,
    pub store: Arc<InMemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub actor: Actor,
}

pub fn harness() -> Harness {
    harness_with(AppConfig::default(), RecordingNotifier::new())
}

pub fn harness_losing_as_lost() -> Harness {
    let mut config = AppConfig::default();
    config.workflow.losing_bid_state = LosingBidState::Lost;
    harness_with(config, RecordingNotifier::new())
}

pub fn harness_with(config: AppConfig, notifier: RecordingNotifier) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let notifier = Arc::new(notifier);
    Harness {
        engine: ApprovalWorkflowEngine::new(Arc::clone(&store), Arc::clone(&notifier), &config),
        store,
        notifier,
        actor: Actor::new(UserId::new(), "Grace Ochieng"),
    }
}

pub fn new_application() -> NewApplication {
    NewApplication {
        name: "amina nakato".into(),
        date_of_birth: NaiveDate::from_ymd_opt(1994, 3, 14).unwrap(),
        gender: Gender::Female,
        address: "Plot 4, Kampala Road".into(),
        marital_status: None,
        nationality: Some("ugandan".into()),
        phone: "+256700000001".into(),
        email: "amina@example.com".into(),
        next_of_kin: Some("peter okello".into()),
        next_of_kin_phone: Some("+256700000002".into()),
        owner_group: None,
    }
}

pub fn complete_checklist() -> VerificationChecklist {
    VerificationChecklist {
        name_match: true,
        address_match: true,
        photo_quality: Some(PhotoQuality::Good),
        lc_present: true,
        lc_valid: true,
    }
}

impl Harness {
    /// Submits an application and fills in a complete checklist.
    pub async fn ready_application(&self) -> IdApplication {
        let app = self
            .engine
            .submit_application(new_application(), &self.actor)
            .await
            .unwrap();
        self.engine
            .record_checklist(
                app.id,
                complete_checklist(),
                ApprovalNotes::default(),
                &[],
                &self.actor,
            )
            .await
            .unwrap()
    }

    pub async fn vendor(&self, name: &str) -> Vendor {
        self.engine.register_vendor(name).await.unwrap()
    }

    pub async fn rfq(&self, vendors: &[&Vendor]) -> Rfq {
        self.engine
            .create_rfq(
                NewRfq {
                    description: Some("Office chairs".into()),
                    vendors: vendors.iter().map(|v| v.id).collect(),
                    ..NewRfq::default()
                },
                &self.actor,
            )
            .await
            .unwrap()
    }

    pub async fn bid(&self, rfq: &Rfq, vendor: &Vendor) -> Bid {
        self.engine
            .create_bid(
                NewBid {
                    rfq_id: rfq.id,
                    vendor_id: vendor.id,
                    product_qty: dec!(4),
                    price_unit: dec!(150.00),
                    price_total: dec!(600.00),
                    currency: "UGX".into(),
                    date_expected: None,
                    note: None,
                },
                &self.actor,
            )
            .await
            .unwrap()
    }

    /// Places a bid and submits it for review.
    pub async fn bid_in_review(&self, rfq: &Rfq, vendor: &Vendor) -> Bid {
        let bid = self.bid(rfq, vendor).await;
        self.engine
            .submit_bid_for_review(bid.id, &self.actor)
            .await
            .unwrap();
        self.engine.bid(bid.id).await.unwrap()
    }
}
