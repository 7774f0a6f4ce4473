//! Fixtures shared by the workflow unit and property tests.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use vetted_shared::types::{ApplicationId, BidId, RfqId, UserId, VendorId};

use crate::workflow::application::{
    Applicant, ApprovalNotes, Gender, IdApplication, PhotoQuality, VerificationChecklist,
    VerificationResult,
};
use crate::workflow::bid::Bid;
use crate::workflow::rfq::Rfq;
use crate::workflow::types::{Actor, ApplicationState, BidState, RfqState};

pub(crate) fn actor() -> Actor {
    Actor::new(
        UserId::from_uuid(uuid::Uuid::from_u128(7)),
        "Grace Ochieng",
    )
}

pub(crate) fn applicant() -> Applicant {
    Applicant {
        name: "Amina Nakato".into(),
        date_of_birth: NaiveDate::from_ymd_opt(1994, 3, 14).unwrap(),
        gender: Gender::Female,
        address: "Plot 4, Kampala Road".into(),
        marital_status: None,
        nationality: Some("ugandan".into()),
        phone: "+256700000001".into(),
        email: "amina@example.com".into(),
        next_of_kin: None,
        next_of_kin_phone: None,
    }
}

pub(crate) fn application_in(state: ApplicationState) -> IdApplication {
    IdApplication {
        id: ApplicationId::new(),
        tracking_number: "NID00001".into(),
        owner_group: None,
        applicant: applicant(),
        state,
        submitted_at: Utc::now(),
        checklist: VerificationChecklist::default(),
        verified_status: false,
        verification_result: VerificationResult::Pending,
        notes: ApprovalNotes::default(),
        audit: None,
        revision: 0,
    }
}

pub(crate) fn complete_checklist() -> VerificationChecklist {
    VerificationChecklist {
        name_match: true,
        address_match: true,
        photo_quality: Some(PhotoQuality::Good),
        lc_present: true,
        lc_valid: true,
    }
}

pub(crate) fn rfq_with(primary_vendor: Option<VendorId>, vendors: Vec<VendorId>) -> Rfq {
    Rfq {
        id: RfqId::new(),
        reference: "RFQ0001".into(),
        description: None,
        requested_by: actor().id,
        bid_deadline: None,
        state: RfqState::Draft,
        primary_vendor,
        vendors,
        winning_bid: None,
        lines: Vec::new(),
        created_at: Utc::now(),
    }
}

pub(crate) fn bid_in(rfq: &Rfq, state: BidState) -> Bid {
    Bid {
        id: BidId::new(),
        rfq_id: rfq.id,
        vendor_id: VendorId::new(),
        product_qty: Decimal::ONE,
        price_unit: Decimal::new(1000, 2),
        price_total: Decimal::new(1000, 2),
        currency: "UGX".into(),
        date_expected: None,
        note: None,
        state,
        audit: None,
    }
}
