//! Demo seeder for Vetted development and testing.
//!
//! Seeds an in-memory store with a reviewer, vendors, an ID application and
//! an RFQ, drives them through both lifecycles and prints a JSON summary.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;
use vetted_core::intake::{NewApplication, NewRfq};
use vetted_core::workflow::{
    Actor, ApprovalNotes, Gender, MaritalStatus, NewBid, PhotoQuality, RfqLine,
    VerificationChecklist,
};
use vetted_engine::{ApprovalWorkflowEngine, InMemoryStore, TracingNotifier};
use vetted_shared::AppConfig;
use vetted_shared::types::UserId;

/// Reviewer ID (consistent across runs)
const REVIEWER_ID: u128 = 2;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let engine = ApprovalWorkflowEngine::new(
        Arc::new(InMemoryStore::new()),
        Arc::new(TracingNotifier),
        &config,
    );
    let reviewer = Actor::new(
        UserId::from_uuid(Uuid::from_u128(REVIEWER_ID)),
        "Test Reviewer",
    );

    info!("Seeding ID application...");
    let application = engine
        .submit_application(
            NewApplication {
                name: "amina nakato".into(),
                date_of_birth: NaiveDate::from_ymd_opt(1994, 3, 14)
                    .context("invalid date of birth")?,
                gender: Gender::Female,
                address: "Plot 4, Kampala Road".into(),
                marital_status: Some(MaritalStatus::Single),
                nationality: Some("Ugandan".into()),
                phone: "+256700000001".into(),
                email: "amina@example.com".into(),
                next_of_kin: Some("peter okello".into()),
                next_of_kin_phone: Some("+256700000002".into()),
                owner_group: None,
            },
            &reviewer,
        )
        .await?;

    engine
        .record_checklist(
            application.id,
            VerificationChecklist {
                name_match: true,
                address_match: true,
                photo_quality: Some(PhotoQuality::Good),
                lc_present: true,
                lc_valid: true,
            },
            ApprovalNotes::default(),
            &[],
            &reviewer,
        )
        .await?;
    engine
        .verify(application.id, Some("Documents checked".into()), &reviewer)
        .await?;
    engine
        .senior_approve(application.id, Some("Identity confirmed".into()), &reviewer)
        .await?;
    engine
        .final_approve(application.id, Some("Approved for issue".into()), &reviewer)
        .await?;

    info!("Seeding vendors and RFQ...");
    let acme = engine.register_vendor("Acme Supplies").await?;
    let globex = engine.register_vendor("Globex").await?;
    let initech = engine.register_vendor("Initech").await?;

    let rfq = engine
        .create_rfq(
            NewRfq {
                description: Some("Office chairs for the records wing".into()),
                vendors: vec![acme.id, globex.id],
                lines: vec![RfqLine {
                    product: Some("Office chair".into()),
                    description: None,
                    product_qty: Decimal::from(12),
                    uom: Some("Units".into()),
                    date_expected: None,
                    note: Some("Adjustable height".into()),
                }],
                ..NewRfq::default()
            },
            &reviewer,
        )
        .await?;
    engine.add_vendor(rfq.id, initech.id).await?;
    engine.send_rfq(rfq.id, &reviewer).await?;

    info!("Seeding bids...");
    let offers = [
        (&acme, Decimal::new(15_000, 2)),
        (&globex, Decimal::new(13_950, 2)),
        (&initech, Decimal::new(16_200, 2)),
    ];
    let mut bid_ids = Vec::with_capacity(offers.len());
    for (vendor, price_unit) in offers {
        let qty = Decimal::from(12);
        let bid = engine
            .create_bid(
                NewBid {
                    rfq_id: rfq.id,
                    vendor_id: vendor.id,
                    product_qty: qty,
                    price_unit,
                    price_total: price_unit * qty,
                    currency: "UGX".into(),
                    date_expected: None,
                    note: None,
                },
                &reviewer,
            )
            .await?;
        engine.submit_bid_for_review(bid.id, &reviewer).await?;
        bid_ids.push(bid.id);
    }

    engine.approve_bid(bid_ids[1], &reviewer).await?;
    engine.confirm_rfq(rfq.id, &reviewer).await?;

    let application = engine.application(application.id).await?;
    let bids = engine.bids_for_rfq(rfq.id).await?;
    let rfq = engine.rfq(rfq.id).await?;
    let summary = json!({
        "application": application,
        "rfq": rfq,
        "bids": bids,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    info!("Seeding complete!");
    Ok(())
}
