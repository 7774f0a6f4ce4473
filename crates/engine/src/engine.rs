//! The approval workflow engine.
//!
//! Every operation follows the same shape: load a snapshot from the store,
//! let the matching `vetted-core` service validate it and plan the writes,
//! commit the plan's change set in one call, then dispatch notifications.
//! Nothing is written when validation fails.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};
use vetted_core::intake::{
    IntakeService, NewApplication, NewRfq, ReviewerRole, format_reference, is_readonly,
};
use vetted_core::workflow::{
    Actor, ApplicationState, ApplicationWorkflow, ApprovalNotes, Bid, BidState, BidWorkflow,
    ChangeSet, EntityRef, HistoryEntry, IdApplication, Mutation, NewBid, Notification, Plan, Rfq,
    RfqSnapshot, RfqState, RfqWorkflow, Transition, Vendor, VerificationChecklist, WorkflowError,
};
use vetted_shared::types::{ApplicationId, BidId, RfqId, VendorId};
use vetted_shared::{AppConfig, IntakeConfig};

use crate::notify::Notifier;
use crate::store::{SequenceKey, WorkflowStore};

/// Result type of engine operations.
pub type EngineResult<T> = Result<T, WorkflowError>;

/// Drives ID applications, bids and RFQs through their lifecycles.
pub struct ApprovalWorkflowEngine<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    losing_state: BidState,
    prune_vendors: bool,
    intake: IntakeConfig,
}

impl<S: WorkflowStore, N: Notifier> ApprovalWorkflowEngine<S, N> {
    /// Creates an engine over the given collaborators.
    #[must_use]
    pub fn new(store: Arc<S>, notifier: Arc<N>, config: &AppConfig) -> Self {
        Self {
            store,
            notifier,
            losing_state: config.workflow.losing_bid_state.into(),
            prune_vendors: config.workflow.prune_unselected_vendors,
            intake: config.intake.clone(),
        }
    }

    /// The state losing bids are forced into by the winner cascade.
    #[must_use]
    pub fn losing_state(&self) -> BidState {
        self.losing_state
    }

    // ========================================================================
    // ID applications
    // ========================================================================

    /// Creates an application in `draft` and acknowledges it to the applicant.
    pub async fn submit_application(
        &self,
        new: NewApplication,
        actor: &Actor,
    ) -> EngineResult<IdApplication> {
        let number = self.store.next_sequence(SequenceKey::Application).await?;
        let tracking_number = format_reference(
            &self.intake.tracking_prefix,
            self.intake.tracking_width,
            number,
        );

        let (application, plan) = IntakeService::open_application(new, tracking_number);
        self.execute(plan, actor).await?;

        info!(
            application_id = %application.id,
            tracking_number = %application.tracking_number,
            actor = %actor.name,
            "Application submitted"
        );
        Ok(application)
    }

    /// Copies an application into a new `draft` record with a fresh tracking number.
    pub async fn duplicate_application(
        &self,
        id: ApplicationId,
        actor: &Actor,
    ) -> EngineResult<IdApplication> {
        let original = self.application(id).await?;
        let number = self.store.next_sequence(SequenceKey::Application).await?;
        let tracking_number = format_reference(
            &self.intake.tracking_prefix,
            self.intake.tracking_width,
            number,
        );

        let (copy, plan) = IntakeService::duplicate_application(&original, tracking_number);
        self.execute(plan, actor).await?;

        info!(
            source_id = %id,
            application_id = %copy.id,
            tracking_number = %copy.tracking_number,
            "Application duplicated"
        );
        Ok(copy)
    }

    /// Replaces the verification checklist of an application and merges in
    /// the non-blank notes.
    ///
    /// `roles` are the acting user's reviewer roles; a reviewer whose stage
    /// the application has passed gets a validation error.
    pub async fn record_checklist(
        &self,
        id: ApplicationId,
        checklist: VerificationChecklist,
        notes: ApprovalNotes,
        roles: &[ReviewerRole],
        actor: &Actor,
    ) -> EngineResult<IdApplication> {
        let application = self.application(id).await?;
        if is_readonly(roles, application.state) {
            return Err(WorkflowError::ReadOnly {
                id,
                state: application.state.as_str(),
            });
        }

        let plan = ApplicationWorkflow::record_checklist(&application, checklist, notes)?;
        self.execute(plan, actor).await?;
        self.application(id).await
    }

    /// `draft -> verified`.
    pub async fn verify(
        &self,
        id: ApplicationId,
        notes: Option<String>,
        actor: &Actor,
    ) -> EngineResult<ApplicationState> {
        let application = self.application(id).await?;
        let plan = ApplicationWorkflow::verify(&application, notes, actor)?;
        self.execute(plan, actor).await
    }

    /// `verified -> senior_approved`.
    pub async fn senior_approve(
        &self,
        id: ApplicationId,
        notes: Option<String>,
        actor: &Actor,
    ) -> EngineResult<ApplicationState> {
        let application = self.application(id).await?;
        let plan = ApplicationWorkflow::senior_approve(&application, notes, actor)?;
        self.execute(plan, actor).await
    }

    /// `senior_approved -> final_approved`.
    pub async fn final_approve(
        &self,
        id: ApplicationId,
        notes: Option<String>,
        actor: &Actor,
    ) -> EngineResult<ApplicationState> {
        let application = self.application(id).await?;
        let plan = ApplicationWorkflow::final_approve(&application, notes, actor)?;
        self.execute(plan, actor).await
    }

    /// Rejects an application at any non-terminal stage.
    pub async fn reject_application(
        &self,
        id: ApplicationId,
        reason: Option<String>,
        actor: &Actor,
    ) -> EngineResult<ApplicationState> {
        let application = self.application(id).await?;
        let plan = ApplicationWorkflow::reject(&application, reason, actor)?;
        self.execute(plan, actor).await
    }

    /// Loads an application.
    pub async fn application(&self, id: ApplicationId) -> EngineResult<IdApplication> {
        self.store
            .application(id)
            .await?
            .ok_or(WorkflowError::ApplicationNotFound(id))
    }

    // ========================================================================
    // Vendors and RFQs
    // ========================================================================

    /// Registers a vendor.
    pub async fn register_vendor(&self, name: &str) -> EngineResult<Vendor> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WorkflowError::MissingFields {
                transition: "register vendor",
                fields: vec!["Name"],
            });
        }

        let vendor = Vendor {
            id: VendorId::new(),
            name: name.to_string(),
        };
        self.store
            .commit(ChangeSet::from(vec![Mutation::InsertVendor(vendor.clone())]))
            .await?;
        debug!(vendor_id = %vendor.id, name = %vendor.name, "Vendor registered");
        Ok(vendor)
    }

    /// Creates an RFQ in `draft` with the next reference number.
    pub async fn create_rfq(&self, new: NewRfq, actor: &Actor) -> EngineResult<Rfq> {
        for vendor_id in new.vendors.iter().chain(new.primary_vendor.iter()) {
            self.vendor(*vendor_id).await?;
        }

        let number = self.store.next_sequence(SequenceKey::Rfq).await?;
        let reference = format_reference(&self.intake.rfq_prefix, self.intake.rfq_width, number);
        let rfq = IntakeService::open_rfq(new, reference, actor)?;

        self.store
            .commit(ChangeSet::from(vec![Mutation::InsertRfq(Box::new(
                rfq.clone(),
            ))]))
            .await?;
        info!(
            rfq_id = %rfq.id,
            reference = %rfq.reference,
            vendors = rfq.vendors.len(),
            actor = %actor.name,
            "RFQ created"
        );
        Ok(rfq)
    }

    /// Appends a vendor to an RFQ's vendor list.
    pub async fn add_vendor(&self, rfq_id: RfqId, vendor_id: VendorId) -> EngineResult<Rfq> {
        let rfq = self.rfq(rfq_id).await?;
        self.vendor(vendor_id).await?;

        let mutation = RfqWorkflow::link_vendor(&rfq, vendor_id)?;
        self.store.commit(ChangeSet::from(vec![mutation])).await?;
        debug!(rfq_id = %rfq_id, vendor_id = %vendor_id, "Vendor linked");
        self.rfq(rfq_id).await
    }

    /// `draft -> sent`.
    pub async fn send_rfq(&self, id: RfqId, actor: &Actor) -> EngineResult<RfqState> {
        let rfq = self.rfq(id).await?;
        let plan = RfqWorkflow::send(&rfq)?;
        self.execute(plan, actor).await
    }

    /// Confirms an RFQ with its primary vendor.
    ///
    /// Without a primary vendor the first listed vendor is promoted. With
    /// vendor pruning enabled every other vendor link is removed.
    pub async fn confirm_rfq(&self, id: RfqId, actor: &Actor) -> EngineResult<RfqState> {
        let rfq = self.rfq(id).await?;
        let plan = RfqWorkflow::confirm(&rfq, self.prune_vendors)?;
        debug!(
            rfq_id = %id,
            prune = self.prune_vendors,
            mutations = plan.changes.len(),
            "Planned RFQ confirmation"
        );
        self.execute(plan, actor).await
    }

    /// Cancels an RFQ that has not been confirmed.
    pub async fn cancel_rfq(&self, id: RfqId, actor: &Actor) -> EngineResult<RfqState> {
        let rfq = self.rfq(id).await?;
        let plan = RfqWorkflow::cancel(&rfq)?;
        self.execute(plan, actor).await
    }

    /// Loads an RFQ.
    pub async fn rfq(&self, id: RfqId) -> EngineResult<Rfq> {
        self.store.rfq(id).await?.ok_or(WorkflowError::RfqNotFound(id))
    }

    /// Loads a vendor.
    pub async fn vendor(&self, id: VendorId) -> EngineResult<Vendor> {
        self.store
            .vendor(id)
            .await?
            .ok_or(WorkflowError::VendorNotFound(id))
    }

    // ========================================================================
    // Bids
    // ========================================================================

    /// Places a bid in `draft`.
    pub async fn create_bid(&self, new: NewBid, actor: &Actor) -> EngineResult<Bid> {
        let rfq = self.rfq(new.rfq_id).await?;
        self.vendor(new.vendor_id).await?;
        let bids = self.store.bids_for_rfq(rfq.id).await?;

        let (bid, mutation) = BidWorkflow::place(new, &rfq, &bids)?;
        self.store.commit(ChangeSet::from(vec![mutation])).await?;

        info!(
            bid_id = %bid.id,
            rfq_id = %rfq.id,
            vendor_id = %bid.vendor_id,
            price_total = %bid.price_total,
            actor = %actor.name,
            "Bid placed"
        );
        Ok(bid)
    }

    /// `draft -> review`.
    pub async fn submit_bid_for_review(&self, id: BidId, actor: &Actor) -> EngineResult<BidState> {
        let bid = self.bid(id).await?;
        let plan = BidWorkflow::submit_review(&bid, actor)?;
        self.execute(plan, actor).await
    }

    /// `review -> won`, with the winner cascade and the winner toast.
    pub async fn approve_bid(&self, id: BidId, actor: &Actor) -> EngineResult<BidState> {
        let (bid, rfq, bids) = self.bid_context(id).await?;
        let plan = BidWorkflow::approve(&bid, &rfq, &bids, self.losing_state, actor)?;
        self.trace_cascade(&bid, &plan);

        let vendor = self.vendor_name(bid.vendor_id).await?;
        let state = self.execute(plan, actor).await?;
        self.dispatch(&[Notification::winner_toast(
            EntityRef::Bid(id),
            &[(vendor.as_str(), rfq.reference.as_str())],
        )])
        .await;
        Ok(state)
    }

    /// `review -> rejected`.
    pub async fn reject_bid(&self, id: BidId, actor: &Actor) -> EngineResult<BidState> {
        let bid = self.bid(id).await?;
        let plan = BidWorkflow::reject(&bid, actor)?;
        self.execute(plan, actor).await
    }

    /// `rejected -> draft`.
    pub async fn reset_bid_to_draft(&self, id: BidId, actor: &Actor) -> EngineResult<BidState> {
        let bid = self.bid(id).await?;
        let plan = BidWorkflow::reset_to_draft(&bid, actor)?;
        self.execute(plan, actor).await
    }

    /// Marks one bid as won from any state and posts the winner toast.
    pub async fn set_bid_won(&self, id: BidId, actor: &Actor) -> EngineResult<BidState> {
        let states = self.set_bids_won(&[id], actor).await?;
        Ok(states.first().copied().unwrap_or(BidState::Won))
    }

    /// Marks several bids as won, in order, and posts one winner toast.
    ///
    /// The whole batch is planned up front and committed as one change set,
    /// so either every bid is won or nothing is written. When two of them
    /// share an RFQ the later one ends up as the winner.
    pub async fn set_bids_won(&self, ids: &[BidId], actor: &Actor) -> EngineResult<Vec<BidState>> {
        let mut snapshots: Vec<RfqSnapshot> = Vec::new();
        let mut winners: Vec<(String, String)> = Vec::with_capacity(ids.len());
        for id in ids {
            let bid = self.bid(*id).await?;
            let reference = match snapshots.iter().find(|s| s.rfq.id == bid.rfq_id) {
                Some(snapshot) => snapshot.rfq.reference.clone(),
                None => {
                    let rfq = self.rfq(bid.rfq_id).await?;
                    let bids = self.store.bids_for_rfq(rfq.id).await?;
                    let reference = rfq.reference.clone();
                    snapshots.push(RfqSnapshot { rfq, bids });
                    reference
                }
            };
            winners.push((self.vendor_name(bid.vendor_id).await?, reference));
        }

        let (transitions, changes) =
            BidWorkflow::set_won_batch(ids, &mut snapshots, self.losing_state, actor)?;
        debug!(
            bids = ids.len(),
            rfqs = snapshots.len(),
            losing_state = %self.losing_state,
            mutations = changes.len(),
            "Planned winner batch"
        );
        if !changes.is_empty() {
            self.store.commit(changes).await?;
        }
        for transition in &transitions {
            Self::log_transition(transition, actor);
        }

        if let Some(first) = ids.first() {
            let pairs: Vec<(&str, &str)> = winners
                .iter()
                .map(|(vendor, rfq)| (vendor.as_str(), rfq.as_str()))
                .collect();
            self.dispatch(&[Notification::winner_toast(EntityRef::Bid(*first), &pairs)])
                .await;
        }
        Ok(transitions.iter().map(|transition| transition.to).collect())
    }

    /// Marks a bid as lost.
    pub async fn set_bid_lost(&self, id: BidId, actor: &Actor) -> EngineResult<BidState> {
        let bid = self.bid(id).await?;
        let plan = BidWorkflow::set_lost(&bid, actor)?;
        self.execute(plan, actor).await
    }

    /// Loads a bid.
    pub async fn bid(&self, id: BidId) -> EngineResult<Bid> {
        self.store.bid(id).await?.ok_or(WorkflowError::BidNotFound(id))
    }

    /// Loads every bid on an RFQ.
    pub async fn bids_for_rfq(&self, rfq_id: RfqId) -> EngineResult<Vec<Bid>> {
        self.store.bids_for_rfq(rfq_id).await
    }

    /// Loads the history of an entity, oldest first.
    pub async fn history(&self, entity: EntityRef) -> EngineResult<Vec<HistoryEntry>> {
        self.store.history(entity).await
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn bid_context(&self, id: BidId) -> EngineResult<(Bid, Rfq, Vec<Bid>)> {
        let bid = self.bid(id).await?;
        let rfq = self.rfq(bid.rfq_id).await?;
        let bids = self.store.bids_for_rfq(rfq.id).await?;
        Ok((bid, rfq, bids))
    }

    /// Vendor display name, empty when the vendor record is gone.
    async fn vendor_name(&self, id: VendorId) -> EngineResult<String> {
        Ok(self
            .store
            .vendor(id)
            .await?
            .map(|vendor| vendor.name)
            .unwrap_or_default())
    }

    fn trace_cascade(&self, bid: &Bid, plan: &Plan<BidState>) {
        debug!(
            bid_id = %bid.id,
            rfq_id = %bid.rfq_id,
            losing_state = %self.losing_state,
            mutations = plan.changes.len(),
            "Planned winner cascade"
        );
    }

    /// Commits a plan and dispatches its notifications.
    async fn execute<T>(&self, plan: Plan<T>, actor: &Actor) -> EngineResult<T>
    where
        T: Copy + fmt::Display,
    {
        let Plan {
            transition,
            changes,
            notifications,
        } = plan;

        if !changes.is_empty() {
            self.store.commit(changes).await?;
        }
        Self::log_transition(&transition, actor);

        self.dispatch(&notifications).await;
        Ok(transition.to)
    }

    fn log_transition<T: fmt::Display>(transition: &Transition<T>, actor: &Actor) {
        if transition.applied {
            info!(
                entity = %transition.entity,
                from = %transition.from,
                to = %transition.to,
                actor = %actor.name,
                "Transition committed"
            );
        }
    }

    async fn dispatch(&self, notifications: &[Notification]) {
        for notification in notifications {
            if let Err(err) = self.notifier.dispatch(notification).await {
                warn!(
                    template = %notification.template,
                    entity = %notification.entity,
                    error = %err,
                    "Notification dispatch failed"
                );
            }
        }
    }
}
