//! Workflow domain types for approvable entity lifecycles.
//!
//! This module defines the state enums for ID applications, bids and RFQs,
//! together with the audit, history and transition types every workflow
//! operation produces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use vetted_shared::LosingBidState;
use vetted_shared::types::{ApplicationId, BidId, RfqId, UserId};

/// ID application status in the approval workflow.
///
/// The valid transitions are:
/// - Draft → Verified (verify)
/// - Verified → SeniorApproved (senior approve)
/// - SeniorApproved → FinalApproved (final approve)
/// - Draft | Verified | SeniorApproved → Rejected (reject)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationState {
    /// Application has been received and awaits verification.
    Draft,
    /// Applicant details have been checked by a verifier.
    Verified,
    /// Approved by a senior approver.
    SeniorApproved,
    /// Approved by the final approver (terminal).
    FinalApproved,
    /// Rejected at some stage (terminal).
    Rejected,
}

impl ApplicationState {
    /// All states, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Draft,
        Self::Verified,
        Self::SeniorApproved,
        Self::FinalApproved,
        Self::Rejected,
    ];

    /// Returns the string representation of the state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Verified => "verified",
            Self::SeniorApproved => "senior_approved",
            Self::FinalApproved => "final_approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a state from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "verified" => Some(Self::Verified),
            "senior_approved" => Some(Self::SeniorApproved),
            "final_approved" => Some(Self::FinalApproved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true if no further transition is defined.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::FinalApproved | Self::Rejected)
    }
}

impl fmt::Display for ApplicationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bid status in the RFQ bidding workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BidState {
    /// Bid is being prepared by the vendor.
    Draft,
    /// Bid has been submitted for review.
    Review,
    /// Bid has been selected as the winner of its RFQ.
    Won,
    /// Bid was turned down during review or lost to another bid.
    Rejected,
    /// Bid was not chosen.
    Lost,
}

impl BidState {
    /// All states.
    pub const ALL: [Self; 5] = [
        Self::Draft,
        Self::Review,
        Self::Won,
        Self::Rejected,
        Self::Lost,
    ];

    /// Returns the string representation of the state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Review => "review",
            Self::Won => "won",
            Self::Rejected => "rejected",
            Self::Lost => "lost",
        }
    }

    /// Parses a state from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "review" => Some(Self::Review),
            "won" => Some(Self::Won),
            "rejected" => Some(Self::Rejected),
            "lost" => Some(Self::Lost),
            _ => None,
        }
    }
}

impl fmt::Display for BidState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<LosingBidState> for BidState {
    fn from(value: LosingBidState) -> Self {
        match value {
            LosingBidState::Rejected => Self::Rejected,
            LosingBidState::Lost => Self::Lost,
        }
    }
}

/// RFQ status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RfqState {
    /// RFQ is open for editing and bids.
    Draft,
    /// RFQ has been sent to vendors.
    Sent,
    /// RFQ has been confirmed with its primary vendor (terminal).
    Confirmed,
    /// RFQ was cancelled (terminal).
    Cancelled,
}

impl RfqState {
    /// Returns the string representation of the state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns true while the RFQ can still be confirmed or cancelled.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Draft | Self::Sent)
    }
}

impl fmt::Display for RfqState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The user performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// User identifier.
    pub id: UserId,
    /// Display name, used in history messages.
    pub name: String,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Who acted last on an entity, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamp {
    /// The acting user.
    pub acted_by: UserId,
    /// When the action happened.
    pub acted_on: DateTime<Utc>,
}

impl AuditStamp {
    /// Stamps an action by `actor` at the current time.
    #[must_use]
    pub fn now(actor: &Actor) -> Self {
        Self {
            acted_by: actor.id,
            acted_on: Utc::now(),
        }
    }
}

/// Reference to any entity the workflow touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum EntityRef {
    /// An ID application.
    Application(ApplicationId),
    /// A vendor bid.
    Bid(BidId),
    /// A request for quotation.
    Rfq(RfqId),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Application(id) => write!(f, "application {id}"),
            Self::Bid(id) => write!(f, "bid {id}"),
            Self::Rfq(id) => write!(f, "rfq {id}"),
        }
    }
}

/// A message logged against an entity's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The entity the message belongs to.
    pub entity: EntityRef,
    /// Message body.
    pub body: String,
    /// The acting user.
    pub actor: UserId,
    /// When the message was posted.
    pub at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Creates a history entry stamped with `stamp`.
    #[must_use]
    pub fn new(entity: EntityRef, body: impl Into<String>, stamp: &AuditStamp) -> Self {
        Self {
            entity,
            body: body.into(),
            actor: stamp.acted_by,
            at: stamp.acted_on,
        }
    }
}

/// Outcome of a transition on one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition<S> {
    /// The entity that transitioned.
    pub entity: EntityRef,
    /// State before the operation.
    pub from: S,
    /// State after the operation.
    pub to: S,
    /// False when the entity already held the target state and no write was made.
    pub applied: bool,
}

impl<S: Copy> Transition<S> {
    /// Creates an applied transition.
    #[must_use]
    pub fn new(entity: EntityRef, from: S, to: S) -> Self {
        Self {
            entity,
            from,
            to,
            applied: true,
        }
    }

    /// Creates a transition that left the entity in `state` without writing it.
    #[must_use]
    pub fn unchanged(entity: EntityRef, state: S) -> Self {
        Self {
            entity,
            from: state,
            to: state,
            applied: false,
        }
    }
}
