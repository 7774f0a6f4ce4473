//! Approval workflow management for Vetted.
//!
//! This module implements the ID application and bid lifecycle state
//! machines, the winner cascade and the RFQ confirmation guard.
//!
//! # Modules
//!
//! - `types` - Workflow domain types (states, audit stamps, history, transitions)
//! - `error` - Workflow-specific error types
//! - `application` - ID application records and transitions
//! - `bid` - Bid records and transitions
//! - `rfq` - RFQ records, vendor links and confirmation
//! - `changes` - Mutations and change sets returned by every operation
//! - `notification` - Notification intents

pub mod application;
pub mod bid;
mod cascade;
pub mod changes;
pub mod error;
pub mod notification;
pub mod rfq;
pub mod types;

#[cfg(test)]
mod application_props;
#[cfg(test)]
mod bid_props;
#[cfg(test)]
pub(crate) mod testing;

pub use application::{
    Applicant, ApplicationWorkflow, ApprovalNotes, Gender, IdApplication, MaritalStatus,
    PhotoQuality, VerificationChecklist, VerificationResult,
};
pub use bid::{Bid, BidWorkflow, NewBid, RfqSnapshot};
pub use changes::{ChangeSet, Mutation, Plan};
pub use error::{ErrorKind, WorkflowError};
pub use notification::{Notification, NotificationTemplate};
pub use rfq::{Rfq, RfqLine, RfqWorkflow, Vendor};
pub use types::{
    Actor, ApplicationState, AuditStamp, BidState, EntityRef, HistoryEntry, RfqState, Transition,
};
