//! Workflow error types for approvable entity lifecycles.
//!
//! Every error belongs to one [`ErrorKind`]; callers decide what to show
//! (and whether to resubmit) from the kind, never from the message text.

use thiserror::Error;
use vetted_shared::AppError;
use vetted_shared::types::{ApplicationId, BidId, RfqId, VendorId};

use crate::workflow::types::EntityRef;

/// Broad classification of workflow errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing required fields or an illegal transition.
    Validation,
    /// Uniqueness violation.
    Conflict,
    /// A referenced entity does not exist.
    NotFound,
    /// The persistence collaborator failed.
    Internal,
}

/// Errors that can occur during workflow operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    /// The operation is not legal from the entity's current state.
    #[error("Cannot {transition} {entity}: current state is {from}")]
    InvalidTransition {
        /// The entity the operation targeted.
        entity: EntityRef,
        /// The attempted transition.
        transition: &'static str,
        /// The entity's current state.
        from: &'static str,
    },

    /// Required fields are missing, listed in declaration order.
    #[error("The following fields are required to {transition}: {}", .fields.join(", "))]
    MissingFields {
        /// The attempted transition.
        transition: &'static str,
        /// Every missing field.
        fields: Vec<&'static str>,
    },

    /// The acting reviewer may no longer edit the application.
    #[error("Application {id} is read-only in state {state} for this reviewer")]
    ReadOnly {
        /// The application.
        id: ApplicationId,
        /// The application's current state.
        state: &'static str,
    },

    /// The RFQ has neither a primary vendor nor vendor-list entries.
    #[error("RFQ {0} has no vendors. Please add vendors first")]
    NoVendors(RfqId),

    /// A bid was evaluated against an RFQ it does not belong to.
    #[error("Bid {bid_id} does not belong to RFQ {rfq_id}")]
    RfqMismatch {
        /// The bid.
        bid_id: BidId,
        /// The RFQ it was evaluated against.
        rfq_id: RfqId,
    },

    /// The vendor already has a bid on this RFQ.
    #[error("This vendor already has a bid on this RFQ")]
    DuplicateBid {
        /// The RFQ.
        rfq_id: RfqId,
        /// The vendor.
        vendor_id: VendorId,
    },

    /// The vendor is already linked to this RFQ.
    #[error("This vendor is already linked to this RFQ")]
    DuplicateVendorLink {
        /// The RFQ.
        rfq_id: RfqId,
        /// The vendor.
        vendor_id: VendorId,
    },

    /// The entity changed after the snapshot a write was planned from.
    #[error("{0} was modified by another request, reload and try again")]
    StaleWrite(EntityRef),

    /// Application not found.
    #[error("Application {0} not found")]
    ApplicationNotFound(ApplicationId),

    /// Bid not found.
    #[error("Bid {0} not found")]
    BidNotFound(BidId),

    /// RFQ not found.
    #[error("RFQ {0} not found")]
    RfqNotFound(RfqId),

    /// Vendor not found.
    #[error("Vendor {0} not found")]
    VendorNotFound(VendorId),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl WorkflowError {
    /// Returns the kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTransition { .. }
            | Self::MissingFields { .. }
            | Self::ReadOnly { .. }
            | Self::NoVendors(_)
            | Self::RfqMismatch { .. } => ErrorKind::Validation,

            Self::DuplicateBid { .. }
            | Self::DuplicateVendorLink { .. }
            | Self::StaleWrite(_) => ErrorKind::Conflict,

            Self::ApplicationNotFound(_)
            | Self::BidNotFound(_)
            | Self::RfqNotFound(_)
            | Self::VendorNotFound(_) => ErrorKind::NotFound,

            Self::Storage(_) => ErrorKind::Internal,
        }
    }

    /// Returns the missing fields for a `MissingFields` error, empty otherwise.
    #[must_use]
    pub fn missing_fields(&self) -> &[&'static str] {
        match self {
            Self::MissingFields { fields, .. } => fields,
            _ => &[],
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            ErrorKind::Conflict => 409,
            ErrorKind::NotFound => 404,
            ErrorKind::Internal => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::MissingFields { .. } => "MISSING_FIELDS",
            Self::ReadOnly { .. } => "READ_ONLY",
            Self::NoVendors(_) => "NO_VENDORS",
            Self::RfqMismatch { .. } => "RFQ_MISMATCH",
            Self::DuplicateBid { .. } => "DUPLICATE_BID",
            Self::DuplicateVendorLink { .. } => "DUPLICATE_VENDOR_LINK",
            Self::StaleWrite(_) => "STALE_WRITE",
            Self::ApplicationNotFound(_) => "APPLICATION_NOT_FOUND",
            Self::BidNotFound(_) => "BID_NOT_FOUND",
            Self::RfqNotFound(_) => "RFQ_NOT_FOUND",
            Self::VendorNotFound(_) => "VENDOR_NOT_FOUND",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::Validation => Self::Validation(message),
            ErrorKind::Conflict => Self::Conflict(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::Internal => Self::Storage(message),
        }
    }
}
