//! Notification intents keyed by transition outcome.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

use crate::workflow::application::IdApplication;
use crate::workflow::types::EntityRef;

/// Named notification templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationTemplate {
    /// Application received.
    Acknowledgment,
    /// Application verified.
    VerificationDone,
    /// Application approved by a senior approver.
    SeniorDone,
    /// Application approved by the final approver.
    FinalDone,
    /// A bid was selected as winner.
    BidApprovedToast,
}

impl NotificationTemplate {
    /// Returns the template name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Acknowledgment => "acknowledgment",
            Self::VerificationDone => "verification-done",
            Self::SeniorDone => "senior-done",
            Self::FinalDone => "final-done",
            Self::BidApprovedToast => "bid-approved-toast",
        }
    }
}

impl fmt::Display for NotificationTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A notification to dispatch. Delivery is fire-and-forget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Template to render.
    pub template: NotificationTemplate,
    /// The entity the notification is about.
    pub entity: EntityRef,
    /// Recipient address, if the template is addressed.
    pub recipient: Option<String>,
    /// Template variables.
    pub payload: Value,
}

impl Notification {
    /// Builds an application notification addressed to the applicant.
    #[must_use]
    pub fn for_application(template: NotificationTemplate, application: &IdApplication) -> Self {
        Self {
            template,
            entity: EntityRef::Application(application.id),
            recipient: Some(application.applicant.email.clone()),
            payload: json!({
                "tracking_number": application.tracking_number,
                "name": application.applicant.name,
                "state": application.state.as_str(),
            }),
        }
    }

    /// Builds the winner toast for one or more approved bids.
    ///
    /// `winners` holds `(vendor name, rfq reference)` pairs.
    #[must_use]
    pub fn winner_toast(entity: EntityRef, winners: &[(&str, &str)]) -> Self {
        let message = match winners {
            [(vendor, rfq)] => {
                let vendor = if vendor.is_empty() { "Vendor" } else { vendor };
                let rfq = if rfq.is_empty() { "RFQ" } else { rfq };
                format!("{vendor} selected as winner for {rfq}.")
            }
            _ => "Selected bid(s) approved as winner.".to_string(),
        };

        Self {
            template: NotificationTemplate::BidApprovedToast,
            entity,
            recipient: None,
            payload: json!({
                "title": "Bid Approved",
                "message": message,
                "type": "success",
            }),
        }
    }
}
