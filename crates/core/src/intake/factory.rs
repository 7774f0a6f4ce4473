//! Building new and duplicated records.
//!
//! Sequence numbers are allocated by the caller; this module only shapes
//! the records and the change sets that insert them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use vetted_shared::types::{ApplicationId, GroupId, RfqId, VendorId};

use crate::intake::naming::normalize_person_name;
use crate::workflow::application::{
    Applicant, ApprovalNotes, Gender, IdApplication, MaritalStatus, VerificationChecklist,
    VerificationResult,
};
use crate::workflow::changes::{ChangeSet, Mutation, Plan};
use crate::workflow::error::WorkflowError;
use crate::workflow::notification::{Notification, NotificationTemplate};
use crate::workflow::rfq::{Rfq, RfqLine};
use crate::workflow::types::{Actor, ApplicationState, EntityRef, RfqState, Transition};

/// Input for a new ID application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewApplication {
    /// Full name as entered.
    pub name: String,
    /// Date of birth.
    pub date_of_birth: NaiveDate,
    /// Gender.
    pub gender: Gender,
    /// Postal address.
    pub address: String,
    /// Marital status.
    #[serde(default)]
    pub marital_status: Option<MaritalStatus>,
    /// Nationality.
    #[serde(default)]
    pub nationality: Option<String>,
    /// Phone number.
    pub phone: String,
    /// Email address.
    pub email: String,
    /// Next of kin as entered.
    #[serde(default)]
    pub next_of_kin: Option<String>,
    /// Next of kin phone number.
    #[serde(default)]
    pub next_of_kin_phone: Option<String>,
    /// Parent grouping.
    #[serde(default)]
    pub owner_group: Option<GroupId>,
}

/// Input for a new RFQ.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRfq {
    /// Purpose of the request.
    pub description: Option<String>,
    /// Deadline for bids.
    pub bid_deadline: Option<DateTime<Utc>>,
    /// Preferred vendor.
    pub primary_vendor: Option<VendorId>,
    /// Invited vendors, in order.
    pub vendors: Vec<VendorId>,
    /// Requested products.
    #[serde(default)]
    pub lines: Vec<RfqLine>,
}

/// Stateless service for creating records.
pub struct IntakeService;

impl IntakeService {
    /// Opens a new application in `Draft` and acknowledges it to the applicant.
    #[must_use]
    pub fn open_application(
        new: NewApplication,
        tracking_number: String,
    ) -> (IdApplication, Plan<ApplicationState>) {
        let application = IdApplication {
            id: ApplicationId::new(),
            tracking_number,
            owner_group: new.owner_group,
            applicant: Applicant {
                name: normalize_person_name(&new.name),
                date_of_birth: new.date_of_birth,
                gender: new.gender,
                address: new.address,
                marital_status: new.marital_status,
                nationality: new.nationality,
                phone: new.phone,
                email: new.email,
                next_of_kin: new
                    .next_of_kin
                    .as_deref()
                    .map(normalize_person_name)
                    .filter(|name| !name.is_empty()),
                next_of_kin_phone: new.next_of_kin_phone,
            },
            state: ApplicationState::Draft,
            submitted_at: Utc::now(),
            checklist: VerificationChecklist::default(),
            verified_status: false,
            verification_result: VerificationResult::Pending,
            notes: ApprovalNotes::default(),
            audit: None,
            revision: 0,
        };

        let plan = Self::insert_plan(&application);
        (application, plan)
    }

    /// Copies an application into a fresh `Draft` record.
    ///
    /// Applicant details, checklist, notes and the verification outcome are
    /// kept. State, tracking number and audit are reset.
    #[must_use]
    pub fn duplicate_application(
        original: &IdApplication,
        tracking_number: String,
    ) -> (IdApplication, Plan<ApplicationState>) {
        let application = IdApplication {
            id: ApplicationId::new(),
            tracking_number,
            state: ApplicationState::Draft,
            submitted_at: Utc::now(),
            audit: None,
            revision: 0,
            ..original.clone()
        };

        let plan = Self::insert_plan(&application);
        (application, plan)
    }

    /// Opens a new RFQ in `Draft`.
    ///
    /// # Returns
    /// * `Err(WorkflowError::DuplicateVendorLink)` if a vendor is listed twice
    pub fn open_rfq(new: NewRfq, reference: String, actor: &Actor) -> Result<Rfq, WorkflowError> {
        let id = RfqId::new();
        for (index, vendor_id) in new.vendors.iter().enumerate() {
            if new.vendors[..index].contains(vendor_id) {
                return Err(WorkflowError::DuplicateVendorLink {
                    rfq_id: id,
                    vendor_id: *vendor_id,
                });
            }
        }

        Ok(Rfq {
            id,
            reference,
            description: new.description,
            requested_by: actor.id,
            bid_deadline: new.bid_deadline,
            state: RfqState::Draft,
            primary_vendor: new.primary_vendor,
            vendors: new.vendors,
            winning_bid: None,
            lines: new.lines,
            created_at: Utc::now(),
        })
    }

    fn insert_plan(application: &IdApplication) -> Plan<ApplicationState> {
        let transition = Transition::unchanged(
            EntityRef::Application(application.id),
            ApplicationState::Draft,
        );
        let changes = ChangeSet::from(vec![Mutation::SaveApplication(Box::new(
            application.clone(),
        ))]);
        Plan::new(transition, changes).notify(Notification::for_application(
            NotificationTemplate::Acknowledgment,
            application,
        ))
    }
}
