//! ID application records and their three-stage approval workflow.
//!
//! Each operation validates the current state first, then the required
//! fields, and returns a [`Plan`] holding the updated record, a history
//! message and the notification for the new stage.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use vetted_shared::types::{ApplicationId, GroupId};

use crate::workflow::changes::{ChangeSet, Mutation, Plan};
use crate::workflow::error::WorkflowError;
use crate::workflow::notification::{Notification, NotificationTemplate};
use crate::workflow::types::{
    Actor, ApplicationState, AuditStamp, EntityRef, HistoryEntry, Transition,
};

/// Applicant gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Male.
    Male,
    /// Female.
    Female,
}

/// Applicant marital status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaritalStatus {
    /// Single.
    Single,
    /// Married.
    Married,
    /// Divorced.
    Divorced,
    /// Widowed.
    Widowed,
}

/// Verifier's assessment of the submitted photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoQuality {
    /// Good.
    Good,
    /// Acceptable.
    Acceptable,
    /// Poor.
    Poor,
}

/// Outcome recorded by the verification step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationResult {
    /// Not yet conclusive.
    #[default]
    Pending,
    /// Name and address both matched.
    Pass,
    /// Verification failed.
    Fail,
}

/// Personal details captured at intake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Applicant {
    /// Full name, title-cased.
    pub name: String,
    /// Date of birth.
    pub date_of_birth: NaiveDate,
    /// Gender.
    pub gender: Gender,
    /// Postal address.
    pub address: String,
    /// Marital status.
    pub marital_status: Option<MaritalStatus>,
    /// Nationality.
    pub nationality: Option<String>,
    /// Phone number.
    pub phone: String,
    /// Email address notifications are sent to.
    pub email: String,
    /// Next of kin, title-cased.
    pub next_of_kin: Option<String>,
    /// Next of kin phone number.
    pub next_of_kin_phone: Option<String>,
}

/// Facts a verifier records before verifying an application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationChecklist {
    /// Name on the documents matches the application.
    pub name_match: bool,
    /// Address on the documents matches the application.
    pub address_match: bool,
    /// Assessed photo quality.
    pub photo_quality: Option<PhotoQuality>,
    /// A letter of consent was submitted.
    pub lc_present: bool,
    /// The letter of consent is valid.
    pub lc_valid: bool,
}

/// Justification text, one per approving transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalNotes {
    /// Required by `verify`.
    pub verification: Option<String>,
    /// Required by `senior_approve`.
    pub senior_approver: Option<String>,
    /// Required by `final_approve`.
    pub final_approver: Option<String>,
}

/// A national ID application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdApplication {
    /// Unique identifier.
    pub id: ApplicationId,
    /// Human-facing tracking number, e.g. `NID00001`.
    pub tracking_number: String,
    /// Parent grouping, if any.
    pub owner_group: Option<GroupId>,
    /// Applicant details.
    pub applicant: Applicant,
    /// Workflow state.
    pub state: ApplicationState,
    /// When the application was received.
    pub submitted_at: DateTime<Utc>,
    /// Verification checklist.
    pub checklist: VerificationChecklist,
    /// Set once the application is verified.
    pub verified_status: bool,
    /// Result of verification.
    pub verification_result: VerificationResult,
    /// Notes per approving transition.
    pub notes: ApprovalNotes,
    /// Last action taken on the application.
    pub audit: Option<AuditStamp>,
    /// Number of committed overwrites, used to refuse stale writes.
    #[serde(default)]
    pub revision: u64,
}

fn has_text(value: Option<&String>) -> bool {
    value.is_some_and(|text| !text.trim().is_empty())
}

/// Stores `notes` in `slot` when they carry text.
fn store_notes(slot: &mut Option<String>, notes: Option<String>) {
    if let Some(text) = notes.filter(|text| !text.trim().is_empty()) {
        *slot = Some(text);
    }
}

/// Stateless service for ID application transitions.
pub struct ApplicationWorkflow;

impl ApplicationWorkflow {
    /// Verify a draft application.
    ///
    /// Notes passed here are stored before the checklist is evaluated.
    ///
    /// # Returns
    /// * `Ok(Plan)` moving the application to `Verified`
    /// * `Err(WorkflowError::InvalidTransition)` if not in `Draft`
    /// * `Err(WorkflowError::MissingFields)` listing every missing field
    pub fn verify(
        application: &IdApplication,
        notes: Option<String>,
        actor: &Actor,
    ) -> Result<Plan<ApplicationState>, WorkflowError> {
        Self::ensure_state(application, "verify", &[ApplicationState::Draft])?;

        let mut updated = application.clone();
        store_notes(&mut updated.notes.verification, notes);

        let missing = Self::missing_verification_fields(&updated);
        if !missing.is_empty() {
            return Err(WorkflowError::MissingFields {
                transition: "verify",
                fields: missing,
            });
        }

        let checklist = updated.checklist;
        updated.verified_status = true;
        updated.verification_result = if checklist.name_match && checklist.address_match {
            VerificationResult::Pass
        } else {
            VerificationResult::Pending
        };

        Ok(Self::plan(
            application,
            updated,
            ApplicationState::Verified,
            None,
            Some(NotificationTemplate::VerificationDone),
            actor,
        ))
    }

    /// Approve a verified application as senior approver.
    pub fn senior_approve(
        application: &IdApplication,
        notes: Option<String>,
        actor: &Actor,
    ) -> Result<Plan<ApplicationState>, WorkflowError> {
        Self::ensure_state(
            application,
            "senior approve",
            &[ApplicationState::Verified],
        )?;

        let mut updated = application.clone();
        store_notes(&mut updated.notes.senior_approver, notes);
        if !has_text(updated.notes.senior_approver.as_ref()) {
            return Err(WorkflowError::MissingFields {
                transition: "senior approve",
                fields: vec!["Senior Approver Notes"],
            });
        }

        let history = format!("Application approved by senior approver {}", actor.name);
        Ok(Self::plan(
            application,
            updated,
            ApplicationState::SeniorApproved,
            Some(history),
            Some(NotificationTemplate::SeniorDone),
            actor,
        ))
    }

    /// Give final approval to a senior-approved application.
    pub fn final_approve(
        application: &IdApplication,
        notes: Option<String>,
        actor: &Actor,
    ) -> Result<Plan<ApplicationState>, WorkflowError> {
        Self::ensure_state(
            application,
            "final approve",
            &[ApplicationState::SeniorApproved],
        )?;

        let mut updated = application.clone();
        store_notes(&mut updated.notes.final_approver, notes);
        if !has_text(updated.notes.final_approver.as_ref()) {
            return Err(WorkflowError::MissingFields {
                transition: "final approve",
                fields: vec!["Final Approver Notes"],
            });
        }

        let history = format!("Application finally approved by {}", actor.name);
        Ok(Self::plan(
            application,
            updated,
            ApplicationState::FinalApproved,
            Some(history),
            Some(NotificationTemplate::FinalDone),
            actor,
        ))
    }

    /// Reject an application at any non-terminal stage.
    ///
    /// A non-empty `reason` is appended to the history message.
    pub fn reject(
        application: &IdApplication,
        reason: Option<String>,
        actor: &Actor,
    ) -> Result<Plan<ApplicationState>, WorkflowError> {
        Self::ensure_state(
            application,
            "reject",
            &[
                ApplicationState::Draft,
                ApplicationState::Verified,
                ApplicationState::SeniorApproved,
            ],
        )?;

        let history = match reason.filter(|text| !text.trim().is_empty()) {
            Some(reason) => format!("Application rejected by {}: {}", actor.name, reason.trim()),
            None => format!("Application rejected by {}", actor.name),
        };
        Ok(Self::plan(
            application,
            application.clone(),
            ApplicationState::Rejected,
            Some(history),
            None,
            actor,
        ))
    }

    /// Replace the verification checklist of a non-terminal application and
    /// merge in the given notes.
    ///
    /// Each notes slot is merged the way transitions store notes, so blank
    /// slots keep what was recorded earlier. This is a field write, not a
    /// transition: the state is unchanged.
    pub fn record_checklist(
        application: &IdApplication,
        checklist: VerificationChecklist,
        notes: ApprovalNotes,
    ) -> Result<Plan<ApplicationState>, WorkflowError> {
        if application.state.is_terminal() {
            return Err(WorkflowError::InvalidTransition {
                entity: EntityRef::Application(application.id),
                transition: "edit",
                from: application.state.as_str(),
            });
        }

        let mut updated = application.clone();
        updated.checklist = checklist;
        updated.revision += 1;
        store_notes(&mut updated.notes.verification, notes.verification);
        store_notes(&mut updated.notes.senior_approver, notes.senior_approver);
        store_notes(&mut updated.notes.final_approver, notes.final_approver);

        let transition = Transition::unchanged(
            EntityRef::Application(application.id),
            application.state,
        );
        let changes = ChangeSet::from(vec![Mutation::SaveApplication(Box::new(updated))]);
        Ok(Plan::new(transition, changes))
    }

    /// Lists every field `verify` still needs, in declaration order.
    #[must_use]
    pub fn missing_verification_fields(application: &IdApplication) -> Vec<&'static str> {
        let checklist = &application.checklist;
        let mut missing = Vec::new();

        if !has_text(application.notes.verification.as_ref()) {
            missing.push("Verification Notes");
        }
        if !checklist.name_match {
            missing.push("Name Match");
        }
        if !checklist.address_match {
            missing.push("Address Match");
        }
        if checklist.photo_quality.is_none() {
            missing.push("Photo Quality");
        }
        if !checklist.lc_present {
            missing.push("LC Letter Present");
        }
        if checklist.lc_present && !checklist.lc_valid {
            missing.push("LC Letter Valid");
        }

        missing
    }

    /// Check if a state transition is valid.
    #[must_use]
    pub fn is_valid_transition(from: ApplicationState, to: ApplicationState) -> bool {
        matches!(
            (from, to),
            (
                ApplicationState::Draft,
                ApplicationState::Verified | ApplicationState::Rejected
            ) | (
                ApplicationState::Verified,
                ApplicationState::SeniorApproved | ApplicationState::Rejected
            ) | (
                ApplicationState::SeniorApproved,
                ApplicationState::FinalApproved | ApplicationState::Rejected
            )
        )
    }

    fn ensure_state(
        application: &IdApplication,
        transition: &'static str,
        allowed: &[ApplicationState],
    ) -> Result<(), WorkflowError> {
        if allowed.contains(&application.state) {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition {
                entity: EntityRef::Application(application.id),
                transition,
                from: application.state.as_str(),
            })
        }
    }

    fn plan(
        original: &IdApplication,
        mut updated: IdApplication,
        to: ApplicationState,
        history: Option<String>,
        template: Option<NotificationTemplate>,
        actor: &Actor,
    ) -> Plan<ApplicationState> {
        let entity = EntityRef::Application(original.id);
        let stamp = AuditStamp::now(actor);
        updated.state = to;
        updated.audit = Some(stamp);
        updated.revision = original.revision + 1;

        let notification =
            template.map(|template| Notification::for_application(template, &updated));

        let mut changes = ChangeSet::new();
        changes.push(Mutation::SaveApplication(Box::new(updated)));
        if let Some(body) = history {
            changes.push(Mutation::AppendHistory(HistoryEntry::new(entity, body, &stamp)));
        }

        let plan = Plan::new(Transition::new(entity, original.state, to), changes);
        match notification {
            Some(notification) => plan.notify(notification),
            None => plan,
        }
    }
}
