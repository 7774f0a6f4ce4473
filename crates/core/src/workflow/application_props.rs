//! Property-based tests for ApplicationWorkflow.
//!
//! These tests check the application state machine against randomized
//! states, checklists and notes using proptest.

use proptest::prelude::*;

use crate::workflow::application::{
    ApplicationWorkflow, PhotoQuality, VerificationChecklist, VerificationResult,
};
use crate::workflow::changes::Mutation;
use crate::workflow::error::ErrorKind;
use crate::workflow::testing::{actor, application_in};
use crate::workflow::types::ApplicationState;

const DECLARED_ORDER: [&str; 6] = [
    "Verification Notes",
    "Name Match",
    "Address Match",
    "Photo Quality",
    "LC Letter Present",
    "LC Letter Valid",
];

/// Strategy for generating random ApplicationState values.
fn arb_state() -> impl Strategy<Value = ApplicationState> {
    prop_oneof![
        Just(ApplicationState::Draft),
        Just(ApplicationState::Verified),
        Just(ApplicationState::SeniorApproved),
        Just(ApplicationState::FinalApproved),
        Just(ApplicationState::Rejected),
    ]
}

/// Strategy for generating random checklists.
fn arb_checklist() -> impl Strategy<Value = VerificationChecklist> {
    (
        any::<bool>(),
        any::<bool>(),
        prop_oneof![
            Just(None),
            Just(Some(PhotoQuality::Good)),
            Just(Some(PhotoQuality::Acceptable)),
            Just(Some(PhotoQuality::Poor)),
        ],
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(
            |(name_match, address_match, photo_quality, lc_present, lc_valid)| {
                VerificationChecklist {
                    name_match,
                    address_match,
                    photo_quality,
                    lc_present,
                    lc_valid,
                }
            },
        )
}

/// Strategy for optional notes, including blank ones.
fn arb_notes() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        Just(Some("   ".to_string())),
        "[a-zA-Z0-9 ]{1,60}".prop_map(Some),
    ]
}

fn has_text(notes: Option<&String>) -> bool {
    notes.is_some_and(|n| !n.trim().is_empty())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Transitions outside the table fail with a validation error.
    #[test]
    fn prop_illegal_transitions_are_validation_errors(
        state in arb_state(),
        notes in "[a-z]{1,20}",
    ) {
        let app = application_in(state);
        let actor = actor();

        let results = [
            (ApplicationState::Verified, ApplicationWorkflow::verify(&app, Some(notes.clone()), &actor).map(|p| p.transition)),
            (ApplicationState::SeniorApproved, ApplicationWorkflow::senior_approve(&app, Some(notes.clone()), &actor).map(|p| p.transition)),
            (ApplicationState::FinalApproved, ApplicationWorkflow::final_approve(&app, Some(notes.clone()), &actor).map(|p| p.transition)),
            (ApplicationState::Rejected, ApplicationWorkflow::reject(&app, None, &actor).map(|p| p.transition)),
        ];

        for (target, result) in results {
            if ApplicationWorkflow::is_valid_transition(state, target) {
                // Verify may still fail on the empty checklist; it must not fail on state.
                if let Err(err) = &result {
                    prop_assert_eq!(target, ApplicationState::Verified);
                    prop_assert!(!err.missing_fields().is_empty());
                }
            } else {
                let err = result.unwrap_err();
                prop_assert_eq!(err.kind(), ErrorKind::Validation);
                prop_assert!(err.missing_fields().is_empty());
            }
        }
        prop_assert_eq!(app.state, state);
    }

    /// Verify succeeds exactly when every required field is present.
    #[test]
    fn prop_verify_requires_complete_checklist(
        checklist in arb_checklist(),
        notes in arb_notes(),
    ) {
        let mut app = application_in(ApplicationState::Draft);
        app.checklist = checklist;

        let complete = has_text(notes.as_ref())
            && checklist.name_match
            && checklist.address_match
            && checklist.photo_quality.is_some()
            && checklist.lc_present
            && checklist.lc_valid;

        let result = ApplicationWorkflow::verify(&app, notes, &actor());
        prop_assert_eq!(result.is_ok(), complete);

        if let Ok(plan) = result {
            prop_assert_eq!(plan.transition.to, ApplicationState::Verified);
            let Mutation::SaveApplication(saved) = &plan.changes.mutations()[0] else {
                panic!("Expected SaveApplication");
            };
            prop_assert!(saved.verified_status);
            prop_assert_eq!(saved.verification_result, VerificationResult::Pass);
        }
    }

    /// Missing fields come back in declared order, without duplicates.
    #[test]
    fn prop_missing_fields_follow_declared_order(
        checklist in arb_checklist(),
        notes in arb_notes(),
    ) {
        let mut app = application_in(ApplicationState::Draft);
        app.checklist = checklist;

        if let Err(err) = ApplicationWorkflow::verify(&app, notes, &actor()) {
            let positions: Vec<usize> = err
                .missing_fields()
                .iter()
                .map(|field| DECLARED_ORDER.iter().position(|d| d == field).unwrap())
                .collect();
            prop_assert!(!positions.is_empty());
            prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
            prop_assert_eq!(
                err.missing_fields().contains(&"LC Letter Valid"),
                checklist.lc_present && !checklist.lc_valid
            );
        }
    }

    /// Every applied transition stamps the acting user.
    #[test]
    fn prop_transitions_stamp_actor(state in arb_state()) {
        let app = application_in(state);
        if let Ok(plan) = ApplicationWorkflow::reject(&app, None, &actor()) {
            let Mutation::SaveApplication(saved) = &plan.changes.mutations()[0] else {
                panic!("Expected SaveApplication");
            };
            prop_assert_eq!(saved.audit.map(|a| a.acted_by), Some(actor().id));
            prop_assert_eq!(saved.state, ApplicationState::Rejected);
        } else {
            prop_assert!(state.is_terminal());
        }
    }
}
