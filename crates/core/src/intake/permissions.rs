//! Reviewer roles and read-only rules for applications.

use serde::{Deserialize, Serialize};

use crate::workflow::types::ApplicationState;

/// Reviewer role in the approval hierarchy.
///
/// Roles are ordered from lowest to highest stage. A user holding several
/// roles is governed by the highest one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewerRole {
    /// Performs the verification step.
    Verifier = 0,
    /// Performs the senior approval step.
    Senior = 1,
    /// Performs the final approval step.
    Final = 2,
}

impl ReviewerRole {
    /// Parse a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "verifier" => Some(Self::Verifier),
            "senior" => Some(Self::Senior),
            "final" => Some(Self::Final),
            _ => None,
        }
    }

    /// Returns true once an application in `state` is past this role's stage.
    #[must_use]
    pub fn locks(self, state: ApplicationState) -> bool {
        match self {
            Self::Final => state.is_terminal(),
            Self::Senior => state.is_terminal() || state == ApplicationState::SeniorApproved,
            Self::Verifier => state != ApplicationState::Draft,
        }
    }
}

/// Returns true if a user holding `roles` may not edit an application in `state`.
///
/// Users without any reviewer role are not restricted by this rule.
#[must_use]
pub fn is_readonly(roles: &[ReviewerRole], state: ApplicationState) -> bool {
    roles
        .iter()
        .max()
        .is_some_and(|highest| highest.locks(state))
}
