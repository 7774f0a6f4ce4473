//! Record intake: creating applications and RFQs, and who may edit them.
//!
//! # Modules
//!
//! - `naming` - Name normalization and reference numbering
//! - `factory` - Building new and duplicated records
//! - `permissions` - Reviewer role hierarchy and read-only rules

pub mod factory;
pub mod naming;
pub mod permissions;

pub use factory::{IntakeService, NewApplication, NewRfq};
pub use naming::{format_reference, normalize_person_name};
pub use permissions::{ReviewerRole, is_readonly};
