//! Core business logic for Vetted.
//!
//! This crate contains pure workflow logic with ZERO storage or transport dependencies.
//! Every operation validates against a snapshot and returns the intended changes;
//! committing them and delivering notifications is left to the caller.
//!
//! # Modules
//!
//! - `workflow` - Application and bid state machines, winner cascade, RFQ guard
//! - `intake` - Record creation, name normalization, reviewer permissions

pub mod intake;
pub mod workflow;
