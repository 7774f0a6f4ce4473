//! Approval workflow engine for Vetted.
//!
//! Wraps the pure workflow services of `vetted-core` with the two
//! collaborators they need at runtime:
//! - a [`WorkflowStore`] that loads snapshots and commits change sets atomically
//! - a [`Notifier`] that delivers notification intents after a commit

pub mod engine;
pub mod notify;
pub mod store;

pub use engine::{ApprovalWorkflowEngine, EngineResult};
pub use notify::{Notifier, NotifyError, RecordingNotifier, TracingNotifier};
pub use store::{InMemoryStore, SequenceKey, WorkflowStore};
