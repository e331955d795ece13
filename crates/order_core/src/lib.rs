//! Draft-selection core of the lab order entry form.
//!
//! Controllers return commands as values; nothing here talks to a store or a
//! network. [`registry::apply`] executes draft commands against a
//! [`registry::DraftOrderRegistry`], and [`form::LabEntryForm`] ties the
//! controllers together behind a single event entry point.

pub mod category;
pub mod draft_list;
pub mod form;
pub mod registry;
pub mod selection;
pub mod submission;
pub mod toggle;

pub use category::CategorySwitchController;
pub use form::{FieldSetView, FormEvent, FormOptions, LabEntryForm};
pub use registry::{apply, DraftOrderRegistry, InMemoryDraftRegistry};
pub use selection::{reconcile, ReconciliationEngine, SelectionSnapshot};
pub use submission::{on_outcome_changed, SubmissionFlowController, SubmissionPhase};
pub use toggle::{decide, ToggleCommand, ToggleKind, ToggleTarget};
