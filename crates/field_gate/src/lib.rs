//! Sequential field gating for record entry forms.
//!
//! This crate hosts the form engine shared by every data-entry screen:
//! - field: declarative field definitions (`FieldSpec`, `FieldKind`, input filters)
//! - rules: pure validation rules and the `evaluate` function
//! - registry: validated, ordered form definitions (`FormDefinition`, `FormRegistry`)
//! - session: mutable per-screen editing state with lock cascading (`FormSession`)
//! - gate: submission state machine with confirmation step (`SubmissionGate`)
//! - persistence: the remote record store contract plus an in-memory store
//! - notify: confirmation / notification collaborator contracts
//! - workflow: headless driver running the whole submit sequence
//!
//! Keep this crate free of UI concerns. Terminal and HTTP adapters live in
//! downstream crates.

pub mod clock;
pub mod field;
pub mod gate;
pub mod notify;
pub mod persistence;
pub mod registry;
pub mod rules;
pub mod session;
pub mod workflow;

/// Parsed record payload sent to the persistence layer (field id -> parsed value).
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Convenience prelude for downstream crates.
pub mod prelude {
    pub use crate::Payload;
    pub use crate::clock::{Clock, FixedClock, SystemClock};
    pub use crate::field::{FieldKind, FieldSpec, InputFilter};
    pub use crate::gate::{
        AttemptResult, GateError, GateState, SubmissionAttempt, SubmissionGate, SubmissionTarget,
        SubmissionTicket, SubmitIntent,
    };
    pub use crate::notify::{
        AutoConfirm, ConfirmPrompt, Confirmer, Notification, NotificationLog, Notifier, Severity,
    };
    pub use crate::persistence::{
        MemoryStore, PersistenceAdapter, PersistenceError, Record, StoreCall,
    };
    pub use crate::registry::{FormDefinition, FormRegistry, RegistryError, SubmissionCopy};
    pub use crate::rules::{DateBound, Relation, ValidationOutcome, ValidationRule};
    pub use crate::session::{FieldStatus, FormSession, InputDisposition, InputEvent, SessionError};
    pub use crate::workflow::{FormWorkflow, WorkflowOutcome};
}
