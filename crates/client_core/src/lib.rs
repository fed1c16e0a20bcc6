//! Client-side orchestration of project-settings and triage actions against
//! the reporting server.

use shared::protocol::IssueDefinition;
use uuid::Uuid;

pub mod config;
pub mod error;
pub mod handlers;
pub mod import;
pub mod intent;
pub mod lock;
pub mod messages;
pub mod notification;
pub mod orchestrator;
pub mod store;
pub mod transport;
pub mod urls;

pub use config::{load_settings, load_settings_from, ClientSettings};
pub use error::{OrchestratorError, TransportError};
pub use handlers::triage::{DecisionMode, DefectDecision};
pub use import::{ImportBatch, ImportRules};
pub use intent::{Intent, IntentKind};
pub use lock::{LockCategory, ScreenLock};
pub use notification::{Notification, NotificationCenter, NotificationKind};
pub use orchestrator::{Context, IntentOutcome, IntentPhase, IntentTicket, Orchestrator};
pub use store::{AppState, Mutation, Store};
pub use transport::{ApiRequest, ApiTransport, HttpMethod, HttpTransport, UploadRequest};

#[derive(Debug, Clone)]
pub enum ClientEvent {
    IntentPhase {
        ticket: u64,
        kind: IntentKind,
        phase: IntentPhase,
    },
    Notification(Notification),
    /// A lock category was engaged or released.
    LockChanged {
        category: LockCategory,
        engaged: bool,
    },
    FileImported {
        id: Uuid,
        name: String,
    },
    TestItemsUpdated(Vec<IssueDefinition>),
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
