use std::sync::Mutex;

use serde::Serialize;
use utoipa::ToSchema;

use crate::integrity::IntegrityIssue;
use crate::locale::Locale;

/// Recoverable conditions the kernel and its boundaries report instead of failing.
/// None of these halt a session; they are surfaced so a UI can render them.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KernelEvent {
    /// Rubric document unusable; the empty catalog is in effect
    CatalogLoadFailed { locale: Locale, reason: String },
    /// Catalog loaded but structurally incomplete
    CatalogIntegrityWarning {
        locale: Locale,
        issues: Vec<IntegrityIssue>,
    },
    /// A turn referenced ids the catalog does not define; the turn was still folded
    ValidationMismatch {
        turn: u64,
        unknown_band_ids: Vec<String>,
        unknown_command_id: Option<String>,
    },
    /// Collaborator answered with a body that does not match the response schema
    CollaboratorSchemaError { reason: String },
    /// Collaborator could not be reached or refused the request
    CollaboratorTransportError { reason: String },
    /// Learner profile could not be read or written
    ProfilePersistenceFailed { reason: String },
}

impl KernelEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            KernelEvent::CatalogLoadFailed { .. } => "catalog_load_failed",
            KernelEvent::CatalogIntegrityWarning { .. } => "catalog_integrity_warning",
            KernelEvent::ValidationMismatch { .. } => "validation_mismatch",
            KernelEvent::CollaboratorSchemaError { .. } => "collaborator_schema_error",
            KernelEvent::CollaboratorTransportError { .. } => "collaborator_transport_error",
            KernelEvent::ProfilePersistenceFailed { .. } => "profile_persistence_failed",
        }
    }

    fn log(&self) {
        match self {
            KernelEvent::CatalogLoadFailed { locale, reason } => {
                tracing::error!(%locale, %reason, "catalog load failed; using empty catalog");
            }
            KernelEvent::CatalogIntegrityWarning { locale, issues } => {
                tracing::warn!(%locale, issues = issues.len(), "catalog integrity check failed");
            }
            KernelEvent::ValidationMismatch {
                turn,
                unknown_band_ids,
                unknown_command_id,
            } => {
                tracing::warn!(
                    turn,
                    unknown_bands = ?unknown_band_ids,
                    unknown_command = ?unknown_command_id,
                    "turn analysis not grounded in catalog"
                );
            }
            KernelEvent::CollaboratorSchemaError { reason } => {
                tracing::warn!(%reason, "collaborator response did not match schema");
            }
            KernelEvent::CollaboratorTransportError { reason } => {
                tracing::error!(%reason, "collaborator request failed");
            }
            KernelEvent::ProfilePersistenceFailed { reason } => {
                tracing::warn!(%reason, "learner profile persistence failed");
            }
        }
    }
}

/// Receiver for kernel events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: KernelEvent);
}

/// Logs events and drops them.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: KernelEvent) {
        event.log();
    }
}

/// Logs events and keeps them for later inspection.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<KernelEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<KernelEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl EventSink for EventLog {
    fn emit(&self, event: KernelEvent) {
        event.log();
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::{EventLog, EventSink, KernelEvent};

    #[test]
    fn event_log_records_in_order() {
        let log = EventLog::new();
        log.emit(KernelEvent::CollaboratorSchemaError {
            reason: "bad".to_string(),
        });
        log.emit(KernelEvent::ProfilePersistenceFailed {
            reason: "disk".to_string(),
        });
        let kinds: Vec<&str> = log.snapshot().iter().map(KernelEvent::kind).collect();
        assert_eq!(
            kinds,
            vec!["collaborator_schema_error", "profile_persistence_failed"]
        );
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn events_serialize_with_kind_tag() {
        let event = KernelEvent::ValidationMismatch {
            turn: 3,
            unknown_band_ids: vec!["C9".to_string()],
            unknown_command_id: None,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["kind"], "validation_mismatch");
        assert_eq!(value["unknown_band_ids"][0], "C9");
    }
}
