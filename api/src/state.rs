use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use eai_core::Locale;
use eai_core::events::EventLog;
use eai_core::loader::CatalogLoader;
use eai_core::store::MemoryStore;
use eai_runtime::{CoachSession, Collaborator};
use uuid::Uuid;

/// Builds a fresh collaborator, one per session, so conversation contexts never mix.
pub type CollaboratorFactory = dyn Fn() -> Arc<dyn Collaborator> + Send + Sync;

#[derive(Clone)]
pub struct SessionEntry {
    pub session: Arc<CoachSession>,
    pub events: Arc<EventLog>,
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<Uuid, SessionEntry>>,
}

impl SessionRegistry {
    pub fn insert(&self, entry: SessionEntry) {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(entry.session.id(), entry);
    }

    pub fn remove(&self, id: Uuid) -> Option<SessionEntry> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn get(&self, id: Uuid) -> Option<SessionEntry> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id)
            .cloned()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub loader: Arc<CatalogLoader>,
    pub sessions: Arc<SessionRegistry>,
    pub collaborators: Arc<CollaboratorFactory>,
    pub default_locale: Locale,
}

impl AppState {
    pub fn new(
        loader: Arc<CatalogLoader>,
        collaborators: Arc<CollaboratorFactory>,
        default_locale: Locale,
    ) -> Self {
        Self {
            loader,
            sessions: Arc::new(SessionRegistry::default()),
            collaborators,
            default_locale,
        }
    }

    /// Open and register a session. Each session records its own events and
    /// keeps its learner profile in memory.
    pub fn open_session(&self, locale: Locale) -> SessionEntry {
        let events = Arc::new(EventLog::new());
        let session = CoachSession::open(
            locale,
            (self.collaborators)(),
            Arc::clone(&self.loader),
            Arc::new(MemoryStore::new()),
            events.clone(),
        );
        let entry = SessionEntry {
            session: Arc::new(session),
            events,
        };
        self.sessions.insert(entry.clone());
        tracing::info!(session_id = %entry.session.id(), %locale, "session opened");
        entry
    }
}
