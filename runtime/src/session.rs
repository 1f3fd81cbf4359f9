use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use eai_core::analysis::decode_model_response;
use eai_core::kernel::rekey;
use eai_core::events::{EventSink, KernelEvent};
use eai_core::loader::CatalogLoader;
use eai_core::store::{ProfileStore, load_profile};
use eai_core::{
    LearnerProfile, Locale, RubricCatalog, SessionState, TurnAnalysis, ValidationResult, fold,
    merge_profile, validate,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::collaborator::{Collaborator, CollaboratorError, TurnMechanics};
use crate::dashboard::{Dashboard, LastTurn};
use crate::prompt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Set on the visible message that reports a failed collaborator call
    pub is_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<TurnAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mechanics: Option<TurnMechanics>,
}

impl ChatMessage {
    fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            role,
            text: text.into(),
            timestamp: Utc::now(),
            is_error: false,
            analysis: None,
            mechanics: None,
        }
    }
}

/// Result of one folded turn.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TurnOutcome {
    pub message: ChatMessage,
    pub validation: ValidationResult,
    pub state: SessionState,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("a request is already in flight for this session")]
    Busy,

    #[error("message must not be empty")]
    EmptyMessage,

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

struct SessionInner {
    locale: Locale,
    catalog: Arc<RubricCatalog>,
    state: SessionState,
    profile: LearnerProfile,
    transcript: Vec<ChatMessage>,
    last_turn: Option<LastTurn>,
}

/// Clears the busy flag when the request that took it finishes or is dropped.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One coaching session: the catalog in effect, the folded state, the learner
/// profile and the transcript, plus the collaborator that produces turns.
///
/// At most one collaborator call is outstanding at a time; every mutating
/// operation fails with [`SessionError::Busy`] while one is pending. State is
/// only touched after the call resolves.
pub struct CoachSession {
    id: Uuid,
    collaborator: Arc<dyn Collaborator>,
    loader: Arc<CatalogLoader>,
    store: Arc<dyn ProfileStore>,
    events: Arc<dyn EventSink>,
    busy: AtomicBool,
    inner: Mutex<SessionInner>,
}

impl CoachSession {
    /// Open a session in `locale` with an empty state and the stored profile.
    pub fn open(
        locale: Locale,
        collaborator: Arc<dyn Collaborator>,
        loader: Arc<CatalogLoader>,
        store: Arc<dyn ProfileStore>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let catalog = loader.get(locale);
        let profile = load_profile(store.as_ref(), events.as_ref()).unwrap_or_default();
        Self {
            id: Uuid::now_v7(),
            collaborator,
            loader,
            store,
            events,
            busy: AtomicBool::new(false),
            inner: Mutex::new(SessionInner {
                locale,
                catalog,
                state: SessionState::empty(),
                profile,
                transcript: Vec::new(),
                last_turn: None,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn locale(&self) -> Locale {
        self.lock().locale
    }

    pub fn catalog(&self) -> Arc<RubricCatalog> {
        Arc::clone(&self.lock().catalog)
    }

    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    pub fn profile(&self) -> LearnerProfile {
        self.lock().profile.clone()
    }

    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.lock().transcript.clone()
    }

    pub fn dashboard(&self) -> Dashboard {
        let inner = self.lock();
        Dashboard::build(
            self.id,
            inner.locale,
            &inner.catalog,
            &inner.state,
            &inner.profile,
            inner.last_turn.as_ref(),
            self.is_busy(),
        )
    }

    /// Send one learner message and fold the answer into the session.
    pub async fn send(&self, message: &str) -> Result<TurnOutcome, SessionError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        let _guard = self.acquire()?;
        self.exchange(message, message).await
    }

    /// Begin the conversation from the profile setup. Only the goal is shown
    /// in the transcript; the collaborator receives the full start prompt.
    pub async fn start(
        &self,
        profile: &LearnerProfile,
        goal: &str,
    ) -> Result<TurnOutcome, SessionError> {
        let goal = goal.trim();
        if goal.is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        let _guard = self.acquire()?;

        let (start_text, saved) = {
            let mut inner = self.lock();
            let merge = merge_profile(&inner.profile, profile);
            inner.profile = merge.profile;
            let start_text = prompt::start_message(inner.locale, &inner.profile, goal);
            (start_text, merge.changed.then(|| inner.profile.clone()))
        };
        if let Some(profile) = saved {
            self.persist(&profile);
        }

        self.exchange(&start_text, goal).await
    }

    /// Replace the session with a fresh one: empty state, empty transcript,
    /// no conversation context and no stored profile.
    pub fn reset(&self) -> Result<(), SessionError> {
        let _guard = self.acquire()?;
        {
            let mut inner = self.lock();
            inner.state = SessionState::empty();
            inner.profile = LearnerProfile::default();
            inner.transcript.clear();
            inner.last_turn = None;
        }
        if let Err(err) = self.store.clear() {
            self.events.emit(KernelEvent::ProfilePersistenceFailed {
                reason: err.to_string(),
            });
        }
        self.collaborator.reset();
        tracing::info!(session_id = %self.id, "session reset");
        Ok(())
    }

    /// Swap catalog and conversation language. State is re-filed under the
    /// new catalog's dimension ids; profile is kept.
    pub fn switch_locale(&self, locale: Locale) -> Result<(), SessionError> {
        let _guard = self.acquire()?;
        let catalog = self.loader.get(locale);
        {
            let mut inner = self.lock();
            if inner.locale == locale {
                return Ok(());
            }
            inner.state = rekey(&inner.state, &inner.catalog, &catalog);
            inner.locale = locale;
            inner.catalog = catalog;
        }
        self.collaborator.reset();
        tracing::info!(session_id = %self.id, %locale, "session locale switched");
        Ok(())
    }

    fn acquire(&self) -> Result<BusyGuard<'_>, SessionError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SessionError::Busy)?;
        Ok(BusyGuard(&self.busy))
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(&self, profile: &LearnerProfile) {
        if let Err(err) = self.store.save(profile) {
            self.events.emit(KernelEvent::ProfilePersistenceFailed {
                reason: err.to_string(),
            });
        }
    }

    /// Call the collaborator with `text`, then validate, fold and merge. Must
    /// run under the busy guard.
    ///
    /// `shown` enters the transcript together with the reply or the failure,
    /// so a request dropped mid-call leaves the transcript untouched.
    async fn exchange(&self, text: &str, shown: &str) -> Result<TurnOutcome, SessionError> {
        let locale = self.locale();
        let user_message = ChatMessage::new(Role::User, shown);

        let reply = match self.collaborator.converse(text, locale).await {
            Ok(reply) => reply,
            Err(err) => {
                self.events.emit(KernelEvent::CollaboratorTransportError {
                    reason: err.to_string(),
                });
                let mut failure = ChatMessage::new(Role::Model, format!("System Failure: {err}"));
                failure.is_error = true;
                self.lock().transcript.extend([user_message, failure]);
                return Err(err.into());
            }
        };

        let decoded = decode_model_response(&reply.raw_text);
        if let Some(reason) = &decoded.schema_error {
            self.events.emit(KernelEvent::CollaboratorSchemaError {
                reason: reason.clone(),
            });
        }
        let analysis = decoded.analysis;

        let (outcome, saved) = {
            let mut inner = self.lock();
            let validation = validate(&analysis, &inner.catalog);
            let state = fold(&inner.state, &analysis, &inner.catalog);
            let merge = merge_profile(&inner.profile, &analysis.current_profile);

            let mut message = ChatMessage::new(Role::Model, decoded.text);
            message.analysis = Some(analysis.clone());
            message.mechanics = Some(reply.mechanics.clone());

            inner.state = state.clone();
            inner.profile = merge.profile;
            inner.transcript.push(user_message);
            inner.transcript.push(message.clone());
            inner.last_turn = Some(LastTurn {
                analysis,
                validation: validation.clone(),
                mechanics: reply.mechanics,
            });

            (
                TurnOutcome {
                    message,
                    validation,
                    state,
                },
                merge.changed.then(|| inner.profile.clone()),
            )
        };

        if !outcome.validation.ok {
            self.events.emit(KernelEvent::ValidationMismatch {
                turn: outcome.state.turn_counter,
                unknown_band_ids: outcome.validation.unknown_band_ids.clone(),
                unknown_command_id: outcome.validation.unknown_command_id.clone(),
            });
        }
        if let Some(profile) = saved {
            self.persist(&profile);
        }

        tracing::debug!(
            session_id = %self.id,
            turn = outcome.state.turn_counter,
            grounded = outcome.validation.ok,
            "turn folded"
        );
        Ok(outcome)
    }
}
