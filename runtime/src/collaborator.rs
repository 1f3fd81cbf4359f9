use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use eai_core::Locale;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use utoipa::ToSchema;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Measured cost of one collaborator call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TurnMechanics {
    pub latency_ms: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub model: String,
    pub temperature: f64,
    pub timestamp: DateTime<Utc>,
}

/// Raw body of a collaborator answer, not yet decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct CollaboratorReply {
    pub raw_text: String,
    pub mechanics: TurnMechanics,
}

#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("collaborator API key is not configured (set GEMINI_API_KEY)")]
    MissingApiKey,

    #[error("collaborator request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("collaborator returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("collaborator returned an empty response")]
    EmptyResponse,
}

/// The generative backend. One call per user turn; the implementation owns
/// the running conversation context.
pub trait Collaborator: Send + Sync {
    fn converse<'a>(
        &'a self,
        message: &'a str,
        locale: Locale,
    ) -> BoxFuture<'a, Result<CollaboratorReply, CollaboratorError>>;

    /// Forget the conversation context; the next call starts a fresh chat.
    fn reset(&self);
}

/// Collaborator that replays queued bodies in order. Runs without network
/// access; an exhausted queue answers with HTTP 503.
#[derive(Debug, Default)]
pub struct ScriptedCollaborator {
    replies: Mutex<VecDeque<Result<String, String>>>,
    received: Mutex<Vec<(String, Locale)>>,
    resets: AtomicUsize,
    gate: Option<Semaphore>,
}

impl ScriptedCollaborator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call waits for a permit from [`ScriptedCollaborator::release`].
    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    pub fn push_reply(&self, body: impl Into<String>) {
        self.lock_replies().push_back(Ok(body.into()));
    }

    pub fn push_failure(&self, reason: impl Into<String>) {
        self.lock_replies().push_back(Err(reason.into()));
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    /// Messages received so far, with the locale each was sent in.
    pub fn received(&self) -> Vec<(String, Locale)> {
        self.received
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn reset_count(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, String>>> {
        self.replies.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Collaborator for ScriptedCollaborator {
    fn converse<'a>(
        &'a self,
        message: &'a str,
        locale: Locale,
    ) -> BoxFuture<'a, Result<CollaboratorReply, CollaboratorError>> {
        Box::pin(async move {
            self.received
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push((message.to_string(), locale));

            if let Some(gate) = &self.gate {
                // The gate is never closed, so acquire only fails on drop.
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }

            let next = self.lock_replies().pop_front();
            match next {
                Some(Ok(raw_text)) => Ok(CollaboratorReply {
                    raw_text,
                    mechanics: TurnMechanics {
                        latency_ms: 0,
                        input_tokens: 0,
                        output_tokens: 0,
                        model: "scripted".to_string(),
                        temperature: 0.0,
                        timestamp: Utc::now(),
                    },
                }),
                Some(Err(body)) => Err(CollaboratorError::Status { status: 503, body }),
                None => Err(CollaboratorError::Status {
                    status: 503,
                    body: "no scripted reply left".to_string(),
                }),
            }
        })
    }

    fn reset(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}
