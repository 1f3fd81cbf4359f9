use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::Utc;
use eai_core::Locale;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::collaborator::{
    BoxFuture, Collaborator, CollaboratorError, CollaboratorReply, TurnMechanics,
};
use crate::config::CollaboratorArgs;
use crate::prompt;

pub fn http_client(timeout_secs: u64) -> Result<reqwest::Client, CollaboratorError> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

#[derive(Debug, Default)]
struct Conversation {
    locale: Option<Locale>,
    contents: Vec<Value>,
}

/// Collaborator backed by the Generative Language `generateContent` endpoint.
/// The chat history is kept here and replayed with every request.
pub struct GeminiCollaborator {
    config: CollaboratorArgs,
    client: reqwest::Client,
    conversation: Mutex<Conversation>,
}

impl GeminiCollaborator {
    pub fn new(config: CollaboratorArgs, client: reqwest::Client) -> Self {
        Self {
            config,
            client,
            conversation: Mutex::new(Conversation::default()),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        )
    }

    fn request_body(&self, locale: Locale, contents: &[Value]) -> Value {
        json!({
            "systemInstruction": { "parts": [{ "text": prompt::system_instruction(locale) }] },
            "contents": contents,
            "generationConfig": {
                "temperature": self.config.temperature,
                "responseMimeType": "application/json",
                "responseSchema": prompt::response_schema(locale),
                "thinkingConfig": { "thinkingBudget": self.config.thinking_budget },
            },
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Conversation> {
        self.conversation.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// History to send for a new user turn. A locale change starts a new chat.
    fn contents_for(&self, locale: Locale, user_turn: &Value) -> Vec<Value> {
        let mut conversation = self.lock();
        if conversation.locale != Some(locale) {
            *conversation = Conversation {
                locale: Some(locale),
                contents: Vec::new(),
            };
        }
        let mut contents = conversation.contents.clone();
        contents.push(user_turn.clone());
        contents
    }

    async fn generate(
        &self,
        message: &str,
        locale: Locale,
    ) -> Result<CollaboratorReply, CollaboratorError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(CollaboratorError::MissingApiKey)?;

        let user_turn = text_content("user", message);
        let contents = self.contents_for(locale, &user_turn);

        let started = Instant::now();
        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&self.request_body(locale, &contents))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CollaboratorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: GenerateResponse = resp.json().await?;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let raw_text = body.text().ok_or(CollaboratorError::EmptyResponse)?;
        let usage = body.usage_metadata.unwrap_or_default();

        {
            // Skip the append when a reset or locale switch happened meanwhile.
            let mut conversation = self.lock();
            if conversation.locale == Some(locale) {
                conversation.contents.push(user_turn);
                conversation.contents.push(text_content("model", &raw_text));
            }
        }

        tracing::debug!(
            %locale,
            latency_ms,
            input_tokens = usage.prompt_token_count,
            output_tokens = usage.candidates_token_count,
            "collaborator turn completed"
        );

        Ok(CollaboratorReply {
            raw_text,
            mechanics: TurnMechanics {
                latency_ms,
                input_tokens: usage.prompt_token_count,
                output_tokens: usage.candidates_token_count,
                model: self.config.model.clone(),
                temperature: self.config.temperature,
                timestamp: Utc::now(),
            },
        })
    }
}

impl Collaborator for GeminiCollaborator {
    fn converse<'a>(
        &'a self,
        message: &'a str,
        locale: Locale,
    ) -> BoxFuture<'a, Result<CollaboratorReply, CollaboratorError>> {
        Box::pin(self.generate(message, locale))
    }

    fn reset(&self) {
        *self.lock() = Conversation::default();
    }
}

fn text_content(role: &str, text: &str) -> Value {
    json!({ "role": role, "parts": [{ "text": text }] })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

impl GenerateResponse {
    /// Answer text of the first candidate, without thought summaries.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter(|part| !part.thought)
            .filter_map(|part| part.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}
