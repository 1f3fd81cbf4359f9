use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use eai_core::Locale;
use eai_core::events::TracingSink;
use eai_core::loader::CatalogLoader;
use eai_runtime::{Collaborator, ScriptedCollaborator};
use serde_json::Value;
use tower::ServiceExt;

use crate::state::AppState;

/// State whose sessions all talk to `scripted`.
pub fn state_with(scripted: Arc<ScriptedCollaborator>) -> AppState {
    AppState::new(
        Arc::new(CatalogLoader::builtin(Arc::new(TracingSink))),
        Arc::new(move || scripted.clone() as Arc<dyn Collaborator>),
        Locale::En,
    )
}

pub fn state() -> AppState {
    state_with(Arc::new(ScriptedCollaborator::new()))
}

pub async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .expect("request should build"),
        None => builder.body(Body::empty()).expect("request should build"),
    };

    let response = app.oneshot(request).await.expect("request should succeed");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body should be JSON")
    };
    (status, value)
}
