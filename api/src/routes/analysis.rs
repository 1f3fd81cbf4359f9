use axum::extract::{Query, State};
use axum::{Json, Router, routing::post};
use eai_core::{TurnAnalysis, ValidationResult, validate};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::AppError;
use crate::routes::parse_locale;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/analysis/validate", post(validate_analysis))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ValidateQuery {
    /// Catalog to check against (defaults to the server locale)
    pub locale: Option<String>,
}

/// Check a turn analysis against the catalog vocabulary
///
/// Advisory only: reports band and command ids the catalog does not define.
#[utoipa::path(
    post,
    path = "/v1/analysis/validate",
    params(ValidateQuery),
    request_body = TurnAnalysis,
    responses(
        (status = 200, description = "Validation result", body = ValidationResult),
        (status = 400, description = "Unsupported locale", body = eai_core::error::ApiError)
    ),
    tag = "analysis"
)]
pub async fn validate_analysis(
    State(state): State<AppState>,
    Query(query): Query<ValidateQuery>,
    Json(analysis): Json<TurnAnalysis>,
) -> Result<Json<ValidationResult>, AppError> {
    let locale = match query.locale.as_deref() {
        Some(raw) => parse_locale("locale", raw)?,
        None => state.default_locale,
    };
    let catalog = state.loader.get(locale);
    Ok(Json(validate(&analysis, &catalog)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::router;
    use crate::routes::testing::{call, state};

    #[tokio::test]
    async fn grounded_analysis_is_ok() {
        let app = router().with_state(state());
        let body = json!({ "coregulation_bands": ["C1"], "active_fix": "/checkin" });
        let (status, result) = call(app, "POST", "/v1/analysis/validate?locale=nl", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["ok"], true);
    }

    #[tokio::test]
    async fn unknown_ids_are_reported() {
        let app = router().with_state(state());
        let body = json!({ "coregulation_bands": ["C9"], "active_fix": "/ghost" });
        let (status, result) = call(app, "POST", "/v1/analysis/validate", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["ok"], false);
        assert_eq!(result["unknown_band_ids"], json!(["C9"]));
        assert_eq!(result["unknown_command_id"], "/ghost");
    }
}
