use axum::extract::{Path, State};
use axum::{Json, Router, routing::get};
use eai_core::RubricCatalog;
use eai_core::integrity::{IntegrityReport, inspect_catalog};

use crate::error::AppError;
use crate::routes::parse_locale;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/catalogs/{locale}", get(get_catalog))
        .route("/v1/catalogs/{locale}/integrity", get(get_catalog_integrity))
}

/// Get the rubric catalog of a locale
///
/// A locale whose document could not be parsed serves the empty catalog
/// (version "0.0.0").
#[utoipa::path(
    get,
    path = "/v1/catalogs/{locale}",
    params(("locale" = String, Path, description = "Catalog locale (nl, en)")),
    responses(
        (status = 200, description = "Parsed catalog", body = RubricCatalog),
        (status = 400, description = "Unsupported locale", body = eai_core::error::ApiError)
    ),
    tag = "catalogs"
)]
pub async fn get_catalog(
    State(state): State<AppState>,
    Path(locale): Path<String>,
) -> Result<Json<RubricCatalog>, AppError> {
    let locale = parse_locale("locale", &locale)?;
    let catalog = state.loader.get(locale);
    Ok(Json(catalog.as_ref().clone()))
}

/// Run the integrity self-check on a locale's catalog
#[utoipa::path(
    get,
    path = "/v1/catalogs/{locale}/integrity",
    params(("locale" = String, Path, description = "Catalog locale (nl, en)")),
    responses(
        (status = 200, description = "Integrity report", body = IntegrityReport),
        (status = 400, description = "Unsupported locale", body = eai_core::error::ApiError)
    ),
    tag = "catalogs"
)]
pub async fn get_catalog_integrity(
    State(state): State<AppState>,
    Path(locale): Path<String>,
) -> Result<Json<IntegrityReport>, AppError> {
    let locale = parse_locale("locale", &locale)?;
    Ok(Json(inspect_catalog(&state.loader.get(locale))))
}
