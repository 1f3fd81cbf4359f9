pub mod analysis;
pub mod catalogs;
pub mod health;
pub mod sessions;

#[cfg(test)]
pub(crate) mod testing;

use eai_core::Locale;

use crate::error::AppError;

/// Parse a locale tag from a path or query parameter.
pub(crate) fn parse_locale(field: &str, raw: &str) -> Result<Locale, AppError> {
    raw.parse().map_err(|e: eai_core::locale::UnknownLocale| AppError::Validation {
        message: e.to_string(),
        field: Some(field.to_string()),
        received: Some(serde_json::Value::String(raw.to_string())),
        docs_hint: Some("Supported locales: nl, en".to_string()),
    })
}
