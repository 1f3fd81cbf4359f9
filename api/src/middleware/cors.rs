use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::CorsLayer;

const DEFAULT_ORIGINS: &str = "http://localhost:3000";

/// Build a CORS layer from the `EAI_CORS_ORIGINS` env var.
///
/// Origins are a comma-separated list (default: `http://localhost:3000`).
/// Only JSON requests from a browser front end are expected, so no
/// credentials are allowed.
pub fn build_cors_layer() -> CorsLayer {
    let raw = std::env::var("EAI_CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_ORIGINS.to_string());

    CorsLayer::new()
        .allow_origin(parse_origins(&raw))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([HeaderName::from_static("content-type")])
        .max_age(std::time::Duration::from_secs(3600))
}

fn parse_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::parse_origins;

    #[test]
    fn splits_and_trims_origins() {
        let origins = parse_origins(" http://localhost:5173 , ,https://coach.example.org");
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[0], "http://localhost:5173");
        assert_eq!(origins[1], "https://coach.example.org");
    }

    #[test]
    fn drops_unparseable_origins() {
        assert!(parse_origins("bad\norigin").is_empty());
    }
}
