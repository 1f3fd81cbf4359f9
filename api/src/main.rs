use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use clap::Parser;
use eai_core::Locale;
use eai_core::events::{EventSink, TracingSink};
use eai_core::integrity::probe_catalog;
use eai_core::loader::CatalogLoader;
use eai_runtime::{Collaborator, CollaboratorArgs, GeminiCollaborator, http_client};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod error;
mod middleware;
mod routes;
mod state;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "EAI Coach API",
        version = "0.1.0",
        description = "Rubric-grounded tutoring sessions. Every collaborator turn is classified against the catalog, validated and folded into the session state."
    ),
    paths(
        routes::health::health_check,
        routes::catalogs::get_catalog,
        routes::catalogs::get_catalog_integrity,
        routes::analysis::validate_analysis,
        routes::sessions::create_session,
        routes::sessions::get_session,
        routes::sessions::delete_session,
        routes::sessions::get_transcript,
        routes::sessions::get_events,
        routes::sessions::start_session,
        routes::sessions::send_turn,
        routes::sessions::reset_session,
        routes::sessions::switch_locale,
    ),
    components(schemas(
        HealthResponse,
        eai_core::error::ApiError,
        eai_core::Locale,
        eai_core::RubricCatalog,
        eai_core::TurnAnalysis,
        eai_core::ValidationResult,
        eai_core::SessionState,
        eai_core::LearnerProfile,
        eai_core::events::KernelEvent,
        eai_core::integrity::IntegrityReport,
        eai_runtime::ChatMessage,
        eai_runtime::TurnOutcome,
        eai_runtime::Dashboard,
        routes::sessions::CreateSessionRequest,
        routes::sessions::CreateSessionResponse,
        routes::sessions::StartSessionRequest,
        routes::sessions::SendTurnRequest,
        routes::sessions::SwitchLocaleRequest,
    ))
)]
struct ApiDoc;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Parser)]
#[command(name = "eai-api", version, about = "HTTP server for EAI coaching sessions")]
struct ServerArgs {
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Locale of sessions that do not ask for one
    #[arg(long, env = "EAI_LOCALE", default_value = "nl")]
    locale: Locale,

    #[command(flatten)]
    collaborator: CollaboratorArgs,
}

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eai_api=debug,eai_core=info,eai_runtime=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let args = ServerArgs::parse();

    let events: Arc<dyn EventSink> = Arc::new(TracingSink);
    let loader = Arc::new(CatalogLoader::builtin(events.clone()));
    for locale in Locale::ALL {
        probe_catalog(&loader.get(locale), locale, events.as_ref());
    }

    if args.collaborator.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; every turn will fail with 502");
    }
    let client = match http_client(args.collaborator.timeout_secs) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "failed to build HTTP client");
            std::process::exit(1);
        }
    };
    let config = args.collaborator.clone();
    let app_state = state::AppState::new(
        loader,
        Arc::new(move || {
            Arc::new(GeminiCollaborator::new(config.clone(), client.clone())) as Arc<dyn Collaborator>
        }),
        args.locale,
    );

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(routes::health::router())
        .merge(routes::catalogs::router())
        .merge(routes::analysis::router())
        .merge(routes::sessions::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::cors::build_cors_layer()),
        )
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };
    tracing::info!("EAI API listening on {}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server stopped");
        std::process::exit(1);
    }
}
