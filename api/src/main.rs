use std::net::SocketAddr;

use axum::Router;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod error;
mod extract;
mod middleware;
mod routes;
mod state;
mod store;
mod ticker;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Dost Crisis Signal API",
        version = "0.1.0",
        description = "Per-session crisis keyword detection and escalation for the Dost chat."
    ),
    paths(
        routes::health::health_check,
        routes::keywords::list_keywords,
        routes::sessions::create_session,
        routes::sessions::get_session,
        routes::sessions::end_session,
        routes::sessions::send_message,
        routes::sessions::select_mood,
        routes::sessions::idle_tick,
        routes::sessions::respond_to_check_in,
        routes::sessions::dismiss_alert,
        routes::sessions::open_modal,
        routes::sessions::list_events,
    ),
    components(schemas(
        HealthResponse,
        dost_core::error::ApiError,
        dost_core::SessionSnapshot,
        dost_core::SessionRiskState,
        dost_core::SessionPhase,
        dost_core::DetectionResult,
        dost_core::KeywordCategory,
        dost_core::CategoryPhrases,
        routes::keywords::KeywordsResponse,
        dost_core::EscalationAction,
        dost_core::CheckInResponse,
        dost_core::Mood,
        dost_core::MoodLog,
        dost_core::CrisisEvent,
        dost_core::CrisisEventType,
        routes::sessions::SendMessageRequest,
        routes::sessions::CrisisFollowUp,
        routes::sessions::MessageResponse,
        routes::sessions::MoodRequest,
        routes::sessions::MoodResponse,
        routes::sessions::TickResponse,
        routes::sessions::CheckInRequest,
        routes::sessions::CheckInReply,
        routes::sessions::PhaseResponse,
        routes::sessions::EventsResponse,
    ))
)]
struct ApiDoc;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub active_sessions: usize,
}

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dost_api=debug,dost_core=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let app_state = state::AppState::from_env();
    let tick_every = app_state.sessions.config().idle_tick_interval;
    let ticker = ticker::spawn_idle_ticker(app_state.clone());

    let cors_layer = middleware::cors::build_cors_layer();

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(routes::health::router())
        .merge(routes::keywords::router())
        .merge(
            routes::sessions::create_router()
                .layer(middleware::rate_limit::sessions_create_layer()),
        )
        .merge(routes::sessions::message_router().layer(middleware::rate_limit::messages_layer()))
        .merge(routes::sessions::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer),
        )
        .with_state(app_state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(
        idle_tick_seconds = tick_every.as_secs(),
        "Dost API listening on {}",
        addr
    );

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutdown signal received");
    })
    .await;

    ticker.abort();
    if let Err(e) = served {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
