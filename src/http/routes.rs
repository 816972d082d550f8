//! HTTP route definitions

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer,
};

use crate::app::AppState;
use crate::util::time::{uptime_secs, SIMULATION_TPS};
use crate::ws::handler::ws_handler;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = if state.config.client_origins.is_empty() {
        CorsLayer::permissive()
    } else {
        let allowed_origins: Vec<HeaderValue> = state
            .config
            .client_origins
            .iter()
            .filter_map(|s| s.parse::<HeaderValue>().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(allowed_origins)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    };

    // Anything that is not an API route is the static web client
    let static_files = ServeDir::new(&state.config.public_dir);

    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .fallback_service(static_files)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    active_players: usize,
    tick_rate: u32,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        active_players: state.arena.player_count(),
        tick_rate: SIMULATION_TPS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::game::{ArenaRules, GameArena};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let config = Config::from_lookup(|_| None).unwrap();
        let (_arena, handle) = GameArena::new(ArenaRules::default(), Some(1));
        AppState::new(config, handle)
    }

    #[tokio::test]
    async fn test_health() {
        let router = build_router(test_state());

        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["active_players"], 0);
        assert_eq!(json["tick_rate"], 30);
    }

    #[tokio::test]
    async fn test_ws_requires_upgrade() {
        let router = build_router(test_state());

        let response = router
            .oneshot(Request::builder().uri("/ws").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_missing_static_file() {
        let router = build_router(test_state());

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/definitely-not-here.js")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
