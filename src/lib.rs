pub mod config;
pub mod error;
pub mod grid;
pub mod protocol;
pub mod session;
pub mod websocket;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use config::ServerConfig;
use session::SessionRegistry;
use websocket::Dispatcher;

/// Application state shared across all connections
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        let registry = SessionRegistry::new(config.enforce_cooldown);
        Self {
            dispatcher: Arc::new(Dispatcher::new(registry, config.grace_period)),
        }
    }
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "ok"
}

/// Build the HTTP router: WebSocket endpoint, health check, static files
pub fn app(state: AppState, static_dir: &str) -> Router {
    Router::new()
        .route("/ws", get(websocket::handler::ws_handler))
        .route("/health", get(health_handler))
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health() {
        let state = AppState::new(&ServerConfig::default());
        let response = app(state, "public")
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_static_file() {
        let state = AppState::new(&ServerConfig::default());
        let response = app(state, "does-not-exist")
            .oneshot(Request::builder().uri("/nope.js").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
