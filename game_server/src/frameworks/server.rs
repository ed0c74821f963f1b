// Framework bootstrap for the game server runtime.

use crate::frameworks::config;
use crate::interface_adapters::net::{create_room_handler, ws_handler};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{RoomConfig, RoomRegistry};

use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// Routes for the public API.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/rooms", post(create_room_handler))
        .with_state(state)
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let app = router(build_state());

    tracing::info!(%address, "listening");

    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

pub fn room_config_from_env() -> RoomConfig {
    let tick_rate_hz = config::tick_rate_hz();
    let snapshot_rate_hz = config::snapshot_rate_hz();
    let room_config = RoomConfig {
        command_channel_capacity: config::COMMAND_CHANNEL_CAPACITY,
        event_broadcast_capacity: config::EVENT_BROADCAST_CAPACITY,
        tick_interval: config::interval_for(tick_rate_hz),
        snapshot_interval: config::interval_for(snapshot_rate_hz),
        max_players: config::max_players(),
        idle_timeout: config::room_idle_timeout(),
        seed: config::sim_seed(),
    };
    tracing::debug!(
        tick_rate_hz,
        snapshot_rate_hz,
        max_players = room_config.max_players,
        fixed_seed = room_config.seed.is_some(),
        "room config loaded"
    );
    room_config
}

fn build_state() -> Arc<AppState> {
    Arc::new(AppState {
        room_registry: Arc::new(RoomRegistry::new(room_config_from_env())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState {
            room_registry: Arc::new(RoomRegistry::new(RoomConfig {
                command_channel_capacity: 16,
                event_broadcast_capacity: 16,
                tick_interval: Duration::from_millis(16),
                snapshot_interval: Duration::from_millis(50),
                max_players: 4,
                idle_timeout: Duration::from_secs(60),
                seed: Some(5),
            })),
        })
    }

    #[tokio::test]
    async fn when_room_is_created_then_response_carries_a_four_letter_code() {
        let state = test_state();
        let response = router(state.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/rooms")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        let code = json["code"].as_str().expect("code");
        assert_eq!(code.len(), 4);
        assert!(state.room_registry.get_by_code(code).await.is_some());
    }

    #[tokio::test]
    async fn when_rooms_is_fetched_with_get_then_method_is_not_allowed() {
        let response = router(test_state())
            .oneshot(
                Request::builder()
                    .uri("/rooms")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
