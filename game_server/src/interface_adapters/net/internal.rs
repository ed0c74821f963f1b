use crate::interface_adapters::http::error_response;
use crate::interface_adapters::net::client::spawn_room_serializer;
use crate::interface_adapters::state::AppState;
use crate::use_cases::{RoomError, RoomId};

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, serde::Serialize)]
struct RoomCreatedResponse {
    room_id: RoomId,
    // Short join code players type in to connect.
    code: String,
}

pub async fn create_room_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.room_registry.create_room().await {
        Ok(room) => {
            // Serializer first so the first socket sees every frame.
            spawn_room_serializer(&room);
            (
                StatusCode::CREATED,
                Json(RoomCreatedResponse {
                    room_id: room.room_id,
                    code: room.code.to_string(),
                }),
            )
                .into_response()
        }
        Err(err @ RoomError::CodeSpaceExhausted) => {
            warn!(error = %err, "room creation refused");
            error_response(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
        }
        Err(err @ RoomError::CodeTaken(_)) => error_response(StatusCode::CONFLICT, err.to_string()),
    }
}
