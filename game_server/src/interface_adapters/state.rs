use crate::use_cases::RoomRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    // Every live room, looked up by join code from the socket handler.
    pub room_registry: Arc<RoomRegistry>,
}
