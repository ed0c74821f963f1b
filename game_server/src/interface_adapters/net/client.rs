use crate::domain::SessionId;
use crate::interface_adapters::http::error_response;
use crate::interface_adapters::protocol::{ClientMessage, ServerMessage};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::rand_id;
use crate::use_cases::{
    CommandKind, OutboundFrame, RoomCommand, RoomEvent, RoomHandle, RoomId, RoomRegistry,
};

use axum::{
    Error,
    extract::{
        Query, State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::timeout;
use tracing::{Instrument, debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    CommandsClosed,
    FramesClosed,
    JoinRequired,
    JoinTimeout,
    ClosedBeforeJoin,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct RoomQuery {
    // Join code of the room the client wants to enter.
    #[serde(default)]
    code: Option<String>,
}

/// Serializes each room event once and fans the shared bytes out to every connection.
pub async fn room_event_serializer(
    mut events_rx: broadcast::Receiver<RoomEvent>,
    frames_tx: broadcast::Sender<OutboundFrame>,
    snapshot_latest_tx: watch::Sender<Utf8Bytes>,
) {
    loop {
        match events_rx.recv().await {
            Ok(event) => {
                let target = event.target();
                let closes_session = matches!(event, RoomEvent::SessionRemoved(_));
                let is_snapshot = matches!(event, RoomEvent::Snapshot(_));
                let msg = ServerMessage::from(event);
                let txt = match serde_json::to_string(&msg) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = ?e, "failed to serialize room event");
                        continue;
                    }
                };

                let bytes = Utf8Bytes::from(txt);
                if is_snapshot {
                    let _ = snapshot_latest_tx.send(bytes.clone());
                }
                let _ = frames_tx.send(OutboundFrame {
                    target,
                    bytes,
                    closes_session,
                });
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(missed = n, "room serializer lagged; skipping ahead");
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("room events channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub fn spawn_room_serializer(room: &RoomHandle) {
    tokio::spawn(room_event_serializer(
        room.events_tx.subscribe(),
        room.frames_tx.clone(),
        room.snapshot_latest_tx.clone(),
    ));
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<RoomQuery>,
) -> impl IntoResponse {
    let room = match query.code {
        Some(code) => state.room_registry.get_by_code(&code).await,
        None => None,
    };
    let Some(room) = room else {
        return error_response(StatusCode::NOT_FOUND, "room not found");
    };

    let room_registry = state.room_registry.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, room, room_registry))
}

async fn handle_socket(socket: WebSocket, room: RoomHandle, room_registry: Arc<RoomRegistry>) {
    // Each socket is one session; local players and bots hang off it.
    let session_id = rand_id();
    let span = info_span!("conn", session_id, room_id = room.room_id);
    serve_session(socket, room, room_registry, session_id)
        .instrument(span)
        .await;
}

async fn serve_session(
    mut socket: WebSocket,
    room: RoomHandle,
    room_registry: Arc<RoomRegistry>,
    session_id: SessionId,
) {
    let mut ctx = match bootstrap_connection(&mut socket, &room, room_registry.clone(), session_id)
        .await
    {
        Ok(ctx) => ctx,
        Err(NetError::ClosedBeforeJoin) => {
            info!("client disconnected before join handshake");
            return;
        }
        Err(e) => {
            error!(error = ?e, "failed to bootstrap connection");
            let _ = send_close_with_reason(&mut socket, close_code::POLICY, "bootstrap failed")
                .await;
            return;
        }
    };

    if room_registry
        .register_connection(room.room_id)
        .await
        .is_none()
    {
        // The room can be removed between lookup and registration.
        warn!("room missing during connection registration");
        let _ = ctx
            .command_tx
            .send(RoomCommand::new(session_id, CommandKind::RemoveSession))
            .await;
        let _ = send_close_with_reason(&mut socket, close_code::POLICY, "room unavailable").await;
        return;
    }
    ctx.registered = true;

    info!(display_name = %ctx.display_name, "client connected");

    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

struct ConnCtx {
    pub session_id: SessionId,
    pub display_name: String,
    pub room_id: RoomId,
    pub room_registry: Arc<RoomRegistry>,
    // Whether the connection has been counted by the registry.
    pub registered: bool,
    pub command_tx: mpsc::Sender<RoomCommand>,
    pub frames_rx: broadcast::Receiver<OutboundFrame>,
    pub snapshot_latest_rx: watch::Receiver<Utf8Bytes>,
    pub lag_recovery_count: u64,

    pub msgs_in: u64,
    pub msgs_out: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,

    pub invalid_json: u32,

    pub last_command_full_log: Instant,
    pub last_frame_lag_log: Instant,
    pub last_invalid_input_log: Instant,

    pub close_frame: Option<CloseFrame>,
}

#[derive(Debug)]
struct JoinHandshake {
    display_name: String,
    bytes_in: u64,
    msgs_in: u64,
}

async fn bootstrap_connection(
    socket: &mut WebSocket,
    room: &RoomHandle,
    room_registry: Arc<RoomRegistry>,
    session_id: SessionId,
) -> Result<ConnCtx, NetError> {
    // Subscribe before any await so the join broadcasts are not missed.
    let frames_rx = room.frames_tx.subscribe();
    let snapshot_latest_rx = room.snapshot_latest_tx.subscribe();

    let join = match timeout(JOIN_HANDSHAKE_TIMEOUT, read_join_handshake(socket)).await {
        Ok(result) => result?,
        Err(_) => {
            let _ = send_close_with_reason(socket, close_code::POLICY, "join timeout").await;
            return Err(NetError::JoinTimeout);
        }
    };

    let welcome = ServerMessage::Welcome {
        session_id: session_id.to_string(),
        room_code: room.code.to_string(),
    };
    send_message(socket, &welcome).await?;

    // Player list and room meta come back through the frames channel once the room applies this.
    room.command_tx
        .send(RoomCommand::new(
            session_id,
            CommandKind::AddHuman {
                name: join.display_name.clone(),
            },
        ))
        .await
        .map_err(|_| NetError::CommandsClosed)?;

    let now = Instant::now() - LOG_THROTTLE;
    Ok(ConnCtx {
        session_id,
        display_name: join.display_name,
        room_id: room.room_id,
        room_registry,
        registered: false,
        command_tx: room.command_tx.clone(),
        frames_rx,
        snapshot_latest_rx,
        lag_recovery_count: 0,

        msgs_in: join.msgs_in,
        msgs_out: 0,
        bytes_in: join.bytes_in,
        bytes_out: 0,

        invalid_json: 0,

        last_command_full_log: now,
        last_frame_lag_log: now,
        last_invalid_input_log: now,

        close_frame: None,
    })
}

enum LoopControl {
    Continue,
    Disconnect,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;
const JOIN_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_RTT_MS: f64 = 10_000.0;

async fn send_close_with_reason(
    socket: &mut WebSocket,
    code: u16,
    reason: &'static str,
) -> Result<(), NetError> {
    socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await
        .map_err(NetError::Ws)?;
    socket.close().await.map_err(NetError::Ws)
}

async fn read_join_handshake(socket: &mut WebSocket) -> Result<JoinHandshake, NetError> {
    loop {
        let Some(incoming) = socket.recv().await else {
            return Err(NetError::ClosedBeforeJoin);
        };

        match incoming.map_err(NetError::Ws)? {
            Message::Text(text) => {
                let bytes_in = text.len() as u64;
                let payload = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Join(payload)) => payload,
                    Ok(_) => {
                        let _ = send_close_with_reason(socket, close_code::POLICY, "join required")
                            .await;
                        return Err(NetError::JoinRequired);
                    }
                    Err(_) => {
                        let _ = send_close_with_reason(
                            socket,
                            close_code::POLICY,
                            "invalid join payload",
                        )
                        .await;
                        return Err(NetError::JoinRequired);
                    }
                };

                return Ok(JoinHandshake {
                    display_name: payload.name.trim().to_string(),
                    bytes_in,
                    msgs_in: 1,
                });
            }
            Message::Binary(_) => {
                let _ = send_close_with_reason(
                    socket,
                    close_code::UNSUPPORTED,
                    "binary messages not supported",
                )
                .await;
                return Err(NetError::JoinRequired);
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => return Err(NetError::ClosedBeforeJoin),
        }
    }
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

/// Drops inputs carrying non-finite timing values and clamps the reported RTT.
fn sanitize_command(kind: CommandKind) -> Option<CommandKind> {
    match kind {
        CommandKind::SendInput {
            button_a,
            button_b,
            sequence,
            timestamp,
            rtt_ms,
            player_id,
        } => {
            if !timestamp.is_finite() || !rtt_ms.is_finite() {
                return None;
            }
            Some(CommandKind::SendInput {
                button_a,
                button_b,
                sequence,
                timestamp,
                rtt_ms: rtt_ms.clamp(0.0, MAX_RTT_MS),
                player_id,
            })
        }
        other => Some(other),
    }
}

fn process_command(
    session_id: SessionId,
    command_tx: &mpsc::Sender<RoomCommand>,
    kind: CommandKind,
    last_command_full_log: &mut Instant,
    last_invalid_input_log: &mut Instant,
) -> Result<LoopControl, NetError> {
    let Some(kind) = sanitize_command(kind) else {
        if should_log(last_invalid_input_log) {
            warn!(session_id, "invalid input values (NaN/inf); dropping");
        }
        return Ok(LoopControl::Continue);
    };

    match command_tx.try_send(RoomCommand::new(session_id, kind)) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(mpsc::error::TrySendError::Full(cmd)) => {
            if should_log(last_command_full_log) {
                warn!(
                    session_id,
                    command = cmd.kind.name(),
                    "command channel full; dropping"
                );
            }
            Ok(LoopControl::Continue)
        }
        Err(mpsc::error::TrySendError::Closed(_)) => Err(NetError::CommandsClosed),
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let session_id = ctx.session_id;

    // Split borrows so `tokio::select!` can hold them concurrently.
    let ConnCtx {
        room_id,
        room_registry,
        registered,
        command_tx,
        frames_rx,
        snapshot_latest_rx,
        lag_recovery_count,
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        invalid_json,
        last_command_full_log,
        last_frame_lag_log,
        last_invalid_input_log,
        close_frame,
        ..
    } = ctx;

    let mut fatal: Option<NetError> = None;

    loop {
        let disconnect: bool = tokio::select! {
            incoming = socket.recv() => {
                match handle_incoming_ws(
                    incoming,
                    session_id,
                    command_tx,
                    msgs_in,
                    bytes_in,
                    invalid_json,
                    last_command_full_log,
                    last_invalid_input_log,
                    close_frame,
                ) {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            frame = frames_rx.recv() => {
                match frame {
                    Ok(frame) => {
                        if frame.target.is_some_and(|target| target != session_id) {
                            false
                        } else {
                            let closes = frame.closes_session;
                            match forward_bytes(frame.bytes, socket, msgs_out, bytes_out).await {
                                LoopControl::Continue if closes => {
                                    *close_frame = Some(CloseFrame {
                                        code: close_code::NORMAL,
                                        reason: "removed from room".into(),
                                    });
                                    info!(session_id, "session removed from room");
                                    true
                                }
                                LoopControl::Continue => false,
                                LoopControl::Disconnect => true,
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if should_log(last_frame_lag_log) {
                            warn!(missed = n, "room frames lagged; sending latest snapshot");
                        }

                        let latest = snapshot_latest_rx.borrow().clone();
                        if latest.is_empty() {
                            false
                        } else {
                            let bytes_len = latest.len();
                            *lag_recovery_count += 1;
                            let outcome = forward_bytes(latest, socket, msgs_out, bytes_out).await;

                            if should_log(last_frame_lag_log) {
                                debug!(
                                    session_id,
                                    bytes = bytes_len,
                                    count = *lag_recovery_count,
                                    "sent lag recovery snapshot"
                                );
                            }

                            matches!(outcome, LoopControl::Disconnect)
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::FramesClosed);
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    let stats = ConnStats {
        msgs_in: *msgs_in,
        msgs_out: *msgs_out,
        bytes_in: *bytes_in,
        bytes_out: *bytes_out,
        invalid_json: *invalid_json,
        lag_recovery_count: *lag_recovery_count,
    };
    if let Err(e) =
        disconnect_cleanup(session_id, *room_id, room_registry, *registered, command_tx, stats)
            .await
    {
        warn!(error = ?e, "error during disconnect cleanup");
        if fatal.is_none() {
            fatal = Some(e);
        }
    }

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    session_id: SessionId,
    command_tx: &mpsc::Sender<RoomCommand>,
    msgs_in: &mut u64,
    bytes_in: &mut u64,
    invalid_json: &mut u32,
    last_command_full_log: &mut Instant,
    last_invalid_input_log: &mut Instant,
    close_frame: &mut Option<CloseFrame>,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                *msgs_in += 1;
                *bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(message) => match message.into_command() {
                        Some(kind) => process_command(
                            session_id,
                            command_tx,
                            kind,
                            last_command_full_log,
                            last_invalid_input_log,
                        ),
                        None => {
                            // Join was already handled by the handshake.
                            if should_log(last_invalid_input_log) {
                                warn!(session_id, "duplicate join ignored");
                            }
                            Ok(LoopControl::Continue)
                        }
                    },
                    Err(parse_err) => {
                        *invalid_json += 1;
                        if should_log(last_invalid_input_log) {
                            warn!(
                                session_id,
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }

                        if *invalid_json > MAX_INVALID_JSON {
                            *close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }

                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                *close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(session_id, error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!(session_id, "websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn forward_bytes(
    bytes: Utf8Bytes,
    socket: &mut WebSocket,
    msgs_out: &mut u64,
    bytes_out: &mut u64,
) -> LoopControl {
    let bytes_len = bytes.len();
    match socket.send(Message::Text(bytes)).await.map_err(NetError::Ws) {
        Ok(()) => {
            *msgs_out += 1;
            *bytes_out += bytes_len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            warn!(error = ?err, "failed to send room frame");
            LoopControl::Disconnect
        }
    }
}

struct ConnStats {
    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
    invalid_json: u32,
    lag_recovery_count: u64,
}

async fn disconnect_cleanup(
    session_id: SessionId,
    room_id: RoomId,
    room_registry: &Arc<RoomRegistry>,
    registered: bool,
    command_tx: &mpsc::Sender<RoomCommand>,
    stats: ConnStats,
) -> Result<(), NetError> {
    // Removing an already removed session is a no-op in the room.
    let removed = command_tx
        .send(RoomCommand::new(session_id, CommandKind::RemoveSession))
        .await
        .map_err(|_| NetError::CommandsClosed);

    if registered {
        room_registry.register_disconnect(room_id).await;
    }

    debug!(
        session_id,
        msgs_in = stats.msgs_in,
        msgs_out = stats.msgs_out,
        bytes_in = stats.bytes_in,
        bytes_out = stats.bytes_out,
        invalid_json = stats.invalid_json,
        lag_recovery_count = stats.lag_recovery_count,
        "connection stats"
    );
    info!(session_id, "client disconnected");
    removed
}
