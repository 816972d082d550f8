//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::{ArenaCommand, ArenaHandle, PlayerId};
use crate::util::rate_limit::{ConnectionRateLimiter, InputGate};
use crate::util::time::tick_interval;
use crate::ws::protocol::{parse_client_msg, ClientMsg, ServerMsg};

type WsSink = futures::stream::SplitSink<WebSocket, Message>;
type WsStream = futures::stream::SplitStream<WebSocket>;

/// Failure writing a frame to a client
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("WebSocket send failed: {0}")]
    Socket(#[from] axum::Error),
}

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let player_id = Uuid::new_v4();
    debug!(player_id = %player_id, "WebSocket upgrade");
    ws.on_upgrade(move |socket| handle_socket(socket, player_id, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, player_id: PlayerId, state: AppState) {
    info!(player_id = %player_id, "A user connected");

    let (mut ws_sink, ws_stream) = socket.split();

    if let Err(e) = send_msg(&mut ws_sink, &ServerMsg::greeting()).await {
        error!(player_id = %player_id, error = %e, "Failed to send greeting");
        return;
    }

    // Subscribe before joining so the first snapshot with this player is not missed
    let snapshot_rx = state.arena.subscribe();
    if state.arena.send(player_id, ArenaCommand::Join).await.is_err() {
        error!(player_id = %player_id, "Arena is not running");
        return;
    }

    let rate_limiter = ConnectionRateLimiter::new(state.config.input_rate_limit);
    run_session(player_id, ws_sink, ws_stream, &state.arena, snapshot_rx, rate_limiter).await;

    // Removal is applied before the next tick
    if state.arena.send(player_id, ArenaCommand::Leave).await.is_err() {
        debug!(player_id = %player_id, "Arena input channel closed before leave");
    }

    info!(player_id = %player_id, "User disconnected");
}

/// Run the WebSocket session with read/write split
async fn run_session(
    player_id: PlayerId,
    mut ws_sink: WsSink,
    mut ws_stream: WsStream,
    arena: &ArenaHandle,
    mut snapshot_rx: broadcast::Receiver<ServerMsg>,
    rate_limiter: ConnectionRateLimiter,
) {
    // Spawn writer task: broadcast snapshots -> WebSocket
    let writer_handle = tokio::spawn(async move {
        loop {
            match snapshot_rx.recv().await {
                Ok(msg) => {
                    if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                        debug!(player_id = %player_id, error = %e, "WebSocket send failed");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(
                        player_id = %player_id,
                        lagged_count = n,
                        "Client lagged, skipping {} snapshots", n
                    );
                    // Continue - don't disconnect for lag
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!(player_id = %player_id, "Snapshot channel closed");
                    break;
                }
            }
        }
    });

    // Reader loop: WebSocket -> arena
    let mut gate = InputGate::new(rate_limiter);
    let mut flush = tokio::time::interval(tick_interval());
    flush.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let forward = tokio::select! {
            frame = ws_stream.next() => {
                let Some(result) = frame else { break };
                match result {
                    Ok(Message::Text(text)) => match parse_client_msg(&text) {
                        Ok(client_msg) => {
                            let event = client_msg.clone();
                            let admitted = gate.admit(client_msg);
                            if admitted.is_none() && !matches!(event, ClientMsg::ClientUpdate(_)) {
                                warn!(player_id = %player_id, event = ?event, "Rate limited input message");
                            }
                            admitted
                        }
                        Err(e) => {
                            warn!(player_id = %player_id, error = %e, "Failed to parse client message");
                            None
                        }
                    },
                    Ok(Message::Binary(_)) => {
                        warn!(player_id = %player_id, "Received binary message, ignoring");
                        None
                    }
                    Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => None,
                    Ok(Message::Close(_)) => {
                        debug!(player_id = %player_id, "Client initiated close");
                        break;
                    }
                    Err(e) => {
                        warn!(player_id = %player_id, error = %e, "WebSocket error");
                        break;
                    }
                }
            }
            _ = flush.tick(), if gate.has_pending() => gate.flush(),
        };

        if let Some(client_msg) = forward {
            if arena
                .send(player_id, ArenaCommand::Client(client_msg))
                .await
                .is_err()
            {
                debug!(player_id = %player_id, "Arena input channel closed");
                break;
            }
        }
    }

    writer_handle.abort();
}

/// Send a message over WebSocket
async fn send_msg(sink: &mut WsSink, msg: &ServerMsg) -> Result<(), SendError> {
    let json = serde_json::to_string(msg)?;
    sink.send(Message::Text(json)).await?;
    Ok(())
}
