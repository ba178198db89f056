//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info, warn};

use crate::app::AppState;
use crate::matchmaking::MatchmakingError;
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};
use crate::ws::ClientHandle;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (client, outbound) = ClientHandle::channel();
    let client_id = client.id();
    info!(client_id = %client_id, "New WebSocket connection");

    let (mut ws_sink, ws_stream) = socket.split();

    let welcome = ServerMsg::Welcome {
        client_id,
        server_time: unix_millis(),
    };
    if let Err(e) = send_msg(&mut ws_sink, &welcome).await {
        error!(client_id = %client_id, error = %e, "Failed to send welcome");
        return;
    }

    run_connection(&client, ws_sink, ws_stream, outbound, &state).await;

    // Socket gone: leave the queue or forfeit the match
    state.matchmaking.handle_disconnect(client_id);

    info!(client_id = %client_id, "WebSocket connection closed");
}

/// Pump outbound messages to the socket and dispatch inbound frames
async fn run_connection(
    client: &ClientHandle,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut ws_stream: SplitStream<WebSocket>,
    mut outbound: UnboundedReceiver<ServerMsg>,
    state: &AppState,
) {
    let client_id = client.id();
    let rate_limiter = ConnectionRateLimiter::new();

    // Writer task: game notifications -> WebSocket
    let writer_handle = tokio::spawn(async move {
        while let Some(msg) = outbound.recv().await {
            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(client_id = %client_id, error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    // Reader loop: WebSocket -> matchmaking / session
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_frame() {
                    warn!(client_id = %client_id, "Rate limited inbound frame");
                    continue;
                }

                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(msg) => dispatch(client, msg, state),
                    Err(e) => {
                        warn!(client_id = %client_id, error = %e, "Failed to parse client message");
                        client.error("invalid_message", format!("Invalid message: {e}"));
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(client_id = %client_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(client_id = %client_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(client_id = %client_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    writer_handle.abort();
}

/// Route one parsed client message
fn dispatch(client: &ClientHandle, msg: ClientMsg, state: &AppState) {
    let matchmaking = &state.matchmaking;

    match msg {
        ClientMsg::JoinQueue { name } => {
            // Refusals are reported to the client by the service
            if let Err(e) = matchmaking.enqueue(client.clone(), name) {
                debug!(client_id = %client.id(), error = %e, "Join refused");
            }
        }
        ClientMsg::LeaveQueue => {
            matchmaking.dequeue(client.id());
        }
        ClientMsg::Command { command } => match matchmaking.submit(client.id(), command) {
            // Rejections already went out as command_rejected
            Ok(()) | Err(MatchmakingError::Rejected(_)) => {}
            Err(e) => client.error(e.code(), e.to_string()),
        },
        ClientMsg::ElixirReport { elixir } => {
            if let Err(e) = matchmaking.report_elixir(client.id(), elixir) {
                client.error(e.code(), e.to_string());
            }
        }
        ClientMsg::Ping { t } => client.send(ServerMsg::Pong { t }),
    }
}

/// Send a message over WebSocket
async fn send_msg(sink: &mut SplitSink<WebSocket, Message>, msg: &ServerMsg) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::protocol::Command;

    #[tokio::test]
    async fn ping_is_answered_with_pong() {
        let state = AppState::for_tests();
        let (client, mut rx) = ClientHandle::channel();

        dispatch(&client, ClientMsg::Ping { t: 42 }, &state);
        assert!(matches!(rx.try_recv(), Ok(ServerMsg::Pong { t: 42 })));
    }

    #[tokio::test]
    async fn command_outside_match_is_an_error() {
        let state = AppState::for_tests();
        let (client, mut rx) = ClientHandle::channel();

        let command = Command::Surrender {
            timestamp: unix_millis(),
        };
        dispatch(&client, ClientMsg::Command { command }, &state);
        assert!(matches!(
            rx.try_recv(),
            Ok(ServerMsg::Error { code, .. }) if code == "not_in_match"
        ));
    }

    #[tokio::test]
    async fn join_and_leave_queue() {
        let state = AppState::for_tests();
        let (client, mut rx) = ClientHandle::channel();

        dispatch(&client, ClientMsg::JoinQueue { name: Some("ana".into()) }, &state);
        assert!(matches!(rx.try_recv(), Ok(ServerMsg::QueueJoined { queue_position: 1, .. })));
        assert_eq!(state.matchmaking.queue_size(), 1);

        dispatch(&client, ClientMsg::LeaveQueue, &state);
        assert!(matches!(rx.try_recv(), Ok(ServerMsg::QueueLeft)));
        assert_eq!(state.matchmaking.queue_size(), 0);
    }

    #[tokio::test]
    async fn unknown_unit_type_is_rejected_in_match() {
        let state = AppState::for_tests();
        let (alice, mut alice_rx) = ClientHandle::channel();
        let (bob, _bob_rx) = ClientHandle::channel();
        dispatch(&alice, ClientMsg::JoinQueue { name: None }, &state);
        dispatch(&bob, ClientMsg::JoinQueue { name: None }, &state);
        while alice_rx.try_recv().is_ok() {}

        let raw = format!(
            r#"{{"type":"command","command":{{"type":"deploy_unit","unit_type":"pekka","position":{{"x":2.0,"y":10.0}},"timestamp":{}}}}}"#,
            unix_millis()
        );
        let msg: ClientMsg = serde_json::from_str(&raw).unwrap();
        dispatch(&alice, msg, &state);

        let mut replies = Vec::new();
        while let Ok(reply) = alice_rx.try_recv() {
            replies.push(reply);
        }
        assert!(replies.iter().any(|reply| matches!(
            reply,
            ServerMsg::CommandRejected { code, .. } if code == "invalid_unit_type"
        )));
        assert!(!replies
            .iter()
            .any(|reply| matches!(reply, ServerMsg::Error { code, .. } if code == "invalid_message")));

        state.matchmaking.shutdown();
    }
}
