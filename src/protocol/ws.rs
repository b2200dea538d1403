use axum::{
    extract::{ws::{Message, WebSocket, WebSocketUpgrade}, State},
    response::Response,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, trace, warn};

use crate::config;
use crate::core::{PeerHub, SessionRegistry};
use crate::error::RelayError;
use crate::utils::generate_peer_id;

use super::error_code::to_error_code;
use super::message::{ClientMessage, ServerMessage};
use super::relay::SignalingRelay;

// ----------------------------------------------------------------------------
// [공유 상태]
// ----------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub peer_hub: Arc<PeerHub>,
    pub relay:    Arc<SignalingRelay>,
}

impl AppState {
    pub fn new(peer_hub: Arc<PeerHub>, registry: Arc<SessionRegistry>) -> Self {
        let relay = Arc::new(SignalingRelay::new(registry, Arc::clone(&peer_hub)));
        Self { peer_hub, relay }
    }
}

// ----------------------------------------------------------------------------
// [WS 진입점]
// ----------------------------------------------------------------------------

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

// ----------------------------------------------------------------------------
// [핵심] 개별 peer 연결 생명주기
//   HELLO 전송 → PeerHub 등록 → 이벤트 루프 → leave_all + 등록 해제
// ----------------------------------------------------------------------------

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (peer_tx, mut peer_rx) = mpsc::channel::<String>(config::EGRESS_QUEUE_SIZE);

    let peer_id = generate_peer_id();

    // HELLO는 등록 전에 직접 전송: 항상 첫 메시지
    let Some(hello) = (ServerMessage::Hello { peer_id: peer_id.clone() }).to_json() else {
        return;
    };
    if ws_tx.send(Message::Text(hello.into())).await.is_err() {
        return;
    }

    state.peer_hub.register(&peer_id, peer_tx);
    info!("[signal] peer connected: {}", peer_id);

    // [rx_loop] egress 큐 → WS 송신
    let rx_loop = tokio::spawn(async move {
        while let Some(json) = peer_rx.recv().await {
            if ws_tx.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // [tx_loop] WS 수신 → relay dispatch
    while let Some(msg) = ws_rx.next().await {
        let text = match msg {
            Ok(Message::Text(t))  => t,
            Ok(Message::Close(_)) => break,
            Err(e) => { warn!("[signal] WS error peer={}: {}", peer_id, e); break; }
            _ => continue,
        };

        let event: ClientMessage = match serde_json::from_str(&text) {
            Ok(ev) => ev,
            Err(e) => {
                warn!("[signal] invalid event from peer={}: {}", peer_id, e);
                reply_error(&state, &peer_id, RelayError::InvalidPayload(e.to_string()));
                continue;
            }
        };

        trace!("[signal] event from peer={}: {:?}", peer_id, event);
        state.relay.on_event(&peer_id, event);
    }

    // 연결 종료: 소속 세션 전부에서 퇴장 + 라우팅 해제
    let notified = state.relay.on_leave(&peer_id, None);
    state.peer_hub.unregister(&peer_id);
    rx_loop.abort();
    info!("[signal] peer disconnected: {} ({} peer(s) notified)", peer_id, notified);
}

fn reply_error(state: &AppState, peer_id: &str, err: RelayError) {
    let msg = ServerMessage::Error { code: to_error_code(&err), reason: err.to_string() };
    if let Some(json) = msg.to_json() {
        let _ = state.peer_hub.send_to(peer_id, &json);
    }
}
