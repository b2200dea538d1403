pub mod config;
pub mod core;
pub mod error;
pub mod http;
pub mod protocol;
pub mod reaper;
pub mod traversal;
pub mod utils;

use axum::{routing::{delete, get}, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::core::{AllocationTable, CredentialStore, PeerHub, SessionRegistry};
use crate::error::RelayResult;
use crate::http::HttpState;
use crate::protocol::{ws_handler, AppState};
use crate::traversal::TraversalResponder;

/// CLI에서 주입되는 런타임 설정
/// - 기본값은 config.rs 상수
/// - 자격증명은 환경변수(RENDEZVOUS_CREDENTIALS)로 별도 관리
pub struct ServerArgs {
    pub port:                     u16,
    pub udp_port:                 u16,
    pub allocation_lifetime_secs: u64, // 0이면 만료 없음
}

impl Default for ServerArgs {
    fn default() -> Self {
        Self {
            port:                     config::SIGNALING_PORT,
            udp_port:                 config::TRAVERSAL_UDP_PORT,
            allocation_lifetime_secs: config::DEFAULT_ALLOCATION_LIFETIME_SECS,
        }
    }
}

pub async fn run_server(args: ServerArgs) -> RelayResult<()> {
    let peer_hub    = Arc::new(PeerHub::new());
    let registry    = Arc::new(SessionRegistry::new());
    let allocations = Arc::new(AllocationTable::new());
    let credentials = Arc::new(CredentialStore::load());

    // STUN/TURN 응답 태스크
    let udp_socket = match traversal::bind_traversal_socket(args.udp_port).await {
        Ok(s)  => Arc::new(s),
        Err(e) => {
            error!("[traversal] Failed to bind udp port {}: {}", args.udp_port, e);
            return Err(e);
        }
    };
    let responder = Arc::new(TraversalResponder::new(Arc::clone(&allocations), credentials));
    tokio::spawn(traversal::run_traversal_responder(udp_socket, responder));

    // allocation 만료 태스크 (lifetime > 0 일 때만)
    if args.allocation_lifetime_secs > 0 {
        tokio::spawn(reaper::run_allocation_reaper(
            Arc::clone(&allocations),
            args.allocation_lifetime_secs,
        ));
    }

    let app_state  = AppState::new(Arc::clone(&peer_hub), Arc::clone(&registry));
    let http_state = HttpState::new(
        Arc::clone(&peer_hub),
        Arc::clone(&registry),
        Arc::clone(&allocations),
    );

    let admin_router = Router::new()
        .route("/admin/status",                get(http::admin_status))
        .route("/admin/sessions",              get(http::admin_list_sessions))
        .route("/admin/sessions/{room_id}",    get(http::admin_get_session))
        .route("/admin/allocations",           get(http::admin_list_allocations))
        .route("/admin/allocations/{client}",  delete(http::admin_release_allocation))
        .with_state(http_state);

    // CORS: 전체 허용 (브라우저 클라이언트가 다른 origin에서 접속)
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .with_state(app_state)
        .merge(admin_router)
        .layer(cors);

    let addr     = format!("0.0.0.0:{}", args.port);
    let listener = TcpListener::bind(&addr).await?;

    info!("[mini-rendezvous] Signaling Server on ws://{}", addr);
    info!("[mini-rendezvous] STUN/TURN responder on udp port {}", args.udp_port);
    if args.allocation_lifetime_secs > 0 {
        info!("[mini-rendezvous] Allocation lifetime: {}s", args.allocation_lifetime_secs);
    } else {
        info!("[mini-rendezvous] Allocation lifetime: unlimited");
    }

    axum::serve(listener, app).await?;
    Ok(())
}
