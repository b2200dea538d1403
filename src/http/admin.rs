// Admin REST API 핸들러

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::net::SocketAddr;
use tracing::info;

use crate::error::RelayError;
use crate::protocol::error_code::to_error_code;
use crate::utils::current_timestamp;

use super::dto::*;
use super::state::HttpState;

// ----------------------------------------------------------------------------
// [유틸]
// ----------------------------------------------------------------------------

fn error_response(status: StatusCode, err: RelayError) -> Response {
    (status, Json(ErrorBody { code: to_error_code(&err), error: err.to_string() })).into_response()
}

// ----------------------------------------------------------------------------
// [핸들러]
// ----------------------------------------------------------------------------

/// GET /admin/status
pub async fn admin_status(State(state): State<HttpState>) -> impl IntoResponse {
    let uptime_secs = current_timestamp().saturating_sub(state.start_time_ms) / 1000;

    Json(ServerStatus {
        uptime_secs,
        peer_count:       state.peer_hub.count(),
        session_count:    state.sessions.count(),
        allocation_count: state.allocations.count(),
    })
}

/// GET /admin/sessions
pub async fn admin_list_sessions(State(state): State<HttpState>) -> impl IntoResponse {
    let list: Vec<SessionInfo> = state.sessions
        .snapshot()
        .into_iter()
        .map(|(room_id, members)| SessionInfo { room_id, members })
        .collect();
    Json(list)
}

/// GET /admin/sessions/{room_id}
pub async fn admin_get_session(
    State(state): State<HttpState>,
    Path(room_id): Path<String>,
) -> Response {
    match state.sessions.members(&room_id) {
        Some(members) => Json(SessionInfo { room_id, members }).into_response(),
        None          => error_response(StatusCode::NOT_FOUND, RelayError::UnknownSession(room_id)),
    }
}

/// GET /admin/allocations
pub async fn admin_list_allocations(State(state): State<HttpState>) -> impl IntoResponse {
    let now = current_timestamp();
    let list: Vec<AllocationInfo> = state.allocations
        .snapshot()
        .into_iter()
        .map(|a| AllocationInfo {
            id:            a.id.0,
            client:        a.client.to_string(),
            targets:       a.endpoints.iter()
                .filter(|ep| **ep != a.client)
                .map(|ep| ep.to_string())
                .collect(),
            registrations: a.registrations,
            created_at:    a.created_at,
            idle_secs:     now.saturating_sub(a.refreshed_at) / 1000,
        })
        .collect();
    Json(list)
}

/// DELETE /admin/allocations/{client}
/// client: "ip:port" (IPv6는 "[addr]:port")
pub async fn admin_release_allocation(
    State(state): State<HttpState>,
    Path(client): Path<String>,
) -> Response {
    let addr: SocketAddr = match client.parse() {
        Ok(a)  => a,
        Err(e) => return error_response(
            StatusCode::BAD_REQUEST,
            RelayError::InvalidPayload(format!("{}: {}", client, e)),
        ),
    };

    if !state.allocations.release(addr) {
        return error_response(StatusCode::NOT_FOUND, RelayError::UnknownPeer(client));
    }

    info!("[http] allocation for {} released by admin", addr);
    StatusCode::NO_CONTENT.into_response()
}
