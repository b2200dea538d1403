// HttpState: HTTP 핸들러 공유 상태 (WS AppState와 별도)

use std::sync::Arc;

use crate::core::{AllocationTable, PeerHub, SessionRegistry};
use crate::utils::current_timestamp;

#[derive(Clone)]
pub struct HttpState {
    pub peer_hub:      Arc<PeerHub>,
    pub sessions:      Arc<SessionRegistry>,
    pub allocations:   Arc<AllocationTable>,
    /// 서버 프로세스 시작 시각 (Unix millis), uptime 계산용
    pub start_time_ms: u64,
}

impl HttpState {
    pub fn new(
        peer_hub:    Arc<PeerHub>,
        sessions:    Arc<SessionRegistry>,
        allocations: Arc<AllocationTable>,
    ) -> Self {
        Self { peer_hub, sessions, allocations, start_time_ms: current_timestamp() }
    }
}
