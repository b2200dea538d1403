// HTTP 응답 DTO. rvadmin CLI도 같은 타입으로 역직렬화

use serde::{Deserialize, Serialize};

/// GET /admin/status
#[derive(Serialize, Deserialize, Debug)]
pub struct ServerStatus {
    pub uptime_secs:      u64,
    pub peer_count:       usize,
    pub session_count:    usize,
    pub allocation_count: usize,
}

/// GET /admin/sessions 아이템, GET /admin/sessions/{room_id} 응답
#[derive(Serialize, Deserialize, Debug)]
pub struct SessionInfo {
    pub room_id: String,
    /// 참여 순
    pub members: Vec<String>,
}

/// GET /admin/allocations 아이템
#[derive(Serialize, Deserialize, Debug)]
pub struct AllocationInfo {
    pub id:            u64,
    pub client:        String,
    pub targets:       Vec<String>,
    pub registrations: u32,
    pub created_at:    u64,
    pub idle_secs:     u64,
}

/// 에러 응답 본문
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub code:  u16,
    pub error: String,
}
