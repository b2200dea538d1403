// HTTP REST API (Admin)
//
// GET    /admin/status                  → 서버 상태 요약
// GET    /admin/sessions                → 세션 전체 목록
// GET    /admin/sessions/{room_id}      → 세션 상세 (참여 순 멤버)
// GET    /admin/allocations             → relay allocation 전체 목록
// DELETE /admin/allocations/{client}    → allocation 명시적 해제

pub mod admin;
pub mod dto;
pub mod state;

pub use admin::{admin_get_session, admin_list_allocations, admin_list_sessions, admin_release_allocation, admin_status};
pub use state::HttpState;
