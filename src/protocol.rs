// 시그널링 계층 (WebSocket JSON)
//   message    : 이벤트 / 서버 메시지 타입
//   error_code : RelayError → 에러 코드
//   relay      : 세션 fan-out
//   ws         : axum WS 핸들러

pub mod error_code;
pub mod message;
pub mod relay;
pub mod ws;

pub use relay::SignalingRelay;
pub use ws::{ws_handler, AppState};
