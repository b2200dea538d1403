// 매직 넘버를 배제하고 시스템 전체의 한계와 기본값을 제어하는 상수 모음입니다.

/// 웹소켓 시그널링 서버 TCP 포트 (Admin HTTP 공용)
pub const SIGNALING_PORT: u16 = 8080;

/// STUN/TURN 응답용 단일 UDP 포트 (well-known 3478)
pub const TRAVERSAL_UDP_PORT: u16 = 3478;

/// UDP 수신 버퍼 크기: datagram 최대 크기
pub const UDP_RECV_BUF_SIZE: usize = 65535;

/// peer별 송신(Egress) 큐 사이즈.
/// 꽉 차면 fan-out이 대기하지 않도록 메시지를 버립니다(Drop).
pub const EGRESS_QUEUE_SIZE: usize = 256;

/// allocation 만료 reaper 실행 주기 (10초)
pub const REAPER_INTERVAL_MS: u64 = 10_000;

/// allocation 기본 수명 (초). 0이면 만료 없음: 명시적 release 전까지 유지
pub const DEFAULT_ALLOCATION_LIFETIME_SECS: u64 = 0;

/// allocate 인증용 자격증명 오버라이드 환경변수
/// 형식: "user:secret,user2:secret2"
pub const CREDENTIALS_ENV: &str = "RENDEZVOUS_CREDENTIALS";

// ----------------------------------------------------------------------------
// 기본 자격증명 (환경변수 미설정 시 단일 사용자 모드)
// (username, secret)
// ----------------------------------------------------------------------------
pub const DEFAULT_CREDENTIALS: &[(&str, &str)] = &[
    ("testuser", "testpassword"),
];
