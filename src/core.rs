// 네트워크 로직과 분리된 순수 상태 관리 모듈입니다.
// 테이블마다 자기 락을 소유하고, 원자적 연산만 외부에 노출합니다.

pub mod allocation;
pub mod credential;
pub mod peer;
pub mod session;

pub use allocation::{Allocation, AllocationId, AllocationTable};
pub use credential::CredentialStore;
pub use peer::{PeerHub, PeerTx};
pub use session::SessionRegistry;
