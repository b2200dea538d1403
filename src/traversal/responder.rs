// TraversalResponder: datagram 1개 → 응답/전달 목록 (한 번에 종결)
//
// 처리 흐름:
//   decode_header
//     → NotThisProtocol : 조용히 drop (응답 없음, 에러 로그 없음)
//     → binding  : 관측 주소로 XOR-MAPPED-ADDRESS 응답. allocation/자격증명 미사용
//     → allocate : 자격증명 확인 → 실패 401 / 성공 시 allocation 등록 → success
//     → send     : sender key의 relay 대상들에게 헤더 뒤 payload 그대로 전달, 응답 없음
//     → 그 외    : drop
//
// 소켓을 직접 다루지 않음. 실제 송신은 net.rs가 Outgoing 목록을 받아 수행.

use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::core::{AllocationTable, CredentialStore};
use crate::error::{RelayError, RelayResult};

use super::codec::{self, ErrorCode, MessageClass, MessageHeader, Method};

/// 송신할 datagram 1개
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub to:    SocketAddr,
    pub bytes: Bytes,
}

pub struct TraversalResponder {
    allocations: Arc<AllocationTable>,
    credentials: Arc<CredentialStore>,
}

impl TraversalResponder {
    pub fn new(allocations: Arc<AllocationTable>, credentials: Arc<CredentialStore>) -> Self {
        Self { allocations, credentials }
    }

    /// src: 전송 계층이 본 송신자 주소 (NAT 바깥 관측 주소)
    pub fn handle(&self, datagram: Bytes, src: SocketAddr) -> Vec<Outgoing> {
        let header = match codec::decode_header(&datagram) {
            Ok(h)  => h,
            Err(_) => {
                trace!("[traversal] not this protocol from {} ({} bytes), dropping", src, datagram.len());
                return Vec::new();
            }
        };

        trace!("[traversal] {:?}/{:?} from {} len={}", header.class, header.method, src, header.length);

        match (header.class, header.method) {
            (MessageClass::Request, Method::Binding) => {
                vec![Outgoing { to: src, bytes: codec::encode_binding_success(&header.transaction_id, &src) }]
            }
            (MessageClass::Request, Method::Allocate) => {
                let bytes = match self.allocate(&datagram, &header, src) {
                    Ok(resp) => resp,
                    Err(RelayError::Unauthorized) => {
                        debug!("[traversal] allocate unauthorized from {}", src);
                        codec::encode_error(&header.transaction_id, ErrorCode::Unauthorized)
                    }
                    Err(e) => {
                        debug!("[traversal] allocate rejected from {}: {}", src, e);
                        codec::encode_error(&header.transaction_id, ErrorCode::BadRequest)
                    }
                };
                vec![Outgoing { to: src, bytes }]
            }
            (MessageClass::Request | MessageClass::Indication, Method::Send) => {
                self.relay(&datagram, src)
            }
            (class, method) => {
                trace!("[traversal] unhandled {:?}/{:?} from {}, dropping", class, method, src);
                Vec::new()
            }
        }
    }

    fn allocate(&self, datagram: &[u8], header: &MessageHeader, src: SocketAddr) -> RelayResult<Bytes> {
        let creds = codec::extract_credentials(datagram)?.ok_or(RelayError::Unauthorized)?;
        if !self.credentials.verify(&creds.username, &creds.secret) {
            return Err(RelayError::Unauthorized);
        }

        // 테이블 변경 전에 속성 전체를 먼저 검증
        let peers = codec::extract_peer_addresses(datagram, &header.transaction_id)?;
        let id = self.allocations.register_allocation(src, &peers);
        debug!("[traversal] {} allocated for {} user={} peers={:?}", id, src, creds.username, peers);

        Ok(codec::encode_allocate_success(&header.transaction_id))
    }

    fn relay(&self, datagram: &Bytes, src: SocketAddr) -> Vec<Outgoing> {
        let targets = self.allocations.relay_targets(src);
        if targets.is_empty() {
            trace!("[traversal] send from {} has no relay targets, dropping", src);
            return Vec::new();
        }

        let payload = datagram.slice(codec::HEADER_LEN..);
        trace!("[traversal] relaying {} bytes from {} to {} target(s)", payload.len(), src, targets.len());
        targets.into_iter()
            .map(|to| Outgoing { to, bytes: payload.clone() })
            .collect()
    }
}
