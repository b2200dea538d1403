// PeerHub: WS 연결 라우팅 테이블 (peer_id → egress 큐)
//
// 전송 계층의 "peer X에게 payload 전송" primitive.
// SessionRegistry는 peer_id만 알고, 실제 전송은 여기서만 일어납니다.

use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{trace, warn};

use crate::error::{RelayError, RelayResult};

/// 직렬화된 서버 메시지(JSON) 송신자
pub type PeerTx = mpsc::Sender<String>;

pub struct PeerHub {
    peers: RwLock<HashMap<String, PeerTx>>,
}

impl PeerHub {
    pub fn new() -> Self {
        trace!("Initializing PeerHub");
        Self { peers: RwLock::new(HashMap::new()) }
    }

    pub fn register(&self, peer_id: &str, tx: PeerTx) {
        self.peers.write().insert(peer_id.to_string(), tx);
        trace!("Peer registered: {}", peer_id);
    }

    pub fn unregister(&self, peer_id: &str) {
        self.peers.write().remove(peer_id);
        trace!("Peer unregistered: {}", peer_id);
    }

    pub fn contains(&self, peer_id: &str) -> bool {
        self.peers.read().contains_key(peer_id)
    }

    /// peer 하나에게 전송. 대기하지 않음: 큐가 가득 찼거나 닫혔으면 버림.
    /// 연결 종료 경합으로 peer가 이미 없을 수 있음 (UnknownPeer)
    pub fn send_to(&self, peer_id: &str, json: &str) -> RelayResult<()> {
        let tx = self.peers.read()
            .get(peer_id)
            .cloned()
            .ok_or_else(|| RelayError::UnknownPeer(peer_id.to_string()))?;

        tx.try_send(json.to_string()).map_err(|e| match e {
            TrySendError::Full(_) => {
                warn!("[signal] egress queue full for peer={}, dropping", peer_id);
                RelayError::InternalError(format!("egress queue full: {}", peer_id))
            }
            TrySendError::Closed(_) => RelayError::UnknownPeer(peer_id.to_string()),
        })
    }

    /// peer_id 목록 각각에게 같은 메시지 전송 (목록 순서대로).
    /// 반환: 큐에 들어간 수
    pub fn send_many(&self, peer_ids: &[String], json: &str) -> usize {
        peer_ids.iter()
            .filter(|pid| match self.send_to(pid, json) {
                Ok(())  => true,
                Err(e)  => { trace!("send_many: {}", e); false }
            })
            .count()
    }

    /// 현재 접속 peer 수
    pub fn count(&self) -> usize {
        self.peers.read().len()
    }
}

impl Default for PeerHub {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_unregister() {
        let hub = PeerHub::new();
        let (tx, _rx) = mpsc::channel(4);
        hub.register("a", tx);
        assert!(hub.contains("a"));
        assert_eq!(hub.count(), 1);
        hub.unregister("a");
        assert!(!hub.contains("a"));
        assert_eq!(hub.count(), 0);
    }

    #[test]
    fn send_to_delivers_into_queue() {
        let hub = PeerHub::new();
        let (tx, mut rx) = mpsc::channel(4);
        hub.register("a", tx);
        hub.send_to("a", "{}").unwrap();
        assert_eq!(rx.try_recv().unwrap(), "{}");
    }

    #[test]
    fn send_to_unknown_peer_is_noop() {
        let hub = PeerHub::new();
        assert!(matches!(hub.send_to("ghost", "{}"), Err(RelayError::UnknownPeer(_))));
    }

    #[test]
    fn full_queue_drops_instead_of_waiting() {
        let hub = PeerHub::new();
        let (tx, mut rx) = mpsc::channel(1);
        hub.register("a", tx);
        assert!(hub.send_to("a", "1").is_ok());
        assert!(matches!(hub.send_to("a", "2"), Err(RelayError::InternalError(_))));
        assert_eq!(rx.try_recv().unwrap(), "1");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_queue_is_dropped() {
        let hub = PeerHub::new();
        let (tx, rx) = mpsc::channel(1);
        hub.register("a", tx);
        drop(rx);
        assert!(matches!(hub.send_to("a", "1"), Err(RelayError::UnknownPeer(_))));
    }

    #[test]
    fn send_many_counts_delivered() {
        let hub = PeerHub::new();
        let (tx, _rx) = mpsc::channel(4);
        hub.register("a", tx);
        let n = hub.send_many(&["a".to_string(), "ghost".to_string()], "{}");
        assert_eq!(n, 1);
    }
}
