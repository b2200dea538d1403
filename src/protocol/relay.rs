// SignalingRelay: 시그널링 이벤트 → SessionRegistry 갱신 + fan-out
//
// 자체 상태 없음. 세션 상태는 SessionRegistry, 전송은 PeerHub가 담당.
// 대상 세션/peer가 없으면 에러가 아니라 no-op (연결 종료 경합은 정상 상황).

use std::sync::Arc;
use tracing::{debug, trace};

use crate::core::{PeerHub, SessionRegistry};

use super::message::{ClientMessage, ServerMessage, SignalPayload};

pub struct SignalingRelay {
    registry: Arc<SessionRegistry>,
    peers:    Arc<PeerHub>,
}

impl SignalingRelay {
    pub fn new(registry: Arc<SessionRegistry>, peers: Arc<PeerHub>) -> Self {
        Self { registry, peers }
    }

    /// 클라이언트 이벤트 dispatch. 반환: 알림/중계를 받은 다른 peer 수
    pub fn on_event(&self, peer_id: &str, event: ClientMessage) -> usize {
        match event {
            ClientMessage::JoinRoom { room_id }  => self.on_join(peer_id, &room_id),
            ClientMessage::LeaveRoom { room_id } => self.on_leave(peer_id, Some(&room_id)),
            ClientMessage::Offer { room_id, offer } =>
                self.on_relay_payload(peer_id, &room_id, SignalPayload::Offer(offer)),
            ClientMessage::Answer { room_id, answer } =>
                self.on_relay_payload(peer_id, &room_id, SignalPayload::Answer(answer)),
            ClientMessage::IceCandidate { room_id, candidate } =>
                self.on_relay_payload(peer_id, &room_id, SignalPayload::Candidate(candidate)),
        }
    }

    /// 세션 참여 → 본인에게 joined(기존 멤버), 나머지에게 new-peer
    pub fn on_join(&self, peer_id: &str, session_id: &str) -> usize {
        let others = self.registry.join(session_id, peer_id);
        debug!("[signal] peer={} joined room={} ({} other(s))", peer_id, session_id, others.len());

        self.send_one(peer_id, &ServerMessage::Joined {
            room_id: session_id.to_string(),
            peers:   others.clone(),
        });

        self.fan_out(&others, &ServerMessage::NewPeer {
            room_id: session_id.to_string(),
            sender:  peer_id.to_string(),
        })
    }

    /// session_id 지정 시 해당 세션만, None이면 소속된 모든 세션에서 퇴장 (연결 종료)
    pub fn on_leave(&self, peer_id: &str, session_id: Option<&str>) -> usize {
        let affected = match session_id {
            Some(sid) => vec![(sid.to_string(), self.registry.leave(sid, peer_id))],
            None      => self.registry.leave_all(peer_id),
        };

        affected.into_iter()
            .map(|(room_id, remaining)| {
                debug!("[signal] peer={} left room={} ({} remaining)", peer_id, room_id, remaining.len());
                self.fan_out(&remaining, &ServerMessage::PeerDisconnected {
                    room_id,
                    sender: peer_id.to_string(),
                })
            })
            .sum()
    }

    /// offer / answer / ice-candidate 를 발신자 제외 세션 멤버에게 그대로 중계
    pub fn on_relay_payload(&self, peer_id: &str, session_id: &str, payload: SignalPayload) -> usize {
        let targets = self.registry.peers_of(session_id, peer_id);
        if targets.is_empty() {
            trace!("[signal] {} from peer={} to room={}: no recipients", payload.kind(), peer_id, session_id);
            return 0;
        }

        trace!("[signal] {} from peer={} → room={} ({} target(s))", payload.kind(), peer_id, session_id, targets.len());
        self.fan_out(&targets, &payload.into_message(peer_id))
    }

    fn fan_out(&self, targets: &[String], msg: &ServerMessage) -> usize {
        if targets.is_empty() {
            return 0;
        }
        match msg.to_json() {
            Some(json) => self.peers.send_many(targets, &json),
            None       => 0,
        }
    }

    fn send_one(&self, peer_id: &str, msg: &ServerMessage) {
        if let Some(json) = msg.to_json() {
            if let Err(e) = self.peers.send_to(peer_id, &json) {
                trace!("[signal] reply to peer={} dropped: {}", peer_id, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc;

    struct Harness {
        relay: SignalingRelay,
        hub:   Arc<PeerHub>,
        rxs:   Vec<(String, mpsc::Receiver<String>)>,
    }

    impl Harness {
        fn new(peer_ids: &[&str]) -> Self {
            let hub = Arc::new(PeerHub::new());
            let rxs = peer_ids.iter()
                .map(|pid| {
                    let (tx, rx) = mpsc::channel(16);
                    hub.register(pid, tx);
                    (pid.to_string(), rx)
                })
                .collect();
            let relay = SignalingRelay::new(Arc::new(SessionRegistry::new()), Arc::clone(&hub));
            Self { relay, hub, rxs }
        }

        /// 해당 peer 큐에 쌓인 메시지 전부 꺼내기
        fn drain(&mut self, peer_id: &str) -> Vec<ServerMessage> {
            let (_, rx) = self.rxs.iter_mut().find(|(id, _)| id == peer_id).unwrap();
            let mut out = Vec::new();
            while let Ok(json) = rx.try_recv() {
                out.push(serde_json::from_str(&json).unwrap());
            }
            out
        }
    }

    fn new_peer(room: &str, sender: &str) -> ServerMessage {
        ServerMessage::NewPeer { room_id: room.into(), sender: sender.into() }
    }

    #[test]
    fn first_join_notifies_nobody() {
        let mut h = Harness::new(&["X"]);
        assert_eq!(h.relay.on_join("X", "S"), 0);
        assert_eq!(h.drain("X"), vec![ServerMessage::Joined { room_id: "S".into(), peers: vec![] }]);
    }

    #[test]
    fn second_join_notifies_first_member_once() {
        let mut h = Harness::new(&["X", "Y"]);
        h.relay.on_join("X", "S");
        h.drain("X");

        assert_eq!(h.relay.on_join("Y", "S"), 1);
        assert_eq!(h.drain("X"), vec![new_peer("S", "Y")]);
        assert_eq!(h.drain("Y"), vec![ServerMessage::Joined { room_id: "S".into(), peers: vec!["X".into()] }]);
    }

    #[test]
    fn leave_notifies_remaining_then_destroys_session() {
        let mut h = Harness::new(&["X", "Y", "Z"]);
        h.relay.on_join("X", "S");
        h.relay.on_join("Y", "S");
        h.drain("X");
        h.drain("Y");

        assert_eq!(h.relay.on_leave("X", Some("S")), 1);
        assert_eq!(h.drain("Y"), vec![ServerMessage::PeerDisconnected { room_id: "S".into(), sender: "X".into() }]);

        assert_eq!(h.relay.on_leave("Y", Some("S")), 0);
        assert_eq!(h.relay.on_join("Z", "S"), 0);
        assert!(h.drain("X").is_empty());
        assert!(h.drain("Y").is_empty());
    }

    #[test]
    fn disconnect_leaves_every_session() {
        let mut h = Harness::new(&["A", "B", "C"]);
        h.relay.on_join("A", "r1");
        h.relay.on_join("B", "r1");
        h.relay.on_join("A", "r2");
        h.relay.on_join("C", "r2");
        h.drain("B");
        h.drain("C");

        assert_eq!(h.relay.on_leave("A", None), 2);
        assert_eq!(h.drain("B"), vec![ServerMessage::PeerDisconnected { room_id: "r1".into(), sender: "A".into() }]);
        assert_eq!(h.drain("C"), vec![ServerMessage::PeerDisconnected { room_id: "r2".into(), sender: "A".into() }]);
    }

    #[test]
    fn offer_reaches_only_other_member() {
        let mut h = Harness::new(&["A", "B"]);
        h.relay.on_join("A", "room1");
        h.relay.on_join("B", "room1");
        h.drain("A");
        h.drain("B");

        let n = h.relay.on_event("A", ClientMessage::Offer {
            room_id: "room1".into(),
            offer:   json!({ "sdp": "..." }),
        });
        assert_eq!(n, 1);
        assert!(h.drain("A").is_empty());
        assert_eq!(h.drain("B"), vec![ServerMessage::Offer { offer: json!({ "sdp": "..." }), sender: "A".into() }]);
    }

    #[test]
    fn candidate_to_unknown_session_is_noop() {
        let mut h = Harness::new(&["A"]);
        let n = h.relay.on_event("A", ClientMessage::IceCandidate {
            room_id:   "nowhere".into(),
            candidate: json!({}),
        });
        assert_eq!(n, 0);
        assert!(h.drain("A").is_empty());
    }

    #[test]
    fn member_that_disconnected_is_skipped() {
        let mut h = Harness::new(&["A", "B", "C"]);
        h.relay.on_join("A", "S");
        h.relay.on_join("B", "S");
        h.relay.on_join("C", "S");
        h.hub.unregister("B");

        let n = h.relay.on_relay_payload("A", "S", SignalPayload::Answer(json!("x")));
        assert_eq!(n, 1);
        assert!(h.drain("C").contains(&ServerMessage::Answer { answer: json!("x"), sender: "A".into() }));
    }
}
