use serde::{Deserialize, Serialize};
use serde_json::Value;

// ----------------------------------------------------------------------------
// [C→S] 클라이언트 이벤트: 닫힌 집합, "type" 태그로 구분
// ----------------------------------------------------------------------------

/// 예시:
///   { "type": "join-room", "room_id": "room1" }
///   { "type": "offer", "room_id": "room1", "offer": { "sdp": "..." } }
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    JoinRoom     { room_id: String },
    LeaveRoom    { room_id: String },
    Offer        { room_id: String, offer: Value },
    Answer       { room_id: String, answer: Value },
    IceCandidate { room_id: String, candidate: Value },
}

/// 세션 멤버에게 그대로 중계되는 협상 payload (내용은 해석하지 않음)
#[derive(Debug, Clone, PartialEq)]
pub enum SignalPayload {
    Offer(Value),
    Answer(Value),
    Candidate(Value),
}

impl SignalPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            SignalPayload::Offer(_)     => "offer",
            SignalPayload::Answer(_)    => "answer",
            SignalPayload::Candidate(_) => "ice-candidate",
        }
    }

    pub fn into_message(self, sender: &str) -> ServerMessage {
        let sender = sender.to_string();
        match self {
            SignalPayload::Offer(offer)         => ServerMessage::Offer { offer, sender },
            SignalPayload::Answer(answer)       => ServerMessage::Answer { answer, sender },
            SignalPayload::Candidate(candidate) => ServerMessage::IceCandidate { candidate, sender },
        }
    }
}

// ----------------------------------------------------------------------------
// [S→C] 서버 메시지
// ----------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// 연결 직후 1회: 서버가 부여한 peer_id 안내
    Hello            { peer_id: String },
    /// join-room 요청자 본인에게: 기존 멤버 목록 (참여 순)
    Joined           { room_id: String, peers: Vec<String> },
    NewPeer          { room_id: String, sender: String },
    PeerDisconnected { room_id: String, sender: String },
    Offer            { offer: Value, sender: String },
    Answer           { answer: Value, sender: String },
    IceCandidate     { candidate: Value, sender: String },
    Error            { code: u16, reason: String },
}

impl ServerMessage {
    pub fn to_json(&self) -> Option<String> {
        match serde_json::to_string(self) {
            Ok(json) => Some(json),
            Err(e)   => {
                tracing::error!("[signal] serialize failed: {}", e);
                None
            }
        }
    }
}
