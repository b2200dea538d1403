// SessionRegistry: 세션(room) 정의 + 멤버 목록 관리
//
// 네트워크 I/O 없음. connection 객체가 아닌 peer_id만 보관합니다.
// 모든 read-modify-write(join/leave/leave_all)는 단일 Mutex 안에서 원자적으로 수행.

use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::trace;

/// 세션 이름 → 참여 순서대로 정렬된 멤버 목록 (중복 없음)
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Vec<String>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        trace!("Initializing SessionRegistry");
        Self { sessions: Mutex::new(HashMap::new()) }
    }

    /// 세션이 없으면 생성 후 peer 추가.
    /// 반환: 입장 알림을 받아야 할 나머지 멤버 (참여 순서)
    pub fn join(&self, session_id: &str, peer_id: &str) -> Vec<String> {
        let mut sessions = self.sessions.lock();
        let members = sessions.entry(session_id.to_string()).or_insert_with(|| {
            trace!("Session {} not found, creating", session_id);
            Vec::new()
        });

        if !members.iter().any(|m| m == peer_id) {
            members.push(peer_id.to_string());
            trace!("Peer {} joined session {}", peer_id, session_id);
        }

        others(members, peer_id)
    }

    /// 세션에서 peer 제거. 멤버가 비면 세션 삭제.
    /// 반환: 퇴장 알림을 받아야 할 남은 멤버. 멤버가 아니었거나 세션이 사라졌으면 빈 목록
    pub fn leave(&self, session_id: &str, peer_id: &str) -> Vec<String> {
        let mut sessions = self.sessions.lock();
        remove_member(&mut sessions, session_id, peer_id).unwrap_or_default()
    }

    /// peer가 속한 모든 세션에서 제거 (연결 종료 시).
    /// 반환: (세션, 남은 멤버): 세션 이름 순으로 정렬
    pub fn leave_all(&self, peer_id: &str) -> Vec<(String, Vec<String>)> {
        let mut sessions = self.sessions.lock();

        let mut joined: Vec<String> = sessions.iter()
            .filter(|(_, members)| members.iter().any(|m| m == peer_id))
            .map(|(id, _)| id.clone())
            .collect();
        joined.sort();

        joined.into_iter()
            .filter_map(|session_id| {
                remove_member(&mut sessions, &session_id, peer_id)
                    .map(|remaining| (session_id, remaining))
            })
            .collect()
    }

    /// payload fan-out 대상: 발신자를 제외한 현재 멤버
    pub fn peers_of(&self, session_id: &str, peer_id: &str) -> Vec<String> {
        self.sessions.lock()
            .get(session_id)
            .map(|members| others(members, peer_id))
            .unwrap_or_default()
    }

    pub fn members(&self, session_id: &str) -> Option<Vec<String>> {
        self.sessions.lock().get(session_id).cloned()
    }

    /// 현재 세션 수
    pub fn count(&self) -> usize {
        self.sessions.lock().len()
    }

    /// 전체 세션 스냅샷 (admin 조회용), 세션 이름 순
    pub fn snapshot(&self) -> Vec<(String, Vec<String>)> {
        let mut list: Vec<(String, Vec<String>)> = self.sessions.lock()
            .iter()
            .map(|(id, members)| (id.clone(), members.clone()))
            .collect();
        list.sort_by(|a, b| a.0.cmp(&b.0));
        list
    }
}

impl Default for SessionRegistry {
    fn default() -> Self { Self::new() }
}

fn others(members: &[String], peer_id: &str) -> Vec<String> {
    members.iter().filter(|m| m.as_str() != peer_id).cloned().collect()
}

/// 멤버가 아니면 None. 제거 후 비면 세션 삭제 + Some(빈 목록)
fn remove_member(
    sessions:   &mut HashMap<String, Vec<String>>,
    session_id: &str,
    peer_id:    &str,
) -> Option<Vec<String>> {
    let members = sessions.get_mut(session_id)?;
    let pos = members.iter().position(|m| m == peer_id)?;
    members.remove(pos);
    trace!("Peer {} left session {}", peer_id, session_id);

    if members.is_empty() {
        sessions.remove(session_id);
        trace!("Session {} is empty, destroyed", session_id);
        return Some(Vec::new());
    }
    Some(members.clone())
}
