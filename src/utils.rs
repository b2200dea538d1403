use std::time::{SystemTime, UNIX_EPOCH};

/// 현재 시간을 밀리초 단위의 Unix Timestamp로 반환합니다.
/// 에러 발생 시 시스템 패닉 대신 0(기본값)을 반환합니다.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// WS 연결마다 부여하는 peer 식별자 (연결 수명 동안 유일)
pub fn generate_peer_id() -> String {
    format!("peer_{:016x}", rand::random::<u64>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_id_has_prefix_and_fixed_length() {
        let id = generate_peer_id();
        assert!(id.starts_with("peer_"));
        assert_eq!(id.len(), 5 + 16);
    }

    #[test]
    fn peer_ids_differ() {
        assert_ne!(generate_peer_id(), generate_peer_id());
    }
}
