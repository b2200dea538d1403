use crate::error::RelayError;

/// 1xxx: 요청 형식
pub const INVALID_PAYLOAD:   u16 = 1004;

/// 2xxx: 세션
pub const UNKNOWN_SESSION:   u16 = 2000;
pub const UNKNOWN_PEER:      u16 = 2001;

/// 4xx: traversal 응답 코드와 동일 값
pub const BAD_REQUEST:       u16 = 400;
pub const UNAUTHORIZED:      u16 = 401;

/// 9xxx: 서버 내부
pub const INTERNAL_ERROR:    u16 = 9000;

/// RelayError → 시그널링 에러 코드 변환
pub fn to_error_code(err: &RelayError) -> u16 {
    match err {
        RelayError::InvalidPayload(_)     => INVALID_PAYLOAD,
        RelayError::UnknownSession(_)     => UNKNOWN_SESSION,
        RelayError::UnknownPeer(_)        => UNKNOWN_PEER,
        RelayError::NotThisProtocol
        | RelayError::MalformedAttribute(_) => BAD_REQUEST,
        RelayError::Unauthorized          => UNAUTHORIZED,
        RelayError::InternalError(_)
        | RelayError::Io(_)               => INTERNAL_ERROR,
    }
}
