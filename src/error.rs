use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    // --- traversal (UDP) ---
    /// 20바이트 미만이거나 cookie 불일치: 다른 프로토콜 트래픽, 조용히 무시
    #[error("Not a traversal protocol datagram")]
    NotThisProtocol,
    #[error("Malformed attribute: {0}")]
    MalformedAttribute(String),
    #[error("Unauthorized")]
    Unauthorized,

    // --- signaling (WS) ---
    #[error("Unknown session: {0}")]
    UnknownSession(String),
    #[error("Unknown peer: {0}")]
    UnknownPeer(String),
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Internal error: {0}")]
    InternalError(String),
    #[error("Network I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RelayResult<T> = Result<T, RelayError>;
