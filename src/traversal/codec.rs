//! STUN/TURN 메시지 헤더 파싱 + 최소 속성 집합 인코딩/디코딩.
//!
//! ```text
//!  0                   1                   2                   3
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |0 0|     Message Type          |    Message Length (attrs)     |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                   Magic Cookie 0x2112A442                     |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                  Transaction ID (96 bits)                     |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |            Attributes (type 2 | length 2 | value, 4B 정렬)     |
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use std::net::SocketAddr;

use crate::error::{RelayError, RelayResult};

use super::address::{self, TransactionId, MAGIC_COOKIE};

pub const HEADER_LEN: usize = 20;

/// 와이어 상의 message type 값
pub mod msg_type {
    pub const BINDING_REQUEST:  u16 = 0x0001;
    pub const BINDING_SUCCESS:  u16 = 0x0101;
    pub const ALLOCATE_REQUEST: u16 = 0x0003;
    pub const ALLOCATE_SUCCESS: u16 = 0x0103;
    pub const ERROR_RESPONSE:   u16 = 0x0111;
    pub const SEND_REQUEST:     u16 = 0x0009;
}

/// 속성 type
pub mod attr {
    pub const USERNAME:           u16 = 0x0006;
    /// RFC 3489 legacy PASSWORD: 단순 자격증명 전달용
    pub const PASSWORD:           u16 = 0x0007;
    pub const ERROR_CODE:         u16 = 0x0009;
    pub const XOR_PEER_ADDRESS:   u16 = 0x0012;
    pub const XOR_MAPPED_ADDRESS: u16 = 0x0020;
}

// ----------------------------------------------------------------------------
// [헤더]
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageClass {
    Request,
    Indication,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Binding,
    Allocate,
    Send,
    Other(u16),
}

impl Method {
    fn from_bits(bits: u16) -> Self {
        match bits {
            0x001 => Method::Binding,
            0x003 => Method::Allocate,
            0x009 => Method::Send,
            other => Method::Other(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub message_type:   u16,
    pub class:          MessageClass,
    pub method:         Method,
    /// 헤더 이후 속성 영역 길이 (헤더 필드 값 그대로)
    pub length:         u16,
    pub transaction_id: TransactionId,
}

/// message type에서 class / method 분리 (RFC 5389 §6 비트 배치)
///   M11..M7 | C1 | M6..M4 | C0 | M3..M0
pub fn split_message_type(message_type: u16) -> (MessageClass, Method) {
    let class = match ((message_type & 0x0100) >> 7) | ((message_type & 0x0010) >> 4) {
        0 => MessageClass::Request,
        1 => MessageClass::Indication,
        2 => MessageClass::Success,
        _ => MessageClass::Error,
    };
    let method = (message_type & 0x000F)
        | ((message_type & 0x00E0) >> 1)
        | ((message_type & 0x3E00) >> 2);
    (class, Method::from_bits(method))
}

/// 20바이트 미만, 상위 2비트 != 0, cookie 불일치 → NotThisProtocol
/// (같은 포트로 들어오는 다른 UDP 트래픽과 공존해야 하므로 에러가 아닌 무시 대상)
pub fn decode_header(bytes: &[u8]) -> RelayResult<MessageHeader> {
    if bytes.len() < HEADER_LEN {
        return Err(RelayError::NotThisProtocol);
    }

    let message_type = u16::from_be_bytes([bytes[0], bytes[1]]);
    if message_type & 0xC000 != 0 {
        return Err(RelayError::NotThisProtocol);
    }

    let cookie = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if cookie != MAGIC_COOKIE {
        return Err(RelayError::NotThisProtocol);
    }

    let mut transaction_id = [0u8; 12];
    transaction_id.copy_from_slice(&bytes[8..HEADER_LEN]);

    let (class, method) = split_message_type(message_type);
    Ok(MessageHeader {
        message_type,
        class,
        method,
        length: u16::from_be_bytes([bytes[2], bytes[3]]),
        transaction_id,
    })
}

/// 고정 헤더 뒤의 바이트 (send 요청의 relay payload)
pub fn payload(bytes: &[u8]) -> &[u8] {
    bytes.get(HEADER_LEN..).unwrap_or(&[])
}

// ----------------------------------------------------------------------------
// [속성 파싱]
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub kind:  u16,
    pub value: &'a [u8],
}

/// 헤더 뒤 TLV 목록 순회. 선언 길이가 버퍼를 넘는 속성은 MalformedAttribute
pub fn parse_attributes(bytes: &[u8]) -> RelayResult<Vec<Attribute<'_>>> {
    let mut attrs = Vec::new();
    let mut offset = HEADER_LEN;

    while offset + 4 <= bytes.len() {
        let kind = u16::from_be_bytes([bytes[offset], bytes[offset + 1]]);
        let len  = u16::from_be_bytes([bytes[offset + 2], bytes[offset + 3]]) as usize;
        offset += 4;

        if offset + len > bytes.len() {
            return Err(RelayError::MalformedAttribute(format!(
                "attribute 0x{:04x} declares {} bytes, {} left", kind, len, bytes.len() - offset
            )));
        }
        attrs.push(Attribute { kind, value: &bytes[offset..offset + len] });

        // 4바이트 정렬 패딩 skip (마지막 속성은 패딩이 잘려 있어도 허용)
        offset += (len + 3) & !3;
    }

    Ok(attrs)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub secret:   String,
}

/// USERNAME + PASSWORD 속성 추출. 둘 중 하나라도 없으면 None
pub fn extract_credentials(bytes: &[u8]) -> RelayResult<Option<Credentials>> {
    let mut username = None;
    let mut secret   = None;

    for a in parse_attributes(bytes)? {
        match a.kind {
            attr::USERNAME => username = Some(utf8_value(a)?),
            attr::PASSWORD => secret   = Some(utf8_value(a)?),
            _ => {}
        }
    }

    Ok(username.zip(secret).map(|(username, secret)| Credentials { username, secret }))
}

/// allocate 요청에 실린 XOR-PEER-ADDRESS 전부 디코드
pub fn extract_peer_addresses(bytes: &[u8], transaction_id: &TransactionId) -> RelayResult<Vec<SocketAddr>> {
    parse_attributes(bytes)?
        .into_iter()
        .filter(|a| a.kind == attr::XOR_PEER_ADDRESS)
        .map(|a| address::decode(a.value, transaction_id))
        .collect()
}

/// 에러 응답의 ERROR-CODE 속성 → 숫자 코드 (예: 401)
pub fn extract_error_code(bytes: &[u8]) -> Option<u16> {
    let attrs = parse_attributes(bytes).ok()?;
    let a = attrs.iter().find(|a| a.kind == attr::ERROR_CODE)?;
    if a.value.len() < 4 {
        return None;
    }
    Some((a.value[2] & 0x07) as u16 * 100 + a.value[3] as u16)
}

/// XOR-MAPPED-ADDRESS 속성 → 주소 (binding 응답 확인용)
pub fn extract_mapped_address(bytes: &[u8], transaction_id: &TransactionId) -> Option<SocketAddr> {
    let attrs = parse_attributes(bytes).ok()?;
    let a = attrs.iter().find(|a| a.kind == attr::XOR_MAPPED_ADDRESS)?;
    address::decode(a.value, transaction_id).ok()
}

fn utf8_value(a: Attribute<'_>) -> RelayResult<String> {
    std::str::from_utf8(a.value)
        .map(str::to_string)
        .map_err(|_| RelayError::MalformedAttribute(format!("attribute 0x{:04x} is not UTF-8", a.kind)))
}

// ----------------------------------------------------------------------------
// [인코딩]
// ----------------------------------------------------------------------------

/// 에러 응답 코드: 닫힌 집합
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    BadRequest,
    Unauthorized,
}

impl ErrorCode {
    pub fn code(self) -> u16 {
        match self {
            ErrorCode::BadRequest   => 400,
            ErrorCode::Unauthorized => 401,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            ErrorCode::BadRequest   => "Bad Request",
            ErrorCode::Unauthorized => "Unauthorized",
        }
    }
}

/// 헤더 + TLV 속성 조립기. build() 시 헤더 length 필드를 채움
pub struct MessageBuilder {
    buf:            BytesMut,
    transaction_id: TransactionId,
}

impl MessageBuilder {
    pub fn new(message_type: u16, transaction_id: &TransactionId) -> Self {
        let mut buf = BytesMut::with_capacity(64);
        buf.put_u16(message_type);
        buf.put_u16(0); // length placeholder
        buf.put_u32(MAGIC_COOKIE);
        buf.put_slice(transaction_id);
        Self { buf, transaction_id: *transaction_id }
    }

    pub fn attribute(mut self, kind: u16, value: &[u8]) -> Self {
        self.buf.put_u16(kind);
        self.buf.put_u16(value.len() as u16);
        self.buf.put_slice(value);
        self.pad();
        self
    }

    pub fn xor_address(mut self, kind: u16, addr: &SocketAddr) -> Self {
        self.buf.put_u16(kind);
        self.buf.put_u16(address::encoded_len(addr) as u16);
        address::encode(addr, &self.transaction_id, &mut self.buf);
        self
    }

    /// 헤더 뒤에 raw 바이트 그대로 추가 (send 요청 payload)
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.buf.put_slice(bytes);
        self
    }

    pub fn build(mut self) -> Bytes {
        let len = (self.buf.len() - HEADER_LEN) as u16;
        self.buf[2..4].copy_from_slice(&len.to_be_bytes());
        self.buf.freeze()
    }

    fn pad(&mut self) {
        while self.buf.len() % 4 != 0 {
            self.buf.put_u8(0);
        }
    }
}

pub fn encode_binding_success(transaction_id: &TransactionId, mapped: &SocketAddr) -> Bytes {
    MessageBuilder::new(msg_type::BINDING_SUCCESS, transaction_id)
        .xor_address(attr::XOR_MAPPED_ADDRESS, mapped)
        .build()
}

/// 속성 없는 고정 20바이트 응답
pub fn encode_allocate_success(transaction_id: &TransactionId) -> Bytes {
    MessageBuilder::new(msg_type::ALLOCATE_SUCCESS, transaction_id).build()
}

/// ERROR-CODE: reserved(2) | class(1, 하위 3비트) | number(1) | reason phrase
pub fn encode_error(transaction_id: &TransactionId, code: ErrorCode) -> Bytes {
    let n = code.code();
    let mut value = Vec::with_capacity(4 + code.reason().len());
    value.extend_from_slice(&[0x00, 0x00, (n / 100) as u8, (n % 100) as u8]);
    value.extend_from_slice(code.reason().as_bytes());

    MessageBuilder::new(msg_type::ERROR_RESPONSE, transaction_id)
        .attribute(attr::ERROR_CODE, &value)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TXID: TransactionId = [0xAA; 12];

    #[test]
    fn decode_binding_request_header() {
        let req = MessageBuilder::new(msg_type::BINDING_REQUEST, &TXID).build();
        let h = decode_header(&req).unwrap();
        assert_eq!(h.message_type, msg_type::BINDING_REQUEST);
        assert_eq!(h.class, MessageClass::Request);
        assert_eq!(h.method, Method::Binding);
        assert_eq!(h.length, 0);
        assert_eq!(h.transaction_id, TXID);
    }

    #[test]
    fn split_known_types() {
        assert_eq!(split_message_type(0x0101), (MessageClass::Success, Method::Binding));
        assert_eq!(split_message_type(0x0003), (MessageClass::Request, Method::Allocate));
        assert_eq!(split_message_type(0x0103), (MessageClass::Success, Method::Allocate));
        assert_eq!(split_message_type(0x0111), (MessageClass::Error, Method::Binding));
        assert_eq!(split_message_type(0x0009), (MessageClass::Request, Method::Send));
        assert_eq!(split_message_type(0x0016), (MessageClass::Indication, Method::Other(0x006)));
    }

    #[test]
    fn short_or_foreign_datagrams_are_not_this_protocol() {
        assert!(matches!(decode_header(&[0u8; 10]), Err(RelayError::NotThisProtocol)));

        let mut wrong_cookie = MessageBuilder::new(msg_type::BINDING_REQUEST, &TXID).build().to_vec();
        wrong_cookie[4] = 0x00;
        assert!(matches!(decode_header(&wrong_cookie), Err(RelayError::NotThisProtocol)));

        let mut rtp_like = MessageBuilder::new(msg_type::BINDING_REQUEST, &TXID).build().to_vec();
        rtp_like[0] = 0x80;
        assert!(matches!(decode_header(&rtp_like), Err(RelayError::NotThisProtocol)));
    }

    #[test]
    fn binding_success_layout() {
        let mapped: SocketAddr = "192.168.1.100:8080".parse().unwrap();
        let resp = encode_binding_success(&TXID, &mapped);

        assert_eq!(resp.len(), 32);
        assert_eq!(&resp[0..2], &[0x01, 0x01]);
        assert_eq!(&resp[2..4], &[0x00, 0x0C]);
        assert_eq!(&resp[4..8], &[0x21, 0x12, 0xA4, 0x42]);
        assert_eq!(&resp[8..20], &TXID);
        assert_eq!(&resp[20..24], &[0x00, 0x20, 0x00, 0x08]);
        assert_eq!(&resp[24..32], &[0x00, 0x01, 0x3E, 0x82, 0xE1, 0xBA, 0xA5, 0x26]);
        assert_eq!(extract_mapped_address(&resp, &TXID), Some(mapped));
    }

    #[test]
    fn binding_success_is_byte_identical_across_calls() {
        let mapped: SocketAddr = "198.51.100.9:61000".parse().unwrap();
        assert_eq!(encode_binding_success(&TXID, &mapped), encode_binding_success(&TXID, &mapped));
    }

    #[test]
    fn allocate_success_is_bare_header() {
        let resp = encode_allocate_success(&TXID);
        assert_eq!(resp.len(), HEADER_LEN);
        let h = decode_header(&resp).unwrap();
        assert_eq!(h.message_type, msg_type::ALLOCATE_SUCCESS);
        assert_eq!(h.length, 0);
    }

    #[test]
    fn error_response_carries_code() {
        let resp = encode_error(&TXID, ErrorCode::Unauthorized);
        let h = decode_header(&resp).unwrap();
        assert_eq!(h.message_type, msg_type::ERROR_RESPONSE);
        assert_eq!(h.transaction_id, TXID);
        assert_eq!(h.length as usize, resp.len() - HEADER_LEN);
        assert_eq!(resp.len() % 4, 0);
        assert_eq!(extract_error_code(&resp), Some(401));

        let bad = encode_error(&TXID, ErrorCode::BadRequest);
        assert_eq!(extract_error_code(&bad), Some(400));
    }

    #[test]
    fn credentials_are_walked_with_padding() {
        let req = MessageBuilder::new(msg_type::ALLOCATE_REQUEST, &TXID)
            .attribute(attr::USERNAME, b"alice")        // 5 → 패딩 3
            .attribute(0x8022, b"soft")                 // 모르는 속성은 건너뜀
            .attribute(attr::PASSWORD, b"s3cret")
            .build();
        let creds = extract_credentials(&req).unwrap().unwrap();
        assert_eq!(creds, Credentials { username: "alice".into(), secret: "s3cret".into() });
    }

    #[test]
    fn missing_password_is_absent() {
        let req = MessageBuilder::new(msg_type::ALLOCATE_REQUEST, &TXID)
            .attribute(attr::USERNAME, b"alice")
            .build();
        assert_eq!(extract_credentials(&req).unwrap(), None);
    }

    #[test]
    fn truncated_attribute_is_malformed() {
        let mut req = MessageBuilder::new(msg_type::ALLOCATE_REQUEST, &TXID)
            .attribute(attr::USERNAME, b"alice")
            .build()
            .to_vec();
        req.truncate(HEADER_LEN + 6);
        assert!(matches!(extract_credentials(&req), Err(RelayError::MalformedAttribute(_))));
    }

    #[test]
    fn peer_addresses_decoded_in_order() {
        let b: SocketAddr = "10.0.0.2:2000".parse().unwrap();
        let c: SocketAddr = "[2001:db8::2]:3000".parse().unwrap();
        let req = MessageBuilder::new(msg_type::ALLOCATE_REQUEST, &TXID)
            .xor_address(attr::XOR_PEER_ADDRESS, &b)
            .xor_address(attr::XOR_PEER_ADDRESS, &c)
            .build();
        assert_eq!(extract_peer_addresses(&req, &TXID).unwrap(), vec![b, c]);
    }

    #[test]
    fn payload_is_everything_after_header() {
        let req = MessageBuilder::new(msg_type::SEND_REQUEST, &TXID).raw(b"hello").build();
        assert_eq!(payload(&req), b"hello");
        assert_eq!(payload(&[0u8; 4]), b"");
    }
}
