//! XOR-MAPPED-ADDRESS 속성 body 인코딩/디코딩.
//!
//! ```text
//!  0                   1                   2                   3
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |   reserved    |    family     |      port ^ (cookie >> 16)    |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |          address ^ cookie (IPv4) / cookie‖txid (IPv6)         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! 상태 없는 순수 함수. 같은 입력이면 항상 같은 출력.

use bytes::BufMut;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::error::{RelayError, RelayResult};

pub const MAGIC_COOKIE: u32 = 0x2112A442;

pub type TransactionId = [u8; 12];

const FAMILY_IPV4: u8 = 0x01;
const FAMILY_IPV6: u8 = 0x02;

pub const IPV4_BODY_LEN: usize = 8;
pub const IPV6_BODY_LEN: usize = 20;

/// 주소 family에 따른 body 길이
pub fn encoded_len(addr: &SocketAddr) -> usize {
    match addr {
        SocketAddr::V4(_) => IPV4_BODY_LEN,
        SocketAddr::V6(_) => IPV6_BODY_LEN,
    }
}

/// 속성 body를 buf에 기록 (type/length TLV 헤더는 호출자 몫)
pub fn encode(addr: &SocketAddr, transaction_id: &TransactionId, buf: &mut impl BufMut) {
    let xor_port = addr.port() ^ (MAGIC_COOKIE >> 16) as u16;
    buf.put_u8(0x00);

    match addr.ip() {
        IpAddr::V4(ip) => {
            buf.put_u8(FAMILY_IPV4);
            buf.put_u16(xor_port);
            buf.put_u32(u32::from(ip) ^ MAGIC_COOKIE);
        }
        IpAddr::V6(ip) => {
            buf.put_u8(FAMILY_IPV6);
            buf.put_u16(xor_port);
            let mask = xor_mask(transaction_id);
            let octets = ip.octets();
            for i in 0..16 {
                buf.put_u8(octets[i] ^ mask[i]);
            }
        }
    }
}

/// body → SocketAddr. family에 비해 짧거나 family를 모르면 MalformedAttribute
pub fn decode(body: &[u8], transaction_id: &TransactionId) -> RelayResult<SocketAddr> {
    if body.len() < 4 {
        return Err(RelayError::MalformedAttribute(format!("address body too short: {} bytes", body.len())));
    }

    let port = u16::from_be_bytes([body[2], body[3]]) ^ (MAGIC_COOKIE >> 16) as u16;

    match body[1] {
        FAMILY_IPV4 => {
            if body.len() < IPV4_BODY_LEN {
                return Err(RelayError::MalformedAttribute(format!("IPv4 address body too short: {} bytes", body.len())));
            }
            let xored = u32::from_be_bytes([body[4], body[5], body[6], body[7]]);
            Ok(SocketAddr::new(IpAddr::V4(Ipv4Addr::from(xored ^ MAGIC_COOKIE)), port))
        }
        FAMILY_IPV6 => {
            if body.len() < IPV6_BODY_LEN {
                return Err(RelayError::MalformedAttribute(format!("IPv6 address body too short: {} bytes", body.len())));
            }
            let mask = xor_mask(transaction_id);
            let mut octets = [0u8; 16];
            for i in 0..16 {
                octets[i] = body[4 + i] ^ mask[i];
            }
            Ok(SocketAddr::new(IpAddr::V6(Ipv6Addr::from(octets)), port))
        }
        family => Err(RelayError::MalformedAttribute(format!("unknown address family 0x{:02x}", family))),
    }
}

/// IPv6용 16바이트 mask: cookie(4) ‖ transaction id(12)
fn xor_mask(transaction_id: &TransactionId) -> [u8; 16] {
    let mut mask = [0u8; 16];
    mask[..4].copy_from_slice(&MAGIC_COOKIE.to_be_bytes());
    mask[4..].copy_from_slice(transaction_id);
    mask
}
