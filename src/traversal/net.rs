// UDP 수신 루프: STUN/TURN 응답기
//
// 패킷 수신 흐름:
//   recv_from(src_addr)
//     → TraversalResponder::handle (순수 처리, 테이블 갱신)
//     → Outgoing 목록 송신 (fire-and-forget, 재전송 없음)
//
// datagram 1개의 실패가 루프를 멈추지 않음. 재전송은 클라이언트 몫.

use async_trait::async_trait;
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::{info, trace, warn};

use crate::config;
use crate::error::RelayResult;

use super::responder::{Outgoing, TraversalResponder};

/// 전송 계층 collaborator: send(bytes, address, port)
#[async_trait]
pub trait DatagramSink: Send + Sync {
    async fn send_datagram(&self, bytes: &[u8], to: SocketAddr) -> std::io::Result<usize>;
}

#[async_trait]
impl DatagramSink for UdpSocket {
    async fn send_datagram(&self, bytes: &[u8], to: SocketAddr) -> std::io::Result<usize> {
        self.send_to(bytes, to).await
    }
}

pub async fn bind_traversal_socket(udp_port: u16) -> RelayResult<UdpSocket> {
    let addr   = format!("0.0.0.0:{}", udp_port);
    let socket = UdpSocket::bind(&addr).await?;
    info!("[traversal] STUN/TURN responder on udp://{}", addr);
    Ok(socket)
}

pub async fn run_traversal_responder(socket: Arc<UdpSocket>, responder: Arc<TraversalResponder>) {
    let mut buf = vec![0u8; config::UDP_RECV_BUF_SIZE];

    loop {
        let (len, src_addr) = match socket.recv_from(&mut buf).await {
            Ok(r)  => r,
            Err(e) => { warn!("[traversal] recv_from: {}", e); continue; }
        };

        trace!("[traversal] {} bytes from {}", len, src_addr);
        let datagram = Bytes::copy_from_slice(&buf[..len]);

        let outgoing = responder.handle(datagram, src_addr);
        dispatch(socket.as_ref(), outgoing).await;
    }
}

/// Outgoing 목록 순서대로 송신. 실패는 로그만 남기고 계속 진행
pub async fn dispatch(sink: &dyn DatagramSink, outgoing: Vec<Outgoing>) -> usize {
    let mut sent = 0;
    for out in outgoing {
        match sink.send_datagram(&out.bytes, out.to).await {
            Ok(_)  => { sent += 1; trace!("[traversal] {} bytes → {}", out.bytes.len(), out.to); }
            Err(e) => warn!("[traversal] send to {} failed: {}", out.to, e),
        }
    }
    sent
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        sent:    Mutex<Vec<(SocketAddr, Vec<u8>)>>,
        fail_to: Option<SocketAddr>,
    }

    #[async_trait]
    impl DatagramSink for RecordingSink {
        async fn send_datagram(&self, bytes: &[u8], to: SocketAddr) -> std::io::Result<usize> {
            if self.fail_to == Some(to) {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "unreachable"));
            }
            self.sent.lock().push((to, bytes.to_vec()));
            Ok(bytes.len())
        }
    }

    fn out(to: &str, bytes: &'static [u8]) -> Outgoing {
        Outgoing { to: to.parse().unwrap(), bytes: Bytes::from_static(bytes) }
    }

    #[tokio::test]
    async fn dispatch_sends_in_order() {
        let sink = RecordingSink::default();
        let n = dispatch(&sink, vec![out("10.0.0.1:1", b"a"), out("10.0.0.2:2", b"b")]).await;
        assert_eq!(n, 2);
        let sent = sink.sent.lock();
        assert_eq!(sent[0], ("10.0.0.1:1".parse().unwrap(), b"a".to_vec()));
        assert_eq!(sent[1], ("10.0.0.2:2".parse().unwrap(), b"b".to_vec()));
    }

    #[tokio::test]
    async fn dispatch_continues_after_failure() {
        let sink = RecordingSink { fail_to: Some("10.0.0.1:1".parse().unwrap()), ..Default::default() };
        let n = dispatch(&sink, vec![out("10.0.0.1:1", b"a"), out("10.0.0.2:2", b"b")]).await;
        assert_eq!(n, 1);
        assert_eq!(sink.sent.lock().len(), 1);
    }
}
