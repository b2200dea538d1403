// STUN/TURN 응답기 (UDP)
//   address   : XOR-MAPPED-ADDRESS body 코덱
//   codec     : 헤더 / 속성 파싱 및 응답 인코딩
//   responder : datagram → 응답/전달 결정
//   net       : UDP 소켓 루프

pub mod address;
pub mod codec;
pub mod net;
pub mod responder;

pub use net::{bind_traversal_socket, run_traversal_responder, DatagramSink};
pub use responder::{Outgoing, TraversalResponder};
