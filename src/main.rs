use clap::Parser;
use tracing_subscriber::EnvFilter;

use mini_rendezvous::{config, run_server, ServerArgs};

#[derive(Parser)]
#[command(
    name    = "rvserver",
    about   = "mini-rendezvous 시그널링 + STUN/TURN 서버",
    version,
)]
struct Cli {
    /// 시그널링(WS) + Admin HTTP 포트
    #[arg(long, default_value_t = config::SIGNALING_PORT)]
    port: u16,

    /// STUN/TURN UDP 포트
    #[arg(long, default_value_t = config::TRAVERSAL_UDP_PORT)]
    udp_port: u16,

    /// 유휴 allocation 만료 시간 (초). 0이면 만료 없음
    #[arg(long, default_value_t = config::DEFAULT_ALLOCATION_LIFETIME_SECS)]
    allocation_lifetime_secs: u64,
}

#[tokio::main]
async fn main() {
    // 환경 변수 기반 로깅 초기화 (기본값: info)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let args = ServerArgs {
        port:                     cli.port,
        udp_port:                 cli.udp_port,
        allocation_lifetime_secs: cli.allocation_lifetime_secs,
    };

    if let Err(e) = run_server(args).await {
        tracing::error!("[mini-rendezvous] server stopped: {}", e);
        std::process::exit(1);
    }
}
