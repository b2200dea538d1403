// rvadmin: mini-rendezvous 운영 관리 CLI
//
// 사용법:
//   rvadmin [--host HOST] [--port PORT] <COMMAND>
//
// 조회 명령
//   rvadmin status                    서버 상태 요약 (uptime, 연결/세션/allocation 수)
//   rvadmin sessions                  세션 전체 테이블
//   rvadmin sessions <room_id>        세션 상세 (참여 순 멤버)
//   rvadmin allocations               relay allocation 전체 테이블
//
// 조작 명령
//   rvadmin release <client>          allocation 강제 해제 ("ip:port")

use clap::{Parser, Subcommand};
use colored::Colorize;
use tabled::{Table, Tabled};

use mini_rendezvous::http::dto::{AllocationInfo, ErrorBody, ServerStatus, SessionInfo};

// ----------------------------------------------------------------------------
// [CLI 정의]
// ----------------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name    = "rvadmin",
    about   = "mini-rendezvous 운영 관리 CLI",
    version,
)]
struct Cli {
    /// 서버 호스트
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// 서버 포트 (WS/HTTP 공용)
    #[arg(long, default_value_t = 8080)]
    port: u16,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 서버 상태 요약
    Status,

    /// 세션 목록 또는 상세
    Sessions {
        /// room_id 지정 시 상세 보기
        room_id: Option<String>,
    },

    /// relay allocation 목록
    Allocations,

    /// allocation 강제 해제
    Release {
        /// 클라이언트 주소 ("ip:port")
        client: String,
    },
}

// ----------------------------------------------------------------------------
// [표시 타입]: Tabled 렌더링용
// ----------------------------------------------------------------------------

#[derive(Tabled)]
struct SessionRow {
    #[tabled(rename = "ROOM ID")]
    room_id: String,
    #[tabled(rename = "MEMBERS")]
    count:   usize,
    #[tabled(rename = "PEERS")]
    members: String,
}

#[derive(Tabled)]
struct AllocationRow {
    #[tabled(rename = "ID")]
    id:            String,
    #[tabled(rename = "CLIENT")]
    client:        String,
    #[tabled(rename = "TARGETS")]
    targets:       String,
    #[tabled(rename = "REG")]
    registrations: u32,
    #[tabled(rename = "IDLE(s)")]
    idle_secs:     String,
}

// ----------------------------------------------------------------------------
// [main]
// ----------------------------------------------------------------------------

fn main() {
    let cli = Cli::parse();
    let base = format!("http://{}:{}", cli.host, cli.port);

    let result = match &cli.command {
        Command::Status                       => cmd_status(&base),
        Command::Sessions { room_id: None }   => cmd_sessions(&base),
        Command::Sessions { room_id: Some(r) } => cmd_session_detail(&base, r),
        Command::Allocations                  => cmd_allocations(&base),
        Command::Release { client }           => cmd_release(&base, client),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "ERROR:".red().bold(), e);
        std::process::exit(1);
    }
}

// ----------------------------------------------------------------------------
// [커맨드 구현]
// ----------------------------------------------------------------------------

fn cmd_status(base: &str) -> Result<(), Box<dyn std::error::Error>> {
    let s: ServerStatus = get_json(&format!("{}/admin/status", base))?;

    let hours   = s.uptime_secs / 3600;
    let minutes = (s.uptime_secs % 3600) / 60;
    let secs    = s.uptime_secs % 60;

    println!();
    println!("{}", "  mini-rendezvous Server Status".bold().cyan());
    println!("  {}", "─".repeat(36).dimmed());
    println!("  {:16} {}",
        "Uptime:".bold(),
        format!("{}h {}m {}s", hours, minutes, secs).green()
    );
    println!("  {:16} {}", "Peers:".bold(),       s.peer_count.to_string().yellow());
    println!("  {:16} {}", "Sessions:".bold(),    s.session_count.to_string().yellow());
    println!("  {:16} {}", "Allocations:".bold(), s.allocation_count.to_string().yellow());
    println!();
    Ok(())
}

fn cmd_sessions(base: &str) -> Result<(), Box<dyn std::error::Error>> {
    let sessions: Vec<SessionInfo> = get_json(&format!("{}/admin/sessions", base))?;

    if sessions.is_empty() {
        println!("{}", "  활성 세션 없음".dimmed());
        return Ok(());
    }

    let rows: Vec<SessionRow> = sessions.iter().map(|s| SessionRow {
        room_id: s.room_id.clone(),
        count:   s.members.len(),
        members: s.members.join(", "),
    }).collect();

    println!();
    println!("{}", Table::new(&rows));
    println!("  {} session(s)", rows.len());
    println!();
    Ok(())
}

fn cmd_session_detail(base: &str, room_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let s: SessionInfo = get_json(&format!("{}/admin/sessions/{}", base, room_id))?;

    println!();
    println!("{}", format!("  Session: {}", s.room_id).bold().cyan());
    println!("  {}", "─".repeat(36).dimmed());
    println!("  {:16} {}", "Members:".bold(), s.members.len());
    println!();
    for (i, m) in s.members.iter().enumerate() {
        println!("    {}. {}", i + 1, m.yellow());
    }
    println!();
    Ok(())
}

fn cmd_allocations(base: &str) -> Result<(), Box<dyn std::error::Error>> {
    let allocations: Vec<AllocationInfo> = get_json(&format!("{}/admin/allocations", base))?;

    if allocations.is_empty() {
        println!("{}", "  allocation 없음".dimmed());
        return Ok(());
    }

    // 1분 이상 유휴 allocation 강조
    let rows: Vec<AllocationRow> = allocations.iter().map(|a| AllocationRow {
        id:            format!("alloc-{}", a.id),
        client:        a.client.clone(),
        targets:       if a.targets.is_empty() { "-".to_string() } else { a.targets.join(", ") },
        registrations: a.registrations,
        idle_secs:     if a.idle_secs > 60 {
            a.idle_secs.to_string().red().to_string()
        } else {
            a.idle_secs.to_string()
        },
    }).collect();

    println!();
    println!("{}", Table::new(&rows));
    println!("  {} allocation(s)", rows.len());
    println!();
    Ok(())
}

fn cmd_release(base: &str, client_addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::blocking::Client::new();
    let url    = format!("{}/admin/allocations/{}", base, client_addr);
    let resp   = client.delete(&url).send()?;

    let status = resp.status();
    if !status.is_success() {
        return Err(error_message(status, resp).into());
    }

    println!();
    println!("  {} client={}", "Release OK".green().bold(), client_addr.yellow());
    println!();
    Ok(())
}

// ----------------------------------------------------------------------------
// [공통 유틸]
// ----------------------------------------------------------------------------

/// GET 요청 + JSON 역직렬화
fn get_json<T: for<'de> serde::Deserialize<'de>>(url: &str) -> Result<T, Box<dyn std::error::Error>> {
    let resp = reqwest::blocking::get(url)?;
    let status = resp.status();
    if !status.is_success() {
        return Err(error_message(status, resp).into());
    }
    Ok(resp.json()?)
}

/// 에러 응답 본문 → "[status] message"
fn error_message(status: reqwest::StatusCode, resp: reqwest::blocking::Response) -> String {
    match resp.json::<ErrorBody>() {
        Ok(body) => format!("[{}] {} (code {})", status, body.error, body.code),
        Err(_)   => format!("[{}] unknown error", status),
    }
}
