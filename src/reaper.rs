// allocation 만료 태스크
//
// --allocation-lifetime-secs > 0 일 때만 spawn 됩니다.
// 주기마다 lifetime 동안 allocate/send가 없던 allocation을 제거.

use std::sync::Arc;
use tracing::info;

use crate::config;
use crate::core::AllocationTable;
use crate::utils::current_timestamp;

pub async fn run_allocation_reaper(allocations: Arc<AllocationTable>, lifetime_secs: u64) {
    let lifetime_ms = lifetime_secs.saturating_mul(1000);
    let interval    = tokio::time::Duration::from_millis(config::REAPER_INTERVAL_MS);
    let mut timer   = tokio::time::interval(interval);
    timer.tick().await; // 첫 틱 skip (startup 시 즉시 실행 방지)

    info!("[reaper] Started (interval={}ms, lifetime={}s)", config::REAPER_INTERVAL_MS, lifetime_secs);

    loop {
        timer.tick().await;

        let expired = allocations.expire_idle(lifetime_ms, current_timestamp());
        for client in &expired {
            info!("[reaper] allocation for {} expired", client);
        }
        if !expired.is_empty() {
            info!("[reaper] Cleaned {} allocation(s), {} remaining", expired.len(), allocations.count());
        }
    }
}
