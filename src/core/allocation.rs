// AllocationTable: relay allocation 라우팅 테이블
//
// key: allocate를 요청한 클라이언트의 관측 주소 (NAT 바깥 addr:port)
// value: 해당 key와 payload를 주고받을 수 있는 endpoint 목록
// 순수 자료구조. 소켓 I/O 없음.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

use crate::utils::current_timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AllocationId(pub u64);

impl std::fmt::Display for AllocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "alloc-{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Allocation {
    pub id:            AllocationId,
    pub client:        SocketAddr,
    /// 등록된 endpoint (클라이언트 자신 포함, 등록 순, 중복 없음)
    pub endpoints:     Vec<SocketAddr>,
    /// 같은 key로 allocate 성공한 횟수
    pub registrations: u32,
    pub created_at:    u64,
    /// 마지막 allocate / send 시각: 만료 판단 기준
    pub refreshed_at:  u64,
}

pub struct AllocationTable {
    next_id:     AtomicU64,
    allocations: Mutex<HashMap<SocketAddr, Allocation>>,
}

impl AllocationTable {
    pub fn new() -> Self {
        trace!("Initializing AllocationTable");
        Self {
            next_id:     AtomicU64::new(1),
            allocations: Mutex::new(HashMap::new()),
        }
    }

    /// client key로 allocation 등록. 이미 있으면 교체하지 않고 registration만 추가.
    /// peers: 함께 등록할 relay 대상 endpoint (allocate 요청의 peer-address 속성)
    pub fn register_allocation(&self, client: SocketAddr, peers: &[SocketAddr]) -> AllocationId {
        let now = current_timestamp();
        let mut allocations = self.allocations.lock();

        let alloc = allocations.entry(client).or_insert_with(|| {
            let id = AllocationId(self.next_id.fetch_add(1, Ordering::Relaxed));
            trace!("Allocation {} created for {}", id, client);
            Allocation {
                id,
                client,
                endpoints:     Vec::new(),
                registrations: 0,
                created_at:    now,
                refreshed_at:  now,
            }
        });

        alloc.registrations += 1;
        alloc.refreshed_at = now;
        for ep in std::iter::once(&client).chain(peers) {
            if !alloc.endpoints.contains(ep) {
                alloc.endpoints.push(*ep);
            }
        }

        trace!("Allocation {} registered for {} (registrations={} endpoints={})",
            alloc.id, client, alloc.registrations, alloc.endpoints.len());
        alloc.id
    }

    /// sender key에 등록된 endpoint 중 sender 자신을 제외한 relay 대상.
    /// allocation이 없으면 빈 목록.
    pub fn relay_targets(&self, sender: SocketAddr) -> Vec<SocketAddr> {
        let mut allocations = self.allocations.lock();
        match allocations.get_mut(&sender) {
            Some(alloc) => {
                alloc.refreshed_at = current_timestamp();
                alloc.endpoints.iter().filter(|ep| **ep != sender).copied().collect()
            }
            None => Vec::new(),
        }
    }

    /// 명시적 해제
    pub fn release(&self, client: SocketAddr) -> bool {
        let removed = self.allocations.lock().remove(&client).is_some();
        if removed {
            trace!("Allocation for {} released", client);
        }
        removed
    }

    /// now 기준 max_idle_ms 동안 갱신되지 않은 allocation 제거, 제거된 key 반환
    pub fn expire_idle(&self, max_idle_ms: u64, now: u64) -> Vec<SocketAddr> {
        let mut allocations = self.allocations.lock();
        let expired: Vec<SocketAddr> = allocations.values()
            .filter(|a| now.saturating_sub(a.refreshed_at) >= max_idle_ms)
            .map(|a| a.client)
            .collect();
        for client in &expired {
            allocations.remove(client);
        }
        expired
    }

    pub fn get(&self, client: SocketAddr) -> Option<Allocation> {
        self.allocations.lock().get(&client).cloned()
    }

    /// 현재 allocation 수
    pub fn count(&self) -> usize {
        self.allocations.lock().len()
    }

    /// 전체 스냅샷 (admin 조회용), id 순
    pub fn snapshot(&self) -> Vec<Allocation> {
        let mut list: Vec<Allocation> = self.allocations.lock().values().cloned().collect();
        list.sort_by_key(|a| a.id.0);
        list
    }
}

impl Default for AllocationTable {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> SocketAddr {
        s.parse().unwrap()
    }

    #[test]
    fn register_is_idempotent_by_key() {
        let table = AllocationTable::new();
        let a = addr("203.0.113.5:40000");
        let id1 = table.register_allocation(a, &[]);
        let id2 = table.register_allocation(a, &[]);
        assert_eq!(id1, id2);
        assert_eq!(table.count(), 1);
        let alloc = table.get(a).unwrap();
        assert_eq!(alloc.registrations, 2);
        assert_eq!(alloc.endpoints, vec![a]);
    }

    #[test]
    fn different_clients_get_different_ids() {
        let table = AllocationTable::new();
        let id1 = table.register_allocation(addr("10.0.0.1:1000"), &[]);
        let id2 = table.register_allocation(addr("10.0.0.2:1000"), &[]);
        assert_ne!(id1, id2);
    }

    #[test]
    fn relay_targets_exclude_sender() {
        let table = AllocationTable::new();
        let a = addr("10.0.0.1:1000");
        let b = addr("10.0.0.2:2000");
        table.register_allocation(a, &[b]);
        assert_eq!(table.relay_targets(a), vec![b]);
    }

    #[test]
    fn peers_accumulate_without_duplicates() {
        let table = AllocationTable::new();
        let a = addr("10.0.0.1:1000");
        let b = addr("10.0.0.2:2000");
        let c = addr("10.0.0.3:3000");
        table.register_allocation(a, &[b]);
        table.register_allocation(a, &[b, c]);
        assert_eq!(table.relay_targets(a), vec![b, c]);
    }

    #[test]
    fn relay_targets_unknown_sender_empty() {
        let table = AllocationTable::new();
        assert!(table.relay_targets(addr("10.0.0.9:9")).is_empty());
    }

    #[test]
    fn self_only_allocation_has_no_targets() {
        let table = AllocationTable::new();
        let a = addr("10.0.0.1:1000");
        table.register_allocation(a, &[]);
        assert!(table.relay_targets(a).is_empty());
    }

    #[test]
    fn release_removes_allocation() {
        let table = AllocationTable::new();
        let a = addr("10.0.0.1:1000");
        table.register_allocation(a, &[]);
        assert!(table.release(a));
        assert!(!table.release(a));
        assert_eq!(table.count(), 0);
    }

    #[test]
    fn expire_idle_removes_only_stale() {
        let table = AllocationTable::new();
        let a = addr("10.0.0.1:1000");
        table.register_allocation(a, &[]);
        let now = current_timestamp();
        assert!(table.expire_idle(60_000, now).is_empty());
        assert_eq!(table.expire_idle(60_000, now + 60_000), vec![a]);
        assert_eq!(table.count(), 0);
    }
}
