// CredentialStore: allocate 인증용 고정 자격증명 저장소
//
// 프로세스 시작 시 1회 로드, 이후 읽기 전용 (동적 발급/만료 없음)

use std::collections::HashMap;
use tracing::{info, warn};

use crate::config;

#[derive(Debug, Clone)]
pub struct CredentialStore {
    users: HashMap<String, String>,
}

impl CredentialStore {
    pub fn from_pairs<I, U, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (U, S)>,
        U: Into<String>,
        S: Into<String>,
    {
        Self {
            users: pairs.into_iter().map(|(u, s)| (u.into(), s.into())).collect(),
        }
    }

    /// 환경변수 RENDEZVOUS_CREDENTIALS 우선, 없으면 DEFAULT_CREDENTIALS
    pub fn load() -> Self {
        match std::env::var(config::CREDENTIALS_ENV) {
            Ok(raw) => {
                let store = Self::parse(&raw);
                info!("[credential] {} user(s) loaded from {}", store.len(), config::CREDENTIALS_ENV);
                store
            }
            Err(_) => {
                info!("[credential] {} not set, using default single-user store", config::CREDENTIALS_ENV);
                Self::from_pairs(config::DEFAULT_CREDENTIALS.iter().copied())
            }
        }
    }

    /// "user:secret,user2:secret2" 파싱. 형식이 틀린 항목은 건너뜀
    pub fn parse(raw: &str) -> Self {
        let pairs = raw.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .filter_map(|entry| match entry.split_once(':') {
                Some((user, secret)) if !user.is_empty() => Some((user.to_string(), secret.to_string())),
                _ => {
                    warn!("[credential] malformed entry skipped");
                    None
                }
            });
        Self::from_pairs(pairs)
    }

    pub fn verify(&self, username: &str, secret: &str) -> bool {
        self.users.get(username).is_some_and(|s| s == secret)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_known_pair() {
        let store = CredentialStore::from_pairs([("testuser", "testpassword")]);
        assert!(store.verify("testuser", "testpassword"));
        assert!(!store.verify("testuser", "wrong"));
        assert!(!store.verify("nobody", "testpassword"));
    }

    #[test]
    fn parse_multiple_entries() {
        let store = CredentialStore::parse("alice:a1, bob:b2");
        assert_eq!(store.len(), 2);
        assert!(store.verify("alice", "a1"));
        assert!(store.verify("bob", "b2"));
    }

    #[test]
    fn parse_skips_malformed() {
        let store = CredentialStore::parse("alice:a1,broken,:nouser,,");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn secret_may_contain_colon() {
        let store = CredentialStore::parse("alice:a:b");
        assert!(store.verify("alice", "a:b"));
    }
}
