//! 记录 key 生成

use crate::config::KeyPolicy;
use std::sync::atomic::{AtomicU64, Ordering};

/// 记录 key 生成器
///
/// `Timestamp` 策略在同一毫秒内的多次调用会依次 +1，
/// 保证进程内不重复且单调递增。
#[derive(Debug)]
pub struct KeyGenerator {
    policy: KeyPolicy,
    last_millis: AtomicU64,
}

impl KeyGenerator {
    pub fn new(policy: KeyPolicy) -> Self {
        Self {
            policy,
            last_millis: AtomicU64::new(0),
        }
    }

    pub fn policy(&self) -> KeyPolicy {
        self.policy
    }

    pub fn next_key(&self) -> String {
        match self.policy {
            KeyPolicy::Timestamp => self.next_millis(now_millis()).to_string(),
            KeyPolicy::Uuid => uuid::Uuid::new_v4().to_string(),
        }
    }

    fn next_millis(&self, now: u64) -> u64 {
        let mut last = self.last_millis.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last + 1);
            match self.last_millis.compare_exchange_weak(
                last,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }
}

fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
