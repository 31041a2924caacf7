use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Sliding-window request counter keyed by client address.
#[derive(Debug, Clone)]
pub struct IpRateLimiter {
    hits: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
    window: Duration,
    max_requests: usize,
}

impl IpRateLimiter {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            hits: Arc::new(Mutex::new(HashMap::new())),
            window,
            max_requests,
        }
    }

    pub fn allow(&self, ip: &str) -> bool {
        self.allow_at(ip, Instant::now())
    }

    fn allow_at(&self, ip: &str, now: Instant) -> bool {
        let mut hits = self.hits.lock();
        let recent = hits.entry(ip.to_string()).or_default();

        while recent
            .front()
            .is_some_and(|seen| now.duration_since(*seen) > self.window)
        {
            recent.pop_front();
        }

        if recent.len() >= self.max_requests {
            return false;
        }
        recent.push_back(now);
        true
    }

    /// Drops addresses with no request inside the window.
    pub fn forget_idle(&self) -> usize {
        let now = Instant::now();
        let mut hits = self.hits.lock();
        let before = hits.len();
        hits.retain(|_, recent| {
            recent
                .back()
                .is_some_and(|last| now.duration_since(*last) <= self.window)
        });
        before - hits.len()
    }
}
