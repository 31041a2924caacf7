use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    searches_total: AtomicU64,
    search_hits_total: AtomicU64,
    chat_replies_total: AtomicU64,
    default_replies_total: AtomicU64,
    plans_total: AtomicU64,
    empty_plans_total: AtomicU64,
    selection_toggles_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub searches_total: u64,
    pub search_hits_total: u64,
    pub chat_replies_total: u64,
    pub default_replies_total: u64,
    pub plans_total: u64,
    pub empty_plans_total: u64,
    pub selection_toggles_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("trails_requests_total").increment(1);
    }

    pub fn observe_search(&self, hits: usize) {
        self.searches_total.fetch_add(1, Ordering::Relaxed);
        self.search_hits_total
            .fetch_add(hits as u64, Ordering::Relaxed);
        metrics::counter!("trails_searches_total").increment(1);
        metrics::counter!("trails_search_hits_total").increment(hits as u64);
    }

    /// `fallback` marks replies produced by a matcher's default rule.
    pub fn observe_chat_reply(&self, fallback: bool) {
        self.chat_replies_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("trails_chat_replies_total").increment(1);
        if fallback {
            self.default_replies_total.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("trails_default_replies_total").increment(1);
        }
    }

    pub fn observe_plan(&self, items: usize) {
        self.plans_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("trails_plans_total").increment(1);
        if items == 0 {
            self.empty_plans_total.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("trails_empty_plans_total").increment(1);
        }
    }

    pub fn inc_selection_toggle(&self) {
        self.selection_toggles_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("trails_selection_toggles_total").increment(1);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: requests,
            searches_total: self.searches_total.load(Ordering::Relaxed),
            search_hits_total: self.search_hits_total.load(Ordering::Relaxed),
            chat_replies_total: self.chat_replies_total.load(Ordering::Relaxed),
            default_replies_total: self.default_replies_total.load(Ordering::Relaxed),
            plans_total: self.plans_total.load(Ordering::Relaxed),
            empty_plans_total: self.empty_plans_total.load(Ordering::Relaxed),
            selection_toggles_total: self.selection_toggles_total.load(Ordering::Relaxed),
            avg_latency_millis: if requests == 0 {
                0.0
            } else {
                latency as f64 / requests as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,trails_api=info,trails_agents=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .init();

        tracing::debug!(service = service_name, "tracing initialized");
    });
}
