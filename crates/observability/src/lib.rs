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
    itineraries_created_total: AtomicU64,
    budget_rejections_total: AtomicU64,
    reallocations_total: AtomicU64,
    modifications_total: AtomicU64,
    total_latency_millis: AtomicU64,
    latency_observations: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub itineraries_created_total: u64,
    pub budget_rejections_total: u64,
    pub reallocations_total: u64,
    pub modifications_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("wayfare_requests_total").increment(1);
    }

    pub fn inc_itinerary_created(&self) {
        self.itineraries_created_total
            .fetch_add(1, Ordering::Relaxed);
        metrics::counter!("wayfare_itineraries_created_total").increment(1);
    }

    pub fn inc_budget_rejection(&self) {
        self.budget_rejections_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("wayfare_budget_rejections_total").increment(1);
    }

    pub fn inc_reallocation(&self) {
        self.reallocations_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("wayfare_reallocations_total").increment(1);
    }

    pub fn inc_modification(&self) {
        self.modifications_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("wayfare_modifications_total").increment(1);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
        self.latency_observations.fetch_add(1, Ordering::Relaxed);
        metrics::histogram!("wayfare_request_latency_seconds").record(duration.as_secs_f64());
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);
        // not every request is timed, so average over the timed ones
        let observations = self.latency_observations.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: requests,
            itineraries_created_total: self.itineraries_created_total.load(Ordering::Relaxed),
            budget_rejections_total: self.budget_rejections_total.load(Ordering::Relaxed),
            reallocations_total: self.reallocations_total.load(Ordering::Relaxed),
            modifications_total: self.modifications_total.load(Ordering::Relaxed),
            avg_latency_millis: if observations == 0 {
                0.0
            } else {
                latency as f64 / observations as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,wayfare_api=info,wayfare_agents=info,wayfare_core=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}
