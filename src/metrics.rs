use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Initialize the Prometheus recorder and register the tracker series.
    pub fn init() -> Self {
        // Use default buckets to avoid API differences across crate versions.
        let builder = PrometheusBuilder::new();

        let handle = builder
            .install_recorder()
            .expect("prometheus: install recorder");

        describe_tracker_metrics();

        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// One-time metrics registration (so series show up on /metrics).
pub fn describe_tracker_metrics() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "tracker_submissions_total",
            "Records entering the scoring pipeline."
        );
        describe_counter!(
            "tracker_saved_total",
            "Records accepted and stored after analysis."
        );
        describe_counter!(
            "tracker_rejected_total",
            "Records scored below the save threshold."
        );
        describe_counter!(
            "tracker_duplicates_total",
            "Records skipped by url/title+domain dedup."
        );
        describe_counter!(
            "tracker_process_errors_total",
            "Pipeline failures (storage and friends)."
        );
        describe_counter!(
            "scorer_fallback_total",
            "Generative scorer failures absorbed by the rule scorer."
        );
        describe_counter!("sync_forward_total", "Sync forward attempts by outcome.");
        describe_gauge!("tracker_queue_depth", "Records waiting in the ingest queue.");
    });
}
