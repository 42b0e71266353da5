//! Prometheus metrics and tracing spans.

#[cfg(feature = "metrics")]
mod prom {
    use once_cell::sync::Lazy;
    use prometheus::{
        register_histogram, register_int_counter, register_int_counter_vec, Encoder, Histogram,
        IntCounter, IntCounterVec, TextEncoder,
    };
    use std::time::Duration;

    pub static METRICS: Lazy<LedgerMetrics> = Lazy::new(LedgerMetrics::init);

    pub struct LedgerMetrics {
        pub requests_total: IntCounterVec,
        pub query_duration: Histogram,
        pub query_errors: IntCounter,
        pub pool_wait: Histogram,
        pub boxes_created: IntCounter,
        pub usage_recorded: IntCounter,
        pub label_failures: IntCounter,
    }

    impl LedgerMetrics {
        fn init() -> Self {
            Self {
                requests_total: register_int_counter_vec!(
                    "cabletrack_requests_total",
                    "HTTP requests by route and status",
                    &["route", "status"]
                )
                .expect("failed to register cabletrack_requests_total"),
                query_duration: register_histogram!(
                    "cabletrack_query_duration_seconds",
                    "Duration of database queries"
                )
                .expect("failed to register cabletrack_query_duration_seconds"),
                query_errors: register_int_counter!(
                    "cabletrack_query_errors_total",
                    "Database queries that returned an error"
                )
                .expect("failed to register cabletrack_query_errors_total"),
                pool_wait: register_histogram!(
                    "cabletrack_pool_wait_seconds",
                    "Time spent waiting for a pooled connection"
                )
                .expect("failed to register cabletrack_pool_wait_seconds"),
                boxes_created: register_int_counter!(
                    "cabletrack_boxes_created_total",
                    "Boxes created"
                )
                .expect("failed to register cabletrack_boxes_created_total"),
                usage_recorded: register_int_counter!(
                    "cabletrack_usage_recorded_total",
                    "Usage records appended by box close"
                )
                .expect("failed to register cabletrack_usage_recorded_total"),
                label_failures: register_int_counter!(
                    "cabletrack_label_failures_total",
                    "Label issuance failures after box creation"
                )
                .expect("failed to register cabletrack_label_failures_total"),
            }
        }

        pub fn record_request(&self, route: &str, status: u16) {
            let status = status.to_string();
            self.requests_total
                .with_label_values(&[route, status.as_str()])
                .inc();
        }

        pub fn record_query_duration(&self, elapsed: Duration) {
            self.query_duration.observe(elapsed.as_secs_f64());
        }

        pub fn record_query_error(&self) {
            self.query_errors.inc();
        }

        pub fn record_pool_wait(&self, waited: Duration) {
            self.pool_wait.observe(waited.as_secs_f64());
        }

        pub fn record_box_created(&self) {
            self.boxes_created.inc();
        }

        pub fn record_usage(&self) {
            self.usage_recorded.inc();
        }

        pub fn record_label_failure(&self) {
            self.label_failures.inc();
        }
    }

    /// Text exposition of every registered metric
    pub fn render() -> Vec<u8> {
        Lazy::force(&METRICS);
        let mut buffer = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&prometheus::gather(), &mut buffer) {
            log::error!("failed to encode metrics: {e}");
        }
        buffer
    }
}

#[cfg(feature = "metrics")]
pub use prom::{render, LedgerMetrics, METRICS};

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::{info_span, Span};

    pub fn execute_query_span(query: &str) -> Span {
        info_span!("db.query", db.statement = %query)
    }

    pub fn connect_span() -> Span {
        info_span!("db.connect")
    }

    pub fn acquire_connection_span() -> Span {
        info_span!("pool.acquire")
    }

    pub fn begin_transaction_span() -> Span {
        info_span!("db.transaction.begin")
    }

    pub fn commit_transaction_span() -> Span {
        info_span!("db.transaction.commit")
    }

    pub fn rollback_transaction_span() -> Span {
        info_span!("db.transaction.rollback")
    }

    /// Span around a ledger operation such as `box.close`
    pub fn ledger_span(operation: &'static str) -> Span {
        info_span!("ledger", op = operation)
    }
}
