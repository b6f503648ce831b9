//! Observability: in-process counters and the sink boundary.
//!
//! Criteria and converter code never touch `metrics` directly; every
//! event flows through `sink::record`. Text diagnostics go to `tracing`
//! and are only visible when the embedding application installs a
//! subscriber.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EntitySummary, EventReport, EventState};
pub use sink::{MetricsEvent, MetricsSink, metrics_report, metrics_reset_all, with_metrics_sink};
