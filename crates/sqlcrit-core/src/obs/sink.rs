//! Metrics sink boundary.
//!
//! Criteria and converter logic MUST NOT depend on `obs::metrics`
//! directly. All instrumentation flows through `MetricsEvent` and
//! `MetricsSink`; this module is the only bridge to the global state.

use crate::obs::metrics;
use std::{cell::RefCell, sync::Arc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Arc<dyn MetricsSink>>> = const { RefCell::new(None) };
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug)]
pub enum MetricsEvent<'a> {
    CriteriaCreated {
        entity: &'a str,
    },
    ExpressionSkipped {
        reason: &'static str,
        structural: bool,
    },
    CompileFinished {
        entity: &'a str,
        predicates: u64,
        parameters: u64,
        subqueries: u64,
    },
    CompileFailed {
        entity: &'a str,
        error: &'static str,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink: Send + Sync {
    fn record(&self, event: MetricsEvent<'_>);
}

/// GlobalMetricsSink
/// Default sink that writes into the thread-local counter state.
/// Used whenever no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent<'_>) {
        match event {
            MetricsEvent::CriteriaCreated { entity } => {
                metrics::with_state_mut(|m| {
                    m.ops.criteria_created = m.ops.criteria_created.saturating_add(1);
                    let entry = m.entities.entry(entity.to_string()).or_default();
                    entry.criteria_created = entry.criteria_created.saturating_add(1);
                });
            }

            MetricsEvent::ExpressionSkipped { reason, structural } => {
                metrics::with_state_mut(|m| {
                    m.ops.expressions_skipped = m.ops.expressions_skipped.saturating_add(1);
                    if structural {
                        m.ops.structural_skips = m.ops.structural_skips.saturating_add(1);
                    }
                    let count = m.skips.entry(reason.to_string()).or_default();
                    *count = count.saturating_add(1);
                });
            }

            MetricsEvent::CompileFinished {
                entity,
                predicates,
                parameters,
                subqueries,
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.compiles = m.ops.compiles.saturating_add(1);
                    m.ops.predicates_rendered = m.ops.predicates_rendered.saturating_add(predicates);
                    m.ops.parameters_bound = m.ops.parameters_bound.saturating_add(parameters);
                    m.ops.subqueries_rendered = m.ops.subqueries_rendered.saturating_add(subqueries);

                    let entry = m.entities.entry(entity.to_string()).or_default();
                    entry.compiles = entry.compiles.saturating_add(1);
                    entry.parameters_bound = entry.parameters_bound.saturating_add(parameters);
                });
            }

            MetricsEvent::CompileFailed { entity, .. } => {
                metrics::with_state_mut(|m| {
                    m.ops.compile_failures = m.ops.compile_failures.saturating_add(1);
                    let entry = m.entities.entry(entity.to_string()).or_default();
                    entry.compile_failures = entry.compile_failures.saturating_add(1);
                });
            }
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent<'_>) {
    // clone out of the cell so a sink may itself install overrides
    let sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());

    match sink {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the current thread's metrics.
///
/// `window_start_ms` filters by window start
/// (`EventState::window_start_ms`), not by per-event timestamps.
#[must_use]
pub fn metrics_report(window_start_ms: Option<u64>) -> metrics::EventReport {
    metrics::report_window_start(window_start_ms)
}

/// Reset all metrics state.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override on this thread.
/// The previous sink is restored on every exit, including unwind.
pub fn with_metrics_sink<T>(sink: Arc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Arc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = prev;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSink {
        calls: AtomicUsize,
    }

    impl CountingSink {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl MetricsSink for CountingSink {
        fn record(&self, _: MetricsEvent<'_>) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn created() -> MetricsEvent<'static> {
        MetricsEvent::CriteriaCreated { entity: "Order" }
    }

    #[test]
    fn with_metrics_sink_routes_and_restores_nested_overrides() {
        SINK_OVERRIDE.with(|cell| {
            *cell.borrow_mut() = None;
        });

        let outer = Arc::new(CountingSink::default());
        let inner = Arc::new(CountingSink::default());

        // No override installed yet.
        record(created());
        assert_eq!(outer.calls(), 0);

        with_metrics_sink(outer.clone(), || {
            record(created());
            assert_eq!(outer.calls(), 1);
            assert_eq!(inner.calls(), 0);

            with_metrics_sink(inner.clone(), || {
                record(created());
            });

            // Inner override was restored to outer override.
            record(created());
        });

        assert_eq!(outer.calls(), 2);
        assert_eq!(inner.calls(), 1);
        SINK_OVERRIDE.with(|cell| {
            assert!(cell.borrow().is_none());
        });
    }

    #[test]
    fn with_metrics_sink_restores_override_on_panic() {
        SINK_OVERRIDE.with(|cell| {
            *cell.borrow_mut() = None;
        });

        let sink = Arc::new(CountingSink::default());
        let panicked = catch_unwind(AssertUnwindSafe(|| {
            with_metrics_sink(sink.clone(), || {
                record(created());
                panic!("intentional panic for guard test");
            });
        }))
        .is_err();

        assert!(panicked);
        assert_eq!(sink.calls(), 1);
        SINK_OVERRIDE.with(|cell| {
            assert!(cell.borrow().is_none());
        });
    }

    #[test]
    fn global_sink_accumulates_skips_by_reason() {
        metrics_reset_all();

        record(MetricsEvent::ExpressionSkipped {
            reason: "null_value",
            structural: false,
        });
        record(MetricsEvent::ExpressionSkipped {
            reason: "empty_collection",
            structural: true,
        });
        record(MetricsEvent::ExpressionSkipped {
            reason: "null_value",
            structural: false,
        });

        let counters = metrics_report(None).counters.expect("counters");
        assert_eq!(counters.ops.expressions_skipped, 3);
        assert_eq!(counters.ops.structural_skips, 1);
        assert_eq!(counters.skips.get("null_value"), Some(&2));
    }

    #[test]
    fn compile_events_accumulate_per_entity() {
        metrics_reset_all();

        record(MetricsEvent::CompileFinished {
            entity: "Order",
            predicates: 2,
            parameters: 4,
            subqueries: 1,
        });
        record(MetricsEvent::CompileFailed {
            entity: "Order",
            error: "empty_in_list",
        });

        let counters = metrics_report(None).counters.expect("counters");
        assert_eq!(counters.ops.compiles, 1);
        assert_eq!(counters.ops.compile_failures, 1);
        assert_eq!(counters.ops.parameters_bound, 4);

        let entity = counters.entities.get("Order").expect("entity counters");
        assert_eq!(entity.compiles, 1);
        assert_eq!(entity.compile_failures, 1);
    }

    #[test]
    fn metrics_report_window_start_after_window_returns_empty() {
        metrics_reset_all();
        let window_start = metrics::with_state(|m| m.window_start_ms);
        record(created());

        let report = metrics_report(Some(window_start.saturating_add(1)));
        assert!(report.counters.is_none());
        assert!(report.entity_counters.is_empty());
    }
}
