use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};
use time::OffsetDateTime;

///
/// EventState
/// Ephemeral, in-memory counters for criteria construction and
/// compilation on the current thread.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    /// Skipped expressions keyed by skip reason label.
    pub skips: BTreeMap<String, u64>,
    pub entities: BTreeMap<String, EntityCounters>,
    pub window_start_ms: u64,
}

impl Default for EventState {
    fn default() -> Self {
        Self {
            ops: EventOps::default(),
            skips: BTreeMap::new(),
            entities: BTreeMap::new(),
            window_start_ms: now_millis(),
        }
    }
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    // Construction
    pub criteria_created: u64,
    pub expressions_skipped: u64,
    pub structural_skips: u64,

    // Compilation
    pub compiles: u64,
    pub compile_failures: u64,
    pub predicates_rendered: u64,
    pub parameters_bound: u64,
    pub subqueries_rendered: u64,
}

///
/// EntityCounters
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EntityCounters {
    pub criteria_created: u64,
    pub compiles: u64,
    pub compile_failures: u64,
    pub parameters_bound: u64,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

fn now_millis() -> u64 {
    u64::try_from(OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000).unwrap_or(0)
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters and restart the window.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

///
/// EventReport
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    /// Ephemeral counters since `window_start_ms`.
    pub counters: Option<EventState>,
    /// Per-entity counters with derived averages.
    pub entity_counters: Vec<EntitySummary>,
}

///
/// EntitySummary
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EntitySummary {
    pub entity: String,
    pub criteria_created: u64,
    pub compiles: u64,
    pub compile_failures: u64,
    pub parameters_bound: u64,
    pub avg_parameters_per_compile: f64,
}

/// Build a report, or an empty one when the current window started
/// before `window_start_ms`.
#[must_use]
pub(crate) fn report_window_start(window_start_ms: Option<u64>) -> EventReport {
    let snap = with_state(Clone::clone);
    if window_start_ms.is_some_and(|start| snap.window_start_ms < start) {
        return EventReport::default();
    }

    build_report(snap)
}

#[expect(clippy::cast_precision_loss)]
fn build_report(snap: EventState) -> EventReport {
    let mut entity_counters: Vec<EntitySummary> = snap
        .entities
        .iter()
        .map(|(entity, c)| EntitySummary {
            entity: entity.clone(),
            criteria_created: c.criteria_created,
            compiles: c.compiles,
            compile_failures: c.compile_failures,
            parameters_bound: c.parameters_bound,
            avg_parameters_per_compile: if c.compiles > 0 {
                c.parameters_bound as f64 / c.compiles as f64
            } else {
                0.0
            },
        })
        .collect();

    // busiest entities first, then by name
    entity_counters.sort_by(|a, b| b.compiles.cmp(&a.compiles).then(a.entity.cmp(&b.entity)));

    EventReport {
        counters: Some(snap),
        entity_counters,
    }
}

///
/// TESTS
///

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn reset_all_clears_state() {
        with_state_mut(|m| {
            m.ops.compiles = 3;
            m.skips.insert("null_value".to_string(), 2);
            m.entities.insert(
                "Order".to_string(),
                EntityCounters {
                    compiles: 1,
                    ..Default::default()
                },
            );
        });

        reset_all();

        with_state(|m| {
            assert_eq!(m.ops.compiles, 0);
            assert!(m.skips.is_empty());
            assert!(m.entities.is_empty());
        });
    }

    #[test]
    fn report_orders_entities_by_compiles() {
        reset_all();
        with_state_mut(|m| {
            for (name, compiles, params) in [("Item", 1, 5), ("Order", 4, 8), ("User", 1, 0)] {
                m.entities.insert(
                    name.to_string(),
                    EntityCounters {
                        compiles,
                        parameters_bound: params,
                        ..Default::default()
                    },
                );
            }
        });

        let report = report_window_start(None);
        let names: Vec<_> = report
            .entity_counters
            .iter()
            .map(|e| e.entity.as_str())
            .collect();

        assert_eq!(names, ["Order", "Item", "User"]);
        assert_eq!(report.entity_counters[0].avg_parameters_per_compile, 2.0);
        assert_eq!(report.entity_counters[2].avg_parameters_per_compile, 0.0);
    }
}
