//! Ride ledger: the statistics sink and the end-of-day report.

use chairlift_core::{GateId, PriorityClass, RideEvent, Route, SkierId, StatisticsSink};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Aggregated ride counters for one day
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DailyReport {
    /// Completed rides per skier
    pub rides_per_skier: BTreeMap<SkierId, u32>,
    /// Hand-offs per admission gate that led to a completed ride
    pub gate_entries: BTreeMap<GateId, u64>,
    /// Descents per route, in [`Route::ALL`] order
    pub route_descents: [u64; 3],
    /// Rides taken from the VIP pool
    pub vip_rides: u64,
    /// All completed rides
    pub total_rides: u64,
}

impl DailyReport {
    /// Descents of `route`
    #[must_use]
    pub const fn descents(&self, route: Route) -> u64 {
        self.route_descents[route.index()]
    }
}

impl fmt::Display for DailyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Daily report ===")?;
        writeln!(
            f,
            "Rides: {} total, {} VIP, {} skiers",
            self.total_rides,
            self.vip_rides,
            self.rides_per_skier.len()
        )?;

        writeln!(f, "Rides per skier:")?;
        for (skier, rides) in &self.rides_per_skier {
            writeln!(f, "  {:>6}  {rides}", skier.to_string())?;
        }

        writeln!(f, "Gate entries:")?;
        for (gate, entries) in &self.gate_entries {
            writeln!(f, "  {:>6}  {entries}", gate.to_string())?;
        }

        writeln!(f, "Route descents:")?;
        for route in Route::ALL {
            writeln!(f, "  {:>6}  {}", route.to_string(), self.descents(route))?;
        }
        Ok(())
    }
}

/// Append-only [`StatisticsSink`] behind a single lock
#[derive(Debug, Default)]
pub struct RideLedger {
    report: Mutex<DailyReport>,
}

impl RideLedger {
    /// Empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the counters so far
    #[must_use]
    pub fn report(&self) -> DailyReport {
        self.report
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl StatisticsSink for RideLedger {
    fn record(&self, event: RideEvent) {
        let mut report = self.report.lock().unwrap_or_else(PoisonError::into_inner);
        report.rides_per_skier.insert(event.skier, event.completed_rides);
        *report.gate_entries.entry(event.gate).or_insert(0) += 1;
        report.route_descents[event.route.index()] += 1;
        if event.class == PriorityClass::Vip {
            report.vip_rides += 1;
        }
        report.total_rides += 1;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    fn ride(skier: u32, gate: usize, route: Route, completed_rides: u32) -> RideEvent {
        RideEvent {
            skier: SkierId(skier),
            gate: GateId(gate),
            route,
            completed_rides,
            class: PriorityClass::Standard,
        }
    }

    #[test]
    fn test_ledger_aggregates_rides() {
        let ledger = RideLedger::new();
        ledger.record(ride(1, 0, Route::T1, 1));
        ledger.record(ride(1, 2, Route::T3, 2));
        ledger.record(RideEvent {
            class: PriorityClass::Vip,
            ..ride(2, 0, Route::T1, 1)
        });

        let report = ledger.report();
        assert_eq!(report.total_rides, 3);
        assert_eq!(report.vip_rides, 1);
        assert_eq!(report.rides_per_skier[&SkierId(1)], 2);
        assert_eq!(report.gate_entries[&GateId(0)], 2);
        assert_eq!(report.descents(Route::T1), 2);
        assert_eq!(report.descents(Route::T2), 0);
    }

    #[test]
    fn test_report_renders_every_route() {
        let ledger = RideLedger::new();
        ledger.record(ride(4, 1, Route::T2, 1));

        let rendered = ledger.report().to_string();
        assert!(rendered.contains("1 total"));
        assert!(rendered.contains("#4"));
        assert!(rendered.contains("G2"));
        for route in Route::ALL {
            assert!(rendered.contains(&route.to_string()));
        }
    }
}
