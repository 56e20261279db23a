//! Hourly demand table keyed by (stop, route, hour).
//!
//! Rates are expected requests per hour originating at a stop on a route.
//! The request generator uses the per-stop sums as sampling weights for
//! pickup stops.

use std::collections::HashMap;

use drt_core::{RouteId, StopId};

/// Sparse `(stop, route, hour) → rate` table.
#[derive(Debug, Clone, Default)]
pub struct DemandTable {
    rates: HashMap<(StopId, RouteId, u8), f64>,
}

impl DemandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rate for `(stop, route, hour)`; `hour` is taken modulo 24.
    /// Repeated rows for the same key accumulate.
    pub fn add(&mut self, stop: StopId, route: RouteId, hour: u8, rate: f64) {
        *self.rates.entry((stop, route, hour % 24)).or_insert(0.0) += rate;
    }

    /// Rate for one key, `0.0` when absent.
    pub fn rate(&self, stop: StopId, route: RouteId, hour: u8) -> f64 {
        self.rates.get(&(stop, route, hour % 24)).copied().unwrap_or(0.0)
    }

    /// Total rate at `stop` across all routes for `hour`.
    pub fn stop_rate(&self, stop: StopId, hour: u8) -> f64 {
        let hour = hour % 24;
        self.rates
            .iter()
            .filter(|((s, _, h), _)| *s == stop && *h == hour)
            .map(|(_, r)| *r)
            .sum()
    }

    /// Per-stop weights (indexed by `StopId`) for `hour`.
    pub fn stop_weights(&self, hour: u8, stop_count: usize) -> Vec<f64> {
        let hour = hour % 24;
        let mut weights = vec![0.0; stop_count];
        for ((stop, _, h), rate) in &self.rates {
            if *h == hour && stop.index() < stop_count {
                weights[stop.index()] += rate;
            }
        }
        weights
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}
