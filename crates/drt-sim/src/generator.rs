//! `RequestGenerator` — synthetic customer requests.
//!
//! Pickup stops are drawn from the demand table's hourly per-stop rates when
//! one is given (uniformly otherwise).  Delivery stops come from a uniform
//! point in the network's bounding box snapped to the nearest stop, so
//! densely stopped areas attract more trips.
//!
//! [`RequestGenerator::generate_solvable`] keeps drawing request sets until
//! the oracle can serve a whole set from time zero, giving up after
//! `max_attempts`.

use rand::distributions::{Distribution, WeightedIndex};

use drt_core::{GeoPoint, SimRng, SimTime, StopId, TimeWindow};
use drt_fleet::{CustomerSpec, Fleet};
use drt_network::{DemandTable, DistanceModel, StopNetwork};
use drt_routing::{Oracle, OracleOutcome, SnapshotBuilder, SnapshotRequest};

use crate::{SimError, SimResult};

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Requests per set.
    pub count:           usize,
    /// Request times are uniform in `[0, horizon_secs)`.
    pub horizon_secs:    u64,
    /// Gap between a request and its earliest pickup.
    pub lead_secs:       u64,
    /// Width of the desired window.
    pub window_secs:     u64,
    /// Probability that a request is known before the run.
    pub prebooked_share: f64,
    /// Bound on `generate_solvable` draws.
    pub max_attempts:    u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            count:           20,
            horizon_secs:    4 * 3_600,
            lead_secs:       600,
            window_secs:     3_600,
            prebooked_share: 0.25,
            max_attempts:    10,
        }
    }
}

pub struct RequestGenerator<'a> {
    network: &'a StopNetwork,
    demand:  Option<&'a DemandTable>,
    config:  GeneratorConfig,
}

impl<'a> RequestGenerator<'a> {
    pub fn new(network: &'a StopNetwork, config: GeneratorConfig) -> Self {
        Self { network, demand: None, config }
    }

    /// Weight pickup stops by `demand`.
    pub fn with_demand(mut self, demand: &'a DemandTable) -> Self {
        self.demand = Some(demand);
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Draw one request set.
    pub fn generate(&self, rng: &mut SimRng) -> SimResult<Vec<CustomerSpec>> {
        if self.network.stop_count() < 2 {
            return Err(SimError::Config("request generation needs at least two stops".into()));
        }
        Ok((0..self.config.count).map(|_| self.one(rng)).collect())
    }

    /// Draw request sets until `oracle` solves one as a whole on a copy of
    /// `fleet`, at most `max_attempts` times.  Attempt `k` uses child stream
    /// `k` of `rng`, so the result is reproducible from the seed.
    pub fn generate_solvable(
        &self,
        rng:       &mut SimRng,
        fleet:     &Fleet,
        snapshots: &SnapshotBuilder,
        oracle:    &dyn Oracle,
        metric:    &dyn DistanceModel,
    ) -> SimResult<Vec<CustomerSpec>> {
        let vehicles = fleet.flexible_vehicles();
        for attempt in 0..self.config.max_attempts {
            let mut child = rng.child(attempt as u64);
            let specs = self.generate(&mut child)?;

            let mut trial = fleet.clone();
            let customers = specs.iter().cloned().map(|s| trial.add_customer(s)).collect();
            let request = SnapshotRequest::new(SimTime::ZERO, vehicles.clone(), customers);
            let Ok(snapshot) = snapshots.build(&request, &trial, self.network, metric) else {
                continue;
            };
            if let OracleOutcome::Solved(_) = oracle.solve(&snapshot) {
                return Ok(specs);
            }
        }
        Err(SimError::GeneratorExhausted { attempts: self.config.max_attempts })
    }

    fn one(&self, rng: &mut SimRng) -> CustomerSpec {
        let requested = rng.gen_range(0..self.config.horizon_secs.max(1));
        let prebooked = rng.gen_bool(self.config.prebooked_share);
        let earliest = requested + self.config.lead_secs;
        let hour = ((earliest / 3_600) % 24) as u8;
        let pickup = self.pickup(rng, hour);
        let delivery = self.delivery(rng, pickup);
        CustomerSpec {
            pickup,
            delivery,
            window:       TimeWindow::secs(earliest, earliest + self.config.window_secs),
            request_time: if prebooked { SimTime::ZERO } else { SimTime(requested) },
            prebooked,
        }
    }

    fn pickup(&self, rng: &mut SimRng, hour: u8) -> StopId {
        let n = self.network.stop_count();
        if let Some(demand) = self.demand {
            // All-zero weights fall through to a uniform draw.
            if let Ok(dist) = WeightedIndex::new(demand.stop_weights(hour, n)) {
                return StopId(dist.sample(rng.inner()) as u32);
            }
        }
        StopId(rng.gen_range(0..n) as u32)
    }

    fn delivery(&self, rng: &mut SimRng, pickup: StopId) -> StopId {
        if let Some((lo, hi)) = self.network.bounds() {
            for _ in 0..4 {
                let lat = if hi.lat > lo.lat { rng.gen_range(lo.lat..=hi.lat) } else { lo.lat };
                let lon = if hi.lon > lo.lon { rng.gen_range(lo.lon..=hi.lon) } else { lo.lon };
                match self.network.snap_to_stop(GeoPoint::new(lat, lon)) {
                    Some(stop) if stop != pickup => return stop,
                    _ => {}
                }
            }
        }
        let n = self.network.stop_count();
        let offset = rng.gen_range(1..n);
        StopId(((pickup.index() + offset) % n) as u32)
    }
}
