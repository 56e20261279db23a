//! Fluent builder for constructing a [`Sim`].

use std::collections::VecDeque;

use drt_core::{SimConfig, StopId};
use drt_events::EventQueue;
use drt_fleet::Fleet;
use drt_network::{DistanceModel, StopNetwork};
use drt_routing::{Oracle, SnapshotBuilder, SnapshotConfig};

use crate::{Sim, SimError, SimResult, SimStats};

/// Fluent builder for [`Sim<O, M>`].
///
/// # Required inputs
///
/// - [`SimConfig`] — dwell times, limits, batching, strict mode, …
/// - [`StopNetwork`] — the stop universe
/// - `O: Oracle` — the routing solver (e.g. [`drt_routing::InsertionOracle`])
/// - `M: DistanceModel` — e.g. [`drt_network::Haversine`]
///
/// # Optional inputs (have defaults)
///
/// | Method                 | Default                                   |
/// |------------------------|-------------------------------------------|
/// | `.fleet(f)`            | Empty `Fleet`                             |
/// | `.snapshot_config(c)`  | `SnapshotConfig::from_sim_config(&config)` |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(config, network, InsertionOracle::new(), Haversine::default())
///     .fleet(fleet)
///     .build()?;
/// let report = sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder<O: Oracle, M: DistanceModel> {
    config:    SimConfig,
    network:   StopNetwork,
    fleet:     Option<Fleet>,
    snapshots: Option<SnapshotConfig>,
    oracle:    O,
    metric:    M,
}

impl<O: Oracle, M: DistanceModel> SimBuilder<O, M> {
    /// Create a builder with all required inputs.
    pub fn new(config: SimConfig, network: StopNetwork, oracle: O, metric: M) -> Self {
        Self {
            config,
            network,
            fleet:     None,
            snapshots: None,
            oracle,
            metric,
        }
    }

    /// Supply the vehicles (with any queued fixed trips) and customers.
    pub fn fleet(mut self, fleet: Fleet) -> Self {
        self.fleet = Some(fleet);
        self
    }

    /// Override the snapshot settings derived from the simulation config.
    pub fn snapshot_config(mut self, config: SnapshotConfig) -> Self {
        self.snapshots = Some(config);
        self
    }

    /// Validate inputs and return a ready-to-run [`Sim`].
    ///
    /// Fails when the config is inconsistent or the fleet refers to stops
    /// outside the network.
    pub fn build(self) -> SimResult<Sim<O, M>> {
        self.config.validate()?;
        let fleet = self.fleet.unwrap_or_default();
        check_fleet(&fleet, &self.network)?;

        let snapshots = self
            .snapshots
            .unwrap_or_else(|| SnapshotConfig::from_sim_config(&self.config));

        Ok(Sim {
            clock:     self.config.make_clock(),
            config:    self.config,
            network:   self.network,
            fleet,
            queue:     EventQueue::new(),
            stats:     SimStats::default(),
            oracle:    self.oracle,
            metric:    self.metric,
            snapshots: SnapshotBuilder::new(snapshots),
            pending:   VecDeque::new(),
            waiting:   Vec::new(),
            primed:    false,
        })
    }
}

fn check_fleet(fleet: &Fleet, network: &StopNetwork) -> SimResult<()> {
    let known = |stop: StopId, what: &str| -> SimResult<()> {
        if network.contains(stop) {
            Ok(())
        } else {
            Err(SimError::Config(format!("{what} refers to {stop}, which is not in the network")))
        }
    };

    for v in fleet.vehicles() {
        if v.capacity == 0 {
            return Err(SimError::Config(format!("{} has no seats", v.id)));
        }
        if !(v.speed_mps.is_finite() && v.speed_mps > 0.0) {
            return Err(SimError::Config(format!("{} has invalid speed {}", v.id, v.speed_mps)));
        }
        known(v.start_depot, "start depot")?;
        known(v.end_depot, "end depot")?;
        for trip in v.active_trip().into_iter().chain(v.queued_trips()) {
            for planned in trip.stops() {
                known(planned.stop, "trip stop")?;
            }
        }
    }
    for c in fleet.customers() {
        known(c.pickup, "pickup")?;
        known(c.delivery, "delivery")?;
        if !c.window.is_valid() {
            return Err(SimError::Config(format!("{} has an empty window {}", c.id, c.window)));
        }
    }
    Ok(())
}
