//! Stop arena, static routes and builder.
//!
//! # Data layout
//!
//! Stops live in a dense `Vec<Stop>` indexed by `StopId`.  External stop
//! codes (as found in GTFS-like files) are mapped to `StopId`s once at load
//! time; nothing downstream ever handles the string codes again.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) maps `(lat, lon)` to the nearest `StopId`.  Used to
//! snap request coordinates (e.g. from the demand generator) onto stops.

use std::collections::HashMap;

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use drt_core::{GeoPoint, RouteId, StopId};

use crate::{DistanceModel, NetworkError, NetworkResult};

// ── R-tree stop entry ─────────────────────────────────────────────────────────

/// Entry stored in the R-tree spatial index: a 2-D `[lat, lon]` point with
/// the associated `StopId`.
#[derive(Clone)]
struct StopEntry {
    point: [f64; 2], // [lat, lon]
    id: StopId,
}

impl RTreeObject for StopEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for StopEntry {
    /// Squared Euclidean distance in coordinate space.  Sufficient for
    /// nearest-stop queries within a city.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

// ── Stop / TransitRoute ───────────────────────────────────────────────────────

/// An immutable stop.  Referenced by `StopId`, never owned, by trips,
/// customers and vehicles.
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub id:   StopId,
    /// External code from the source data (unique).
    pub code: String,
    pub name: String,
    pub pos:  GeoPoint,
}

/// A static line: an ordered stop pattern that fixed trips follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitRoute {
    pub id:    RouteId,
    pub code:  String,
    pub stops: Vec<StopId>,
}

// ── StopNetwork ───────────────────────────────────────────────────────────────

/// The immutable stop universe plus a spatial index for snapping.
///
/// Do not construct directly; use [`StopNetworkBuilder`].
pub struct StopNetwork {
    stops:       Vec<Stop>,
    routes:      Vec<TransitRoute>,
    stop_codes:  HashMap<String, StopId>,
    route_codes: HashMap<String, RouteId>,
    spatial_idx: RTree<StopEntry>,
}

impl StopNetwork {
    /// Construct an empty network with no stops.
    pub fn empty() -> Self {
        StopNetworkBuilder::new().build()
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Look up a stop.  Returns `None` for ids outside the arena.
    #[inline]
    pub fn stop(&self, id: StopId) -> Option<&Stop> {
        self.stops.get(id.index())
    }

    #[inline]
    pub fn contains(&self, id: StopId) -> bool {
        id.index() < self.stops.len()
    }

    /// Position of `id`.
    ///
    /// # Panics
    /// Panics if `id` is not in this network; ids are only ever minted by
    /// the builder, so an out-of-range id is a programming error.
    #[inline]
    pub fn pos(&self, id: StopId) -> GeoPoint {
        self.stops[id.index()].pos
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn routes(&self) -> &[TransitRoute] {
        &self.routes
    }

    pub fn route(&self, id: RouteId) -> Option<&TransitRoute> {
        self.routes.get(id.index())
    }

    /// Resolve an external stop code.
    pub fn stop_by_code(&self, code: &str) -> Option<StopId> {
        self.stop_codes.get(code).copied()
    }

    /// Resolve an external route code.
    pub fn route_by_code(&self, code: &str) -> Option<RouteId> {
        self.route_codes.get(code).copied()
    }

    // ── Distances ─────────────────────────────────────────────────────────

    /// Distance between two stops under `metric`, in metres.
    #[inline]
    pub fn leg_distance_m(&self, metric: &dyn DistanceModel, from: StopId, to: StopId) -> f64 {
        if from == to {
            return 0.0;
        }
        metric.distance_m(self.pos(from), self.pos(to))
    }

    /// Whole-second travel time between two stops at `speed_mps`.
    #[inline]
    pub fn leg_secs(
        &self,
        metric:    &dyn DistanceModel,
        from:      StopId,
        to:        StopId,
        speed_mps: f64,
    ) -> u64 {
        crate::travel_secs(self.leg_distance_m(metric, from, to), speed_mps)
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// Return the `StopId` of the nearest stop to `pos`.
    ///
    /// Returns `None` only if the network has no stops.
    pub fn snap_to_stop(&self, pos: GeoPoint) -> Option<StopId> {
        self.spatial_idx
            .nearest_neighbor(&[pos.lat, pos.lon])
            .map(|e| e.id)
    }

    /// Return up to `k` nearest stops to `pos`, sorted by ascending distance.
    pub fn k_nearest_stops(&self, pos: GeoPoint, k: usize) -> Vec<StopId> {
        self.spatial_idx
            .nearest_neighbor_iter(&[pos.lat, pos.lon])
            .take(k)
            .map(|e| e.id)
            .collect()
    }

    /// `(min, max)` corners of the stops' bounding box, or `None` when empty.
    pub fn bounds(&self) -> Option<(GeoPoint, GeoPoint)> {
        if self.stops.is_empty() {
            return None;
        }
        let envelope = self.spatial_idx.root().envelope();
        let lower = envelope.lower();
        let upper = envelope.upper();
        Some((GeoPoint::new(lower[0], lower[1]), GeoPoint::new(upper[0], upper[1])))
    }
}

// ── StopNetworkBuilder ────────────────────────────────────────────────────────

/// Construct a [`StopNetwork`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use drt_core::GeoPoint;
/// use drt_network::StopNetworkBuilder;
///
/// let mut b = StopNetworkBuilder::new();
/// let a = b.add_stop("A", "Depot", GeoPoint::new(52.52, 13.40)).unwrap();
/// let c = b.add_stop("C", "Central", GeoPoint::new(52.53, 13.41)).unwrap();
/// b.add_route("L1", vec![a, c]).unwrap();
/// let net = b.build();
/// assert_eq!(net.stop_count(), 2);
/// assert_eq!(net.route_count(), 1);
/// ```
#[derive(Default)]
pub struct StopNetworkBuilder {
    stops:       Vec<Stop>,
    routes:      Vec<TransitRoute>,
    stop_codes:  HashMap<String, StopId>,
    route_codes: HashMap<String, RouteId>,
}

impl StopNetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stop and return its `StopId` (sequential from 0).
    pub fn add_stop(&mut self, code: &str, name: &str, pos: GeoPoint) -> NetworkResult<StopId> {
        if self.stop_codes.contains_key(code) {
            return Err(NetworkError::DuplicateStop(code.to_owned()));
        }
        let id = StopId(self.stops.len() as u32);
        self.stops.push(Stop {
            id,
            code: code.to_owned(),
            name: name.to_owned(),
            pos,
        });
        self.stop_codes.insert(code.to_owned(), id);
        Ok(id)
    }

    /// Add a static route through `stops` (in order).
    pub fn add_route(&mut self, code: &str, stops: Vec<StopId>) -> NetworkResult<RouteId> {
        if stops.is_empty() {
            return Err(NetworkError::EmptyRoute(code.to_owned()));
        }
        let id = RouteId(self.routes.len() as u32);
        self.routes.push(TransitRoute { id, code: code.to_owned(), stops });
        self.route_codes.insert(code.to_owned(), id);
        Ok(id)
    }

    /// Resolve a stop code added earlier (used by the route loader).
    pub fn stop_by_code(&self, code: &str) -> Option<StopId> {
        self.stop_codes.get(code).copied()
    }

    pub fn stop_count(&self) -> usize { self.stops.len() }

    /// Consume the builder and produce a [`StopNetwork`].
    ///
    /// Time complexity: O(N log N) for the R-tree bulk load.
    pub fn build(self) -> StopNetwork {
        let entries: Vec<StopEntry> = self
            .stops
            .iter()
            .map(|s| StopEntry { point: [s.pos.lat, s.pos.lon], id: s.id })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        StopNetwork {
            stops:       self.stops,
            routes:      self.routes,
            stop_codes:  self.stop_codes,
            route_codes: self.route_codes,
            spatial_idx,
        }
    }
}
