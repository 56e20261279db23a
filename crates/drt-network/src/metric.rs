//! Pluggable point-to-point distance models.
//!
//! # Pluggability
//!
//! The trip tracker and the routing-snapshot builder compute distances via
//! the [`DistanceModel`] trait, so applications can swap in a road-network
//! lookup, a precomputed matrix or a detour-factor model without touching the
//! simulation core.  Travel *time* is always `distance / speed`, rounded up to
//! whole seconds so vehicles never arrive earlier than physically possible.

use drt_core::GeoPoint;

// ── DistanceModel trait ───────────────────────────────────────────────────────

/// Distance between two coordinates, in metres.
///
/// Implementations must be `Send + Sync` so a snapshot build can fan rows of
/// the travel-time matrix out across Rayon workers.
pub trait DistanceModel: Send + Sync {
    fn distance_m(&self, from: GeoPoint, to: GeoPoint) -> f64;
}

// ── Implementations ───────────────────────────────────────────────────────────

/// Great-circle distance for WGS-84 coordinates, optionally inflated by a
/// detour factor to approximate street distance.
#[derive(Debug, Clone, Copy)]
pub struct Haversine {
    pub detour_factor: f64,
}

impl Default for Haversine {
    fn default() -> Self {
        Self { detour_factor: 1.0 }
    }
}

impl DistanceModel for Haversine {
    #[inline]
    fn distance_m(&self, from: GeoPoint, to: GeoPoint) -> f64 {
        from.distance_m(to) * self.detour_factor
    }
}

/// Straight-line distance for synthetic networks whose coordinates are planar
/// metres.
#[derive(Debug, Clone, Copy, Default)]
pub struct Planar;

impl DistanceModel for Planar {
    #[inline]
    fn distance_m(&self, from: GeoPoint, to: GeoPoint) -> f64 {
        from.planar_distance_m(to)
    }
}

impl<F> DistanceModel for F
where
    F: Fn(GeoPoint, GeoPoint) -> f64 + Send + Sync,
{
    #[inline]
    fn distance_m(&self, from: GeoPoint, to: GeoPoint) -> f64 {
        self(from, to)
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Whole-second travel time for `distance_m` at `speed_mps` (ceiling).
///
/// A non-positive speed yields `u64::MAX`, which every time-window check
/// treats as unreachable.
#[inline]
pub fn travel_secs(distance_m: f64, speed_mps: f64) -> u64 {
    if distance_m <= 0.0 {
        return 0;
    }
    if speed_mps <= 0.0 {
        return u64::MAX;
    }
    (distance_m / speed_mps).ceil() as u64
}
