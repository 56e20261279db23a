//! Simulation time model.
//!
//! # Design
//!
//! Time is an integer count of seconds since the start of the service day,
//! `SimTime`.  Integer seconds make every schedule comparison exact; the event
//! queue orders on `(SimTime, EventKind)` without floating-point ties.
//!
//! The mapping to wall-clock time is held in `SimClock`:
//!
//!   wall_time = start_unix_secs + sim_time

use std::fmt;

use crate::{DrtError, DrtResult, SlotAliasing};

// ── SimTime ───────────────────────────────────────────────────────────────────

/// An absolute simulation time in whole seconds.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);
    pub const MAX: SimTime = SimTime(u64::MAX);

    /// Return the time `secs` seconds after `self`.
    #[inline]
    pub fn offset(self, secs: u64) -> SimTime {
        SimTime(self.0.saturating_add(secs))
    }

    /// Seconds elapsed from `earlier` to `self`.
    ///
    /// # Panics
    /// Panics in debug mode if `earlier > self`.
    #[inline]
    pub fn since(self, earlier: SimTime) -> u64 {
        self.0 - earlier.0
    }

    /// Signed difference `self - other` in seconds.  Used for delay metrics,
    /// where "early" is a negative value.
    #[inline]
    pub fn signed_since(self, other: SimTime) -> i64 {
        self.0 as i64 - other.0 as i64
    }

    /// `(day, hour, minute, second)` components.
    pub fn dhms(self) -> (u64, u32, u32, u32) {
        let days = self.0 / 86_400;
        let hours = ((self.0 % 86_400) / 3_600) as u32;
        let minutes = ((self.0 % 3_600) / 60) as u32;
        let seconds = (self.0 % 60) as u32;
        (days, hours, minutes, seconds)
    }
}

impl std::ops::Add<u64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: u64) -> SimTime {
        self.offset(rhs)
    }
}

impl std::ops::Sub for SimTime {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: SimTime) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (d, h, m, s) = self.dhms();
        if d > 0 {
            write!(f, "d{d} {h:02}:{m:02}:{s:02}")
        } else {
            write!(f, "{h:02}:{m:02}:{s:02}")
        }
    }
}

// ── TimeWindow ────────────────────────────────────────────────────────────────

/// A closed interval `[earliest, latest]` of simulation time.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeWindow {
    pub earliest: SimTime,
    pub latest:   SimTime,
}

impl TimeWindow {
    #[inline]
    pub fn new(earliest: SimTime, latest: SimTime) -> Self {
        Self { earliest, latest }
    }

    /// Window from raw seconds.
    #[inline]
    pub fn secs(earliest: u64, latest: u64) -> Self {
        Self::new(SimTime(earliest), SimTime(latest))
    }

    /// `true` when `earliest <= latest`.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.earliest <= self.latest
    }

    #[inline]
    pub fn contains(&self, t: SimTime) -> bool {
        self.earliest <= t && t <= self.latest
    }

    /// Raise the lower bound to at least `t`.
    #[inline]
    pub fn tighten_earliest(&mut self, t: SimTime) {
        self.earliest = self.earliest.max(t);
    }

    /// Lower the upper bound to at most `t`.
    #[inline]
    pub fn tighten_latest(&mut self, t: SimTime) {
        self.latest = self.latest.min(t);
    }

    /// Width in seconds (`0` for invalid windows).
    #[inline]
    pub fn width(&self) -> u64 {
        self.latest.0.saturating_sub(self.earliest.0)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.earliest.0, self.latest.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Tracks the time of the event being processed and converts it to Unix
/// wall-clock seconds.
///
/// `SimClock` is cheap to copy and intentionally holds no heap data.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Unix timestamp (seconds since epoch) of `SimTime::ZERO`.
    pub start_unix_secs: i64,
    /// Time of the most recently popped event.
    pub now: SimTime,
}

impl SimClock {
    pub fn new(start_unix_secs: i64) -> Self {
        Self { start_unix_secs, now: SimTime::ZERO }
    }

    /// Move the clock to `t`.  The event loop only ever moves forward.
    #[inline]
    pub fn advance_to(&mut self, t: SimTime) {
        debug_assert!(t >= self.now, "clock moved backwards: {t} < {}", self.now);
        self.now = t;
    }

    /// Unix timestamp corresponding to `t`.
    #[inline]
    pub fn unix_secs(&self, t: SimTime) -> i64 {
        self.start_unix_secs + t.0 as i64
    }

    /// Unix timestamp corresponding to `now`.
    #[inline]
    pub fn current_unix_secs(&self) -> i64 {
        self.unix_secs(self.now)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (unix {})", self.now, self.current_unix_secs())
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation configuration.
///
/// Typically loaded from a JSON file by the application crate (with the
/// `serde` feature) and passed to the simulation builder.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Unix timestamp for `SimTime::ZERO` (midnight of the service day).
    pub start_unix_secs: i64,

    /// Length of the planning horizon.  Every routing slot starts with the
    /// window `[0, day_length_secs]`.
    pub day_length_secs: u64,

    /// Time a vehicle spends at each stop between arrival and departure.
    pub dwell_secs: u64,

    /// Offset after arrival at which boarding starts; alighting happens at
    /// arrival.  Must be positive, so seats freed at a stop are free before
    /// anyone boards there, and strictly less than `dwell_secs` so every
    /// boarding is handled before the vehicle departs.
    pub alighting_secs: u64,

    /// Speed used for vehicles that do not specify their own, in m/s.
    pub default_speed_mps: f64,

    /// Upper bound on a customer's ride time, enforced by the oracle.
    pub max_ride_time_secs: Option<u64>,

    /// Upper bound on waiting time at any non-start slot, enforced by the
    /// oracle.
    pub max_schedule_slack_secs: Option<u64>,

    /// When set, `CustomerRequest` events only queue the customer and a
    /// periodic `DynamicCheck` event re-optimises the queue.  When `None`,
    /// each request is re-optimised as soon as it arrives.
    pub dynamic_check_interval_secs: Option<u64>,

    /// How customer stops map onto routing-snapshot slots.
    pub slot_aliasing: SlotAliasing,

    /// Abort the run on the first lifecycle contract violation instead of
    /// reporting it and continuing with the next event.
    pub strict: bool,

    /// Master RNG seed.  The same seed always produces identical demand.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start_unix_secs:             0,
            day_length_secs:             86_400,
            dwell_secs:                  30,
            alighting_secs:              10,
            default_speed_mps:           8.33, // ~30 km/h
            max_ride_time_secs:          None,
            max_schedule_slack_secs:     None,
            dynamic_check_interval_secs: None,
            slot_aliasing:               SlotAliasing::ByStop,
            strict:                      false,
            seed:                        0,
        }
    }
}

impl SimConfig {
    /// The full planning-horizon window `[0, day_length_secs]`.
    #[inline]
    pub fn day_window(&self) -> TimeWindow {
        TimeWindow::secs(0, self.day_length_secs)
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.start_unix_secs)
    }

    /// Reject configurations the event loop cannot honour.
    pub fn validate(&self) -> DrtResult<()> {
        if self.day_length_secs == 0 {
            return Err(DrtError::Config("day_length_secs must be positive".into()));
        }
        if self.alighting_secs == 0 {
            return Err(DrtError::Config("alighting_secs must be positive".into()));
        }
        if self.alighting_secs >= self.dwell_secs {
            return Err(DrtError::Config(format!(
                "alighting_secs ({}) must be less than dwell_secs ({})",
                self.alighting_secs, self.dwell_secs
            )));
        }
        if !(self.default_speed_mps.is_finite() && self.default_speed_mps > 0.0) {
            return Err(DrtError::Config(format!(
                "default_speed_mps must be a positive number, got {}",
                self.default_speed_mps
            )));
        }
        if self.dynamic_check_interval_secs == Some(0) {
            return Err(DrtError::Config("dynamic_check_interval_secs must be positive".into()));
        }
        Ok(())
    }
}
