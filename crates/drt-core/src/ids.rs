//! Strongly typed, zero-cost identifier wrappers.
//!
//! Every arena in the simulator (stops, vehicles, customers) is a `Vec`
//! indexed by one of these ids.  Trips, events and routing snapshots refer to
//! entities only through ids, never through references.  The inner integer is
//! `pub` to allow direct indexing via `id.0 as usize`, but callers should
//! prefer the `.index()` helper.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of a stop in the `StopNetwork` arena.
    pub struct StopId(u32);
}

typed_id! {
    /// Index of a static transit route (line).
    pub struct RouteId(u32);
}

typed_id! {
    /// Index of a vehicle in the fleet arena.
    pub struct VehicleId(u32);
}

typed_id! {
    /// Index of a customer in the fleet's customer arena.
    pub struct CustomerId(u32);
}

typed_id! {
    /// Sequential identity of a trip instance.  Re-planning a trip's suffix
    /// keeps its id; starting a fresh trip allocates a new one.
    pub struct TripId(u32);
}
