//! Service-mode and slot-aliasing enums shared across fleet and routing crates.

/// How a vehicle's trips come about.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ServiceMode {
    /// Pre-built trips with fixed stop sequences and start times.
    #[default]
    Fixed,
    /// Trips are created and re-written by the re-optimisation protocol.
    Flexible,
}

impl ServiceMode {
    #[inline]
    pub fn is_flexible(self) -> bool {
        matches!(self, ServiceMode::Flexible)
    }

    /// Human-readable label, useful for CSV column values.
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceMode::Fixed    => "fixed",
            ServiceMode::Flexible => "flexible",
        }
    }
}

impl std::fmt::Display for ServiceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How customer stops are mapped onto routing-snapshot slots.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SlotAliasing {
    /// Customers whose stops coincide share one slot per physical stop; time
    /// windows are aggregated (max of lower bounds, min of upper bounds) and
    /// an empty aggregate is a hard `TimeWindowConflict`.
    #[default]
    ByStop,
    /// Every pickup and delivery gets its own slot.
    Distinct,
}
