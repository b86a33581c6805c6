//! Simulation time model.
//!
//! # Design
//!
//! Time is a monotonically increasing `Tick` counter.  Each tick advances the
//! physics by a wall-clock delta `Δt` in seconds, produced by [`TickClock`]:
//!
//! - **Fixed mode** — every tick uses the configured `tick_interval_ms`.
//!   This is the default for manually stepped simulations and the reason
//!   seeded runs are byte-for-byte reproducible.
//! - **Measured mode** — `Δt` is the real elapsed time since the previous
//!   tick, clamped to `[10 ms, 500 ms]`.  Used by the continuous runner so
//!   vehicles move at real-time speed regardless of scheduling jitter.

use std::fmt;
use std::time::Instant;

/// Lower clamp for a measured tick delta, in seconds.
pub const DT_MIN_SECS: f64 = 0.010;
/// Upper clamp for a measured tick delta, in seconds.
pub const DT_MAX_SECS: f64 = 0.500;

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }

    /// Ticks elapsed from `earlier` to `self` (saturating).
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── TickClock ─────────────────────────────────────────────────────────────────

/// Produces the physics delta for each tick.
#[derive(Debug)]
pub enum TickClock {
    /// Every tick advances by the same fixed delta (deterministic stepping).
    Fixed { dt_secs: f64 },
    /// Deltas are measured from the wall clock and clamped.
    Measured { last: Option<Instant> },
}

impl TickClock {
    /// Fixed-delta clock from a tick interval in milliseconds.
    pub fn fixed(interval_ms: u64) -> Self {
        TickClock::Fixed { dt_secs: interval_ms as f64 / 1000.0 }
    }

    /// Wall-clock measuring clock.  The first delta (no previous tick to
    /// measure from) falls back to `DT_MIN_SECS`.
    pub fn measured() -> Self {
        TickClock::Measured { last: None }
    }

    /// The delta for the tick starting now, in seconds.
    pub fn delta_secs(&mut self) -> f64 {
        match self {
            TickClock::Fixed { dt_secs } => *dt_secs,
            TickClock::Measured { last } => {
                let now = Instant::now();
                let dt = match last {
                    Some(prev) => now.duration_since(*prev).as_secs_f64(),
                    None => DT_MIN_SECS,
                };
                *last = Some(now);
                dt.clamp(DT_MIN_SECS, DT_MAX_SECS)
            }
        }
    }
}
