//! Simulation observer trait for progress reporting.

use tm_core::Tick;

/// Callbacks invoked by [`SimEngine::run_ticks`][crate::SimEngine::run_ticks]
/// at tick boundaries.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example — progress printer
///
/// ```rust,ignore
/// struct Progress;
///
/// impl SimObserver for Progress {
///     fn on_tick_end(&mut self, tick: Tick, active: usize, arrived: usize) {
///         if tick.0 % 50 == 0 {
///             println!("{tick}: {active} active, {arrived} arrived so far");
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called before any phase of the tick runs.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called after the tick completes.  `active` is the number of
    /// non-arrived vehicles; `arrived` the number that reached their goal
    /// during this tick.
    fn on_tick_end(&mut self, _tick: Tick, _active: usize, _arrived: usize) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
