//! Top-level simulation configuration.

/// Tunable knobs for the engine, with the documented defaults.
///
/// Typically constructed via `SimConfig::default()` and adjusted field-wise,
/// or deserialized from a JSON/TOML file by the application crate.
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    // ── Rerouting ─────────────────────────────────────────────────────────
    /// Relative path-cost increase that triggers a reroute.
    pub reroute_threshold: f64,

    /// How many upcoming path edges the reroute decision inspects.
    pub reroute_lookahead_edges: usize,

    /// Congestion probability at or above which a lookahead edge triggers
    /// a reroute.
    pub reroute_probability_threshold: f64,

    /// Minimum ticks between two reroutes of the same vehicle.
    pub reroute_cooldown_ticks: u64,

    // ── Traffic analysis ──────────────────────────────────────────────────
    /// Vehicle capacity of a reference-length (100-unit) edge.
    pub base_edge_capacity: f64,

    /// EMA factor for per-edge multiplier smoothing.
    pub multiplier_smoothing_alpha: f64,

    /// Ring-buffer size of historical multipliers per edge.
    pub history_window: usize,

    // ── Spawning ──────────────────────────────────────────────────────────
    /// When `true`, the engine tops the population up each tick.
    pub auto_spawn: bool,

    /// Active-vehicle count auto-spawn aims for.
    pub auto_spawn_target: usize,

    /// Maximum vehicles auto-spawned per tick.
    pub auto_spawn_batch: usize,

    /// Attempts at finding a feasible random (start, goal) pair before a
    /// spawn is skipped.
    pub spawn_retry_limit: usize,

    // ── Timing ────────────────────────────────────────────────────────────
    /// Fixed Δt for manual stepping, and the continuous runner's pacing
    /// interval.  Valid range 25–500 ms.
    pub tick_interval_ms: u64,

    // ── Incidents ─────────────────────────────────────────────────────────
    /// Accidents auto-clear this many ticks after creation.  `None` keeps
    /// them until explicitly resolved.
    pub accident_clear_ticks: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed:                          42,
            reroute_threshold:             0.20,
            reroute_lookahead_edges:       3,
            reroute_probability_threshold: 0.5,
            reroute_cooldown_ticks:        5,
            base_edge_capacity:            4.0,
            multiplier_smoothing_alpha:    0.3,
            history_window:                20,
            auto_spawn:                    false,
            auto_spawn_target:             75,
            auto_spawn_batch:              3,
            spawn_retry_limit:             10,
            tick_interval_ms:              100,
            accident_clear_ticks:          None,
        }
    }
}

impl SimConfig {
    /// Range check for every field with a bounded domain.
    pub fn validate(&self) -> Result<(), crate::CoreError> {
        if !(25..=500).contains(&self.tick_interval_ms) {
            return Err(crate::CoreError::Config(format!(
                "tick_interval_ms {} outside 25–500",
                self.tick_interval_ms
            )));
        }
        if self.base_edge_capacity <= 0.0 {
            return Err(crate::CoreError::Config(
                "base_edge_capacity must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.multiplier_smoothing_alpha) {
            return Err(crate::CoreError::Config(
                "multiplier_smoothing_alpha must be in [0, 1]".into(),
            ));
        }
        if self.history_window == 0 {
            return Err(crate::CoreError::Config(
                "history_window must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
