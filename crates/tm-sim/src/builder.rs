//! Fluent builder for constructing a [`SimEngine`].

use tm_core::SimConfig;
use tm_graph::MapRegistry;

use crate::engine::SimEngine;
use crate::error::{SimError, SimResult};
use crate::spawn::SpawnMix;

/// Builder for [`SimEngine`].
///
/// # Optional inputs (have defaults)
///
/// | Method          | Default                                |
/// |-----------------|----------------------------------------|
/// | `.map(name)`    | `MapRegistry::default_map()` (simple)  |
/// | `.registry(r)`  | the built-in registry                  |
/// | `.spawn_mix(m)` | `SpawnMix::default()`                  |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(SimConfig::default())
///     .map("city")
///     .build()?;
/// ```
pub struct SimBuilder {
    config: SimConfig,
    map: Option<String>,
    registry: Option<MapRegistry>,
    spawn_mix: SpawnMix,
}

impl SimBuilder {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            map: None,
            registry: None,
            spawn_mix: SpawnMix::default(),
        }
    }

    /// Start on the named map instead of the registry default.
    pub fn map(mut self, name: impl Into<String>) -> Self {
        self.map = Some(name.into());
        self
    }

    /// Supply a registry with application-specific maps.
    pub fn registry(mut self, registry: MapRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// The type distribution used by auto-spawn and type-less spawns.
    pub fn spawn_mix(mut self, mix: SpawnMix) -> Self {
        self.spawn_mix = mix;
        self
    }

    /// Validate the configuration, load the starting map, and return a
    /// ready-to-run engine at tick 0.
    pub fn build(self) -> SimResult<SimEngine> {
        self.config
            .validate()
            .map_err(|e| SimError::Validation(e.to_string()))?;
        let mix = self.spawn_mix.validated()?;

        let registry = self.registry.unwrap_or_default();
        let map_name = self
            .map
            .unwrap_or_else(|| MapRegistry::default_map().to_owned());
        if !registry.contains(&map_name) {
            return Err(SimError::UnknownMap(map_name));
        }
        let graph = registry.load(&map_name)?;

        Ok(SimEngine::from_parts(self.config, registry, map_name, graph, mix))
    }
}
