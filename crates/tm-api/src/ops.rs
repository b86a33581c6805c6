//! The boundary handle: every command and query, plus the continuous runner.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::info;

use tm_core::{IncidentId, TickClock, VehicleId, VehicleType};
use tm_graph::MapFile;
use tm_sim::{SimEngine, SpawnMix, TrafficStats};

use crate::error::{ApiError, ApiResult};
use crate::wire::{
    AccidentRecord, BlockageRecord, EdgeTrafficRecord, HealthRecord, MapListRecord,
    SimInfoRecord, StateRecord, VehicleRecord,
};

/// Default number of bottleneck edges in a congestion report.
const REPORT_TOP_K: usize = 10;

/// Thread-safe handle over one engine.
///
/// A single mutex serializes every operation, so each command or query
/// observes — and produces — a state at a tick boundary.  The continuous
/// runner is a plain thread that locks the engine once per tick; the stop
/// flag is observed between ticks, never mid-tick.
pub struct SimHandle {
    engine: Arc<Mutex<SimEngine>>,
    running: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SimHandle {
    pub fn new(engine: SimEngine) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            running: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimEngine> {
        // A panic mid-tick poisons the lock; the sim state is still the
        // last completed tick boundary, so recover and carry on.
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn health(&self) -> HealthRecord {
        HealthRecord { status: "ok" }
    }

    pub fn list_maps(&self) -> MapListRecord {
        let engine = self.lock();
        MapListRecord {
            maps: engine.registry().names().iter().map(|s| (*s).to_owned()).collect(),
            current: engine.map_name().to_owned(),
        }
    }

    /// The current map in its declarative file shape.
    pub fn get_map(&self) -> ApiResult<MapFile> {
        let engine = self.lock();
        let name = engine.map_name().to_owned();
        engine
            .registry()
            .map_file(&name)
            .map_err(|e| ApiError::not_found(e.to_string()))
    }

    pub fn get_state(&self) -> StateRecord {
        StateRecord::new(&self.lock())
    }

    pub fn list_vehicles(&self) -> Vec<VehicleRecord> {
        let engine = self.lock();
        engine
            .vehicles()
            .values()
            .map(|v| VehicleRecord::new(&engine, v))
            .collect()
    }

    pub fn get_vehicle(&self, id: &str) -> ApiResult<VehicleRecord> {
        let vid = parse_vehicle_id(id)?;
        let engine = self.lock();
        let vehicle = engine.vehicle(vid)?;
        Ok(VehicleRecord::new(&engine, vehicle))
    }

    pub fn get_traffic_statistics(&self) -> TrafficStats {
        self.lock().traffic_stats()
    }

    /// The top bottleneck edges, worst first.
    pub fn get_congestion_report(&self) -> Vec<EdgeTrafficRecord> {
        let engine = self.lock();
        engine
            .congestion_report(REPORT_TOP_K)
            .into_iter()
            .map(|(edge, flow)| EdgeTrafficRecord::new(engine.graph(), edge, flow))
            .collect()
    }

    /// Every edge's traffic state, in edge order.
    pub fn get_edge_traffic(&self) -> Vec<EdgeTrafficRecord> {
        let engine = self.lock();
        let graph = engine.graph();
        graph
            .edges()
            .map(|e| EdgeTrafficRecord::new(graph, e, engine.analyzer().flow(e)))
            .collect()
    }

    pub fn list_accidents(&self) -> Vec<AccidentRecord> {
        let engine = self.lock();
        engine
            .incidents()
            .accidents()
            .map(|a| AccidentRecord::new(engine.graph(), a))
            .collect()
    }

    pub fn list_blocked_roads(&self) -> Vec<BlockageRecord> {
        let engine = self.lock();
        engine
            .incidents()
            .blockages()
            .into_iter()
            .map(|b| BlockageRecord::new(engine.graph(), b))
            .collect()
    }

    pub fn get_simulation_info(&self) -> SimInfoRecord {
        let engine = self.lock();
        SimInfoRecord {
            map: engine.map_name().to_owned(),
            tick: engine.now().0,
            active_vehicles: engine.active_count(),
            node_count: engine.graph().node_count(),
            edge_count: engine.graph().edge_count(),
            continuous_running: self.running.load(Ordering::SeqCst),
            config: engine.config().clone(),
        }
    }

    // ── Commands ──────────────────────────────────────────────────────────

    /// Spawn one vehicle; returns its wire id.
    pub fn spawn_vehicle(
        &self,
        kind: Option<&str>,
        start: Option<&str>,
        goal: Option<&str>,
    ) -> ApiResult<String> {
        let kind = kind
            .map(|s| s.parse::<VehicleType>().map_err(|e| ApiError::validation(e.to_string())))
            .transpose()?;
        let id = self.lock().spawn_vehicle(kind, start, goal)?;
        Ok(id.wire())
    }

    /// Spawn up to `count` vehicles with the given type distribution;
    /// returns the wire ids of the feasible spawns.
    pub fn spawn_multiple(&self, count: usize, mix: SpawnMix) -> ApiResult<Vec<String>> {
        let ids = self.lock().spawn_many(count, mix)?;
        Ok(ids.into_iter().map(VehicleId::wire).collect())
    }

    /// Advance one tick and return the new state.
    pub fn tick(&self) -> ApiResult<StateRecord> {
        let mut engine = self.lock();
        engine.step()?;
        Ok(StateRecord::new(&engine))
    }

    pub fn remove_vehicle(&self, id: &str) -> ApiResult<()> {
        let vid = parse_vehicle_id(id)?;
        self.lock().remove_vehicle(vid)?;
        Ok(())
    }

    pub fn reset_simulation(&self) {
        self.lock().reset();
    }

    pub fn switch_map(&self, name: &str) -> ApiResult<()> {
        self.lock().switch_map(name)?;
        Ok(())
    }

    pub fn create_accident(
        &self,
        from: Option<&str>,
        to: Option<&str>,
        severity: &str,
    ) -> ApiResult<AccidentRecord> {
        let severity = severity
            .parse()
            .map_err(|e: tm_incident::IncidentError| ApiError::validation(e.to_string()))?;
        let mut engine = self.lock();
        let accident = engine.create_accident(from, to, severity)?;
        Ok(AccidentRecord::new(engine.graph(), &accident))
    }

    pub fn resolve_accident(&self, id: u32) -> ApiResult<()> {
        self.lock().resolve_accident(IncidentId(id))?;
        Ok(())
    }

    pub fn block_road(&self, from: &str, to: &str, reason: &str) -> ApiResult<BlockageRecord> {
        let mut engine = self.lock();
        let blockage = engine.block_road(from, to, reason)?;
        Ok(BlockageRecord::new(engine.graph(), &blockage))
    }

    pub fn unblock_road(&self, from: &str, to: &str) -> ApiResult<()> {
        self.lock().unblock_road(from, to)?;
        Ok(())
    }

    // ── Continuous running ────────────────────────────────────────────────

    /// Start ticking on a background thread every `interval_ms`.
    ///
    /// The engine switches to a measured clock so physics track real
    /// elapsed time (clamped) instead of the nominal interval.
    pub fn start_continuous(&self, interval_ms: u64) -> ApiResult<()> {
        if !(25..=500).contains(&interval_ms) {
            return Err(ApiError::validation(format!(
                "interval_ms {interval_ms} outside 25–500"
            )));
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ApiError {
                kind: crate::ErrorKind::Conflict,
                message: "continuous mode already running".into(),
            });
        }

        self.lock().set_clock(TickClock::measured());

        let engine = Arc::clone(&self.engine);
        let running = Arc::clone(&self.running);
        let handle = std::thread::spawn(move || {
            info!(interval_ms, "continuous loop started");
            while running.load(Ordering::SeqCst) {
                {
                    let mut engine =
                        engine.lock().unwrap_or_else(PoisonError::into_inner);
                    // A fatal tick error stops the loop rather than spinning.
                    if let Err(e) = engine.step() {
                        tracing::error!(error = %e, "tick aborted, stopping loop");
                        running.store(false, Ordering::SeqCst);
                        break;
                    }
                }
                std::thread::sleep(Duration::from_millis(interval_ms));
            }
            info!("continuous loop stopped");
        });
        *self.worker.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(())
    }

    /// Signal the runner to stop and wait for the in-flight tick to finish.
    /// Returns `false` if no runner was active.
    pub fn stop_continuous(&self) -> bool {
        let was_running = self.running.swap(false, Ordering::SeqCst);
        if let Some(handle) = self.worker.lock().unwrap_or_else(PoisonError::into_inner).take() {
            let _ = handle.join();
        }
        if was_running {
            // Manual stepping resumes on the fixed clock.
            let mut engine = self.lock();
            let interval = engine.config().tick_interval_ms;
            engine.set_clock(TickClock::fixed(interval));
        }
        was_running
    }
}

impl Drop for SimHandle {
    fn drop(&mut self) {
        self.stop_continuous();
    }
}

fn parse_vehicle_id(id: &str) -> ApiResult<VehicleId> {
    VehicleId::from_wire(id)
        .ok_or_else(|| ApiError::validation(format!("malformed vehicle id {id:?}")))
}
