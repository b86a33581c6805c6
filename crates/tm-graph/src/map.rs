//! Declarative JSON map format and the named-map registry.
//!
//! # Format
//!
//! ```json
//! {
//!   "nodes": { "A": [0, 0], "B": [120, 40] },
//!   "edges": [
//!     { "from": "A", "to": "B", "distance": 126.0,
//!       "allowed": ["car", "bicycle"], "one_way": false }
//!   ]
//! }
//! ```
//!
//! `one_way` defaults to `false`; a two-way entry expands into both directed
//! edges at build time.  Two built-in maps ship embedded in the binary
//! (`simple`, `city`) so the engine runs without any file on disk; maps on
//! disk are registered by path.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use tm_core::VehicleType;

use crate::error::{GraphError, GraphResult};
use crate::graph::{RoadGraph, RoadGraphBuilder};

// ── Map file ──────────────────────────────────────────────────────────────────

/// One edge entry in a map file.
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct MapEdge {
    pub from: String,
    pub to: String,
    pub distance: f64,
    pub allowed: Vec<VehicleType>,
    #[serde(default)]
    pub one_way: bool,
}

/// A parsed map file.  `nodes` is a `BTreeMap` so iteration order (and
/// therefore error reporting) is deterministic.
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct MapFile {
    pub nodes: BTreeMap<String, [f64; 2]>,
    pub edges: Vec<MapEdge>,
}

impl MapFile {
    /// Parse a map from any reader.
    pub fn from_reader(reader: impl Read) -> GraphResult<MapFile> {
        serde_json::from_reader(reader).map_err(GraphError::Parse)
    }

    /// Parse a map from an in-memory JSON string.
    pub fn from_json(json: &str) -> GraphResult<MapFile> {
        serde_json::from_str(json).map_err(GraphError::Parse)
    }

    /// Build the road graph this map describes.
    pub fn into_graph(self) -> GraphResult<RoadGraph> {
        let mut builder = RoadGraphBuilder::new();
        for (name, [x, y]) in &self.nodes {
            builder.add_node(name.clone(), tm_core::Point::new(*x, *y));
        }
        for edge in self.edges {
            let modes = edge.allowed.iter().copied().collect();
            builder.add_edge(edge.from, edge.to, edge.distance, modes, edge.one_way);
        }
        builder.build()
    }
}

// ── Built-in maps ─────────────────────────────────────────────────────────────

/// Four-node diamond: two parallel routes A→D, all modes, two-way.
const SIMPLE_MAP_JSON: &str = r#"{
  "nodes": {
    "A": [0, 0],
    "B": [150, 80],
    "C": [150, -80],
    "D": [300, 0]
  },
  "edges": [
    { "from": "A", "to": "B", "distance": 170, "allowed": ["car", "bicycle", "pedestrian"] },
    { "from": "B", "to": "D", "distance": 170, "allowed": ["car", "bicycle", "pedestrian"] },
    { "from": "A", "to": "C", "distance": 170, "allowed": ["car", "bicycle", "pedestrian"] },
    { "from": "C", "to": "D", "distance": 170, "allowed": ["car", "bicycle", "pedestrian"] }
  ]
}"#;

/// Nine-intersection downtown grid with a one-way ring and a pedestrian mall.
const CITY_MAP_JSON: &str = r#"{
  "nodes": {
    "NW": [0, 200],   "N": [200, 200],  "NE": [400, 200],
    "W":  [0, 0],     "CTR": [200, 0],  "E":  [400, 0],
    "SW": [0, -200],  "S": [200, -200], "SE": [400, -200]
  },
  "edges": [
    { "from": "NW", "to": "N",   "distance": 200, "allowed": ["car", "bicycle"] },
    { "from": "N",  "to": "NE",  "distance": 200, "allowed": ["car", "bicycle"] },
    { "from": "NE", "to": "E",   "distance": 200, "allowed": ["car", "bicycle"], "one_way": true },
    { "from": "E",  "to": "SE",  "distance": 200, "allowed": ["car", "bicycle"], "one_way": true },
    { "from": "SE", "to": "S",   "distance": 200, "allowed": ["car", "bicycle"] },
    { "from": "S",  "to": "SW",  "distance": 200, "allowed": ["car", "bicycle"] },
    { "from": "SW", "to": "W",   "distance": 200, "allowed": ["car", "bicycle"], "one_way": true },
    { "from": "W",  "to": "NW",  "distance": 200, "allowed": ["car", "bicycle"], "one_way": true },
    { "from": "W",  "to": "CTR", "distance": 200, "allowed": ["car", "bicycle", "pedestrian"] },
    { "from": "CTR","to": "E",   "distance": 200, "allowed": ["car", "bicycle", "pedestrian"] },
    { "from": "N",  "to": "CTR", "distance": 200, "allowed": ["pedestrian"] },
    { "from": "CTR","to": "S",   "distance": 200, "allowed": ["car", "bicycle", "pedestrian"] }
  ]
}"#;

// ── MapRegistry ───────────────────────────────────────────────────────────────

enum MapSource {
    Embedded(&'static str),
    File(PathBuf),
}

/// Named map catalogue: embedded built-ins plus maps registered by path.
pub struct MapRegistry {
    entries: Vec<(String, MapSource)>,
}

impl MapRegistry {
    /// The registry with the two embedded maps (`simple`, `city`).
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                ("simple".to_owned(), MapSource::Embedded(SIMPLE_MAP_JSON)),
                ("city".to_owned(), MapSource::Embedded(CITY_MAP_JSON))
            ],
        }
    }

    /// The name every simulation starts on.
    pub fn default_map() -> &'static str {
        "simple"
    }

    /// Register (or replace) a map backed by a JSON file on disk.
    pub fn register_file(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        let name = name.into();
        self.entries.retain(|(n, _)| *n != name);
        self.entries.push((name, MapSource::File(path.into())));
    }

    /// Register (or replace) a map backed by an in-memory JSON string.
    pub fn register_json(&mut self, name: impl Into<String>, json: &'static str) {
        let name = name.into();
        self.entries.retain(|(n, _)| *n != name);
        self.entries.push((name, MapSource::Embedded(json)));
    }

    /// All registered map names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Parse the named map.  Kept separate from [`Self::load`] so callers
    /// that need the raw file shape (the `get_map` query) can have it.
    pub fn map_file(&self, name: &str) -> GraphResult<MapFile> {
        let source = self
            .entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
            .ok_or_else(|| GraphError::UnknownMap(name.to_owned()))?;
        match source {
            MapSource::Embedded(json) => MapFile::from_json(json),
            MapSource::File(path) => {
                let file = File::open(path.as_path()).map_err(GraphError::Io)?;
                MapFile::from_reader(BufReader::new(file))
            }
        }
    }

    /// Load and build the named map's road graph.
    pub fn load(&self, name: &str) -> GraphResult<RoadGraph> {
        self.map_file(name)?.into_graph()
    }
}

impl Default for MapRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Parse and build a map straight from a path, without a registry.
pub fn load_map_path(path: impl AsRef<Path>) -> GraphResult<RoadGraph> {
    let file = File::open(path.as_ref()).map_err(GraphError::Io)?;
    MapFile::from_reader(BufReader::new(file))?.into_graph()
}
