//! Road network representation and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format for outgoing edges.
//! Given a `NodeId n`, its outgoing edges occupy the slice:
//!
//! ```text
//! edge_from[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! All edge arrays (`edge_from`, `edge_to`, `edge_length`, `edge_modes`,
//! `edge_curve`) are sorted by source node and indexed by `EdgeId`, so
//! iterating a node's outgoing edges is a contiguous memory scan — ideal
//! for the router's inner loop.
//!
//! # Name interning
//!
//! Map files address nodes by string name.  The builder interns names in
//! **lexicographic order**, so `NodeId` order equals name order and the
//! router's id tie-break is the name tie-break.  A `(from, to)` pair index
//! gives O(1) directed-edge lookup for occupancy and incident bookkeeping.

use rustc_hash::FxHashMap;

use tm_core::{CurveGeometry, EdgeId, ModeSet, NodeId, Point, VehicleType};

use crate::error::{GraphError, GraphResult};

// ── RoadGraph ─────────────────────────────────────────────────────────────────

/// Directed road graph in CSR format plus name and pair indices.
///
/// Edge-array fields are `pub` for direct indexed access on hot paths.  Do
/// not construct directly; use [`RoadGraphBuilder`].
pub struct RoadGraph {
    // ── Node data (indexed by NodeId, lexicographic name order) ───────────
    /// External name of each node.
    pub node_name: Vec<String>,

    /// Planar position of each node.
    pub node_pos: Vec<Point>,

    // ── CSR edge adjacency ────────────────────────────────────────────────
    /// CSR row pointer.  Outgoing edges of node `n` are at EdgeIds
    /// `node_out_start[n] .. node_out_start[n+1]`.  Length = node count + 1.
    pub node_out_start: Vec<u32>,

    // ── Edge data (indexed by EdgeId = position in sorted order) ──────────
    /// Source node of each directed edge.
    pub edge_from: Vec<NodeId>,

    /// Destination node of each directed edge.
    pub edge_to: Vec<NodeId>,

    /// Base length `L₀` in map units.  Always > 0.
    pub edge_length: Vec<f64>,

    /// Modes allowed on each edge.
    pub edge_modes: Vec<ModeSet>,

    /// Deterministic Bézier curve (control point + true curve length).
    pub edge_curve: Vec<CurveGeometry>,

    // ── Lookup indices ────────────────────────────────────────────────────
    name_index: FxHashMap<String, NodeId>,
    pair_index: FxHashMap<(NodeId, NodeId), EdgeId>,
}

impl RoadGraph {
    /// An empty graph with no nodes or edges.  Any routing request against
    /// it fails with `NoPath`.
    pub fn empty() -> Self {
        RoadGraphBuilder::new().build().expect("empty graph is always valid")
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    /// All node ids, ascending (= lexicographic name order).
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.node_pos.len() as u32).map(NodeId)
    }

    /// All directed edge ids, ascending CSR order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        (0..self.edge_to.len() as u32).map(EdgeId)
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// Iterator over the `EdgeId`s of all outgoing edges from `node`.
    ///
    /// This is a contiguous index range — no heap allocation.
    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(|i| EdgeId(i as u32))
    }

    /// Out-degree of `node`.
    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        end - start
    }

    /// Neighbors of `node` reachable by `mode`, with the connecting edge.
    pub fn neighbors(
        &self,
        node: NodeId,
        mode: VehicleType,
    ) -> impl Iterator<Item = (EdgeId, NodeId)> + '_ {
        self.out_edges(node).filter_map(move |e| {
            self.edge_modes[e.index()]
                .allows(mode)
                .then(|| (e, self.edge_to[e.index()]))
        })
    }

    // ── Lookups ───────────────────────────────────────────────────────────

    /// Resolve a node name to its interned id.
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.name_index.get(name).copied()
    }

    /// The external name of `node`.
    #[inline]
    pub fn node_name(&self, node: NodeId) -> &str {
        &self.node_name[node.index()]
    }

    #[inline]
    pub fn node_position(&self, node: NodeId) -> Point {
        self.node_pos[node.index()]
    }

    /// O(1) lookup of the directed edge `from → to`, if it exists.
    #[inline]
    pub fn edge_between(&self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        self.pair_index.get(&(from, to)).copied()
    }

    /// Endpoints `(from, to)` of `edge`.
    #[inline]
    pub fn endpoints(&self, edge: EdgeId) -> (NodeId, NodeId) {
        (self.edge_from[edge.index()], self.edge_to[edge.index()])
    }

    /// True curve length of `edge` (≥ base length's chord).
    #[inline]
    pub fn curve_length(&self, edge: EdgeId) -> f64 {
        self.edge_curve[edge.index()].curve_length
    }

    /// `true` if no reverse directed edge exists.
    pub fn is_one_way(&self, edge: EdgeId) -> bool {
        let (from, to) = self.endpoints(edge);
        self.edge_between(to, from).is_none()
    }

    /// World position of a point `t ∈ [0, 1]` along `edge`'s curve.
    pub fn position_along(&self, edge: EdgeId, t: f64) -> Point {
        let (from, to) = self.endpoints(edge);
        self.edge_curve[edge.index()].point_at(
            self.node_pos[from.index()],
            self.node_pos[to.index()],
            t,
        )
    }
}

// ── RoadGraphBuilder ──────────────────────────────────────────────────────────

/// Construct a [`RoadGraph`] incrementally, then call [`build`](Self::build).
///
/// Nodes and edges are addressed by name and may arrive in any order.
/// `build()` interns names lexicographically, expands two-way edges into
/// directed pairs, sorts edges by source node into CSR order, and computes
/// the deterministic curve geometry.
pub struct RoadGraphBuilder {
    nodes: Vec<(String, Point)>,
    edges: Vec<RawEdge>,
}

struct RawEdge {
    from:    String,
    to:      String,
    length:  f64,
    modes:   ModeSet,
    one_way: bool,
}

impl RoadGraphBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), edges: Vec::new() }
    }

    /// Add a named node.  Duplicate names are rejected at `build()`.
    pub fn add_node(&mut self, name: impl Into<String>, pos: Point) -> &mut Self {
        self.nodes.push((name.into(), pos));
        self
    }

    /// Add an edge between two named nodes.
    ///
    /// With `one_way = false` the reverse directed edge is created with
    /// identical length and modes (its curve bows independently).
    pub fn add_edge(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        length: f64,
        modes: ModeSet,
        one_way: bool,
    ) -> &mut Self {
        self.edges.push(RawEdge {
            from: from.into(),
            to: to.into(),
            length,
            modes,
            one_way,
        });
        self
    }

    /// Convenience for tests and demos: a two-way car-only road.
    pub fn add_road(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        length: f64,
    ) -> &mut Self {
        self.add_edge(from, to, length, ModeSet::single(VehicleType::Car), false)
    }

    /// Consume the builder and produce a [`RoadGraph`].
    ///
    /// # Errors
    ///
    /// - [`GraphError::DuplicateNode`] for a repeated node name.
    /// - [`GraphError::UnknownNode`] for an edge endpoint never added.
    /// - [`GraphError::NonPositiveLength`] for `length ≤ 0`.
    pub fn build(self) -> GraphResult<RoadGraph> {
        // ── Intern node names in lexicographic order ──────────────────────
        let mut nodes = self.nodes;
        nodes.sort_by(|a, b| a.0.cmp(&b.0));

        let mut name_index = FxHashMap::default();
        for (i, (name, _)) in nodes.iter().enumerate() {
            if name_index.insert(name.clone(), NodeId(i as u32)).is_some() {
                return Err(GraphError::DuplicateNode(name.clone()));
            }
        }

        let node_name: Vec<String> = nodes.iter().map(|(n, _)| n.clone()).collect();
        let node_pos: Vec<Point> = nodes.iter().map(|&(_, p)| p).collect();
        let node_count = node_pos.len();

        // ── Expand two-way edges and resolve endpoints ────────────────────
        struct DirectedEdge {
            from:   NodeId,
            to:     NodeId,
            length: f64,
            modes:  ModeSet,
        }

        let mut directed = Vec::with_capacity(self.edges.len() * 2);
        for raw in &self.edges {
            if raw.length <= 0.0 {
                return Err(GraphError::NonPositiveLength {
                    from: raw.from.clone(),
                    to:   raw.to.clone(),
                });
            }
            let from = *name_index
                .get(&raw.from)
                .ok_or_else(|| GraphError::UnknownNode(raw.from.clone()))?;
            let to = *name_index
                .get(&raw.to)
                .ok_or_else(|| GraphError::UnknownNode(raw.to.clone()))?;

            directed.push(DirectedEdge { from, to, length: raw.length, modes: raw.modes });
            if !raw.one_way {
                directed.push(DirectedEdge {
                    from:   to,
                    to:     from,
                    length: raw.length,
                    modes:  raw.modes,
                });
            }
        }

        // Sort by (from, to) for CSR construction and stable EdgeId order.
        directed.sort_by_key(|e| (e.from, e.to));

        // ── Build edge arrays ─────────────────────────────────────────────
        let edge_from: Vec<NodeId> = directed.iter().map(|e| e.from).collect();
        let edge_to:   Vec<NodeId> = directed.iter().map(|e| e.to).collect();
        let edge_length: Vec<f64>  = directed.iter().map(|e| e.length).collect();
        let edge_modes: Vec<ModeSet> = directed.iter().map(|e| e.modes).collect();

        let edge_curve: Vec<CurveGeometry> = directed
            .iter()
            .map(|e| {
                CurveGeometry::for_edge(
                    &node_name[e.from.index()],
                    &node_name[e.to.index()],
                    node_pos[e.from.index()],
                    node_pos[e.to.index()],
                )
            })
            .collect();

        // ── CSR row pointer ───────────────────────────────────────────────
        let mut node_out_start = vec![0u32; node_count + 1];
        for e in &directed {
            node_out_start[e.from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, directed.len());

        // ── Pair index ────────────────────────────────────────────────────
        let mut pair_index = FxHashMap::default();
        for (i, e) in directed.iter().enumerate() {
            if pair_index.insert((e.from, e.to), EdgeId(i as u32)).is_some() {
                return Err(GraphError::DuplicateEdge {
                    from: node_name[e.from.index()].clone(),
                    to:   node_name[e.to.index()].clone(),
                });
            }
        }

        Ok(RoadGraph {
            node_name,
            node_pos,
            node_out_start,
            edge_from,
            edge_to,
            edge_length,
            edge_modes,
            edge_curve,
            name_index,
            pair_index,
        })
    }
}

impl Default for RoadGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
