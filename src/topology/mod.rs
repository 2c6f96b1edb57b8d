//! Immutable neighbor structure shared by every field on it.
//!
//! Lattices and graphs are flattened into one compressed adjacency layout
//! (`offsets`/`targets`), so the spread kernels never care which variant they
//! run on. Lattices additionally carry a unit vector per edge, which is what
//! makes directional gradients possible.

pub mod lattice;
pub mod small_world;

use std::collections::{HashMap, VecDeque};
use std::ops::Range;

use tracing::debug;

use crate::error::{FieldError, Result};

pub use lattice::Connectivity;

/// What a topology was built from. Lattice variants keep their extents so
/// coordinates can be mapped back to node indices.
#[derive(Debug, Clone, PartialEq)]
pub enum TopologyKind {
    Cubic {
        width: usize,
        height: usize,
        depth: usize,
        connectivity: Connectivity,
    },
    Hex {
        width: usize,
        height: usize,
    },
    SmallWorld {
        nodes: usize,
        degree: usize,
        rewire: f64,
    },
    Custom,
}

#[derive(Debug, Clone)]
pub struct Topology {
    kind: TopologyKind,
    nominal_degree: usize,
    offsets: Vec<usize>,
    targets: Vec<usize>,
    /// Unit vector from a node toward each neighbor, aligned with `targets`.
    directions: Option<Vec<[f64; 3]>>,
}

impl Topology {
    /// Build from explicit neighbor lists.
    ///
    /// The lists must describe a simple undirected graph: every index in
    /// range, no self-loops, no duplicates, and `j` in `lists[i]` exactly when
    /// `i` is in `lists[j]`. Diffusion only conserves energy on such graphs.
    pub fn from_adjacency(lists: Vec<Vec<usize>>, nominal_degree: usize) -> Result<Self> {
        if lists.is_empty() {
            return Err(FieldError::config("topology must contain at least one node"));
        }
        let count = lists.len();
        for (node, neighbors) in lists.iter().enumerate() {
            for (pos, &other) in neighbors.iter().enumerate() {
                if other >= count {
                    return Err(FieldError::config(format!(
                        "node {node} lists neighbor {other} outside 0..{count}"
                    )));
                }
                if other == node {
                    return Err(FieldError::config(format!("node {node} lists itself")));
                }
                if neighbors[..pos].contains(&other) {
                    return Err(FieldError::config(format!(
                        "node {node} lists neighbor {other} twice"
                    )));
                }
                if !lists[other].contains(&node) {
                    return Err(FieldError::config(format!(
                        "edge {node} -> {other} has no reverse edge"
                    )));
                }
            }
        }
        Ok(Self::from_parts(TopologyKind::Custom, nominal_degree, lists, None))
    }

    /// Assemble from lists already known to be symmetric.
    pub(crate) fn from_parts(
        kind: TopologyKind,
        nominal_degree: usize,
        lists: Vec<Vec<usize>>,
        directions: Option<Vec<Vec<[f64; 3]>>>,
    ) -> Self {
        let mut offsets = Vec::with_capacity(lists.len() + 1);
        offsets.push(0);
        let mut targets = Vec::with_capacity(lists.iter().map(Vec::len).sum());
        for neighbors in &lists {
            targets.extend_from_slice(neighbors);
            offsets.push(targets.len());
        }
        let directions = directions.map(|per_node| per_node.into_iter().flatten().collect());

        debug!(
            nodes = lists.len(),
            edges = targets.len() / 2,
            nominal_degree,
            ?kind,
            "topology built"
        );

        Topology {
            kind,
            nominal_degree,
            offsets,
            targets,
            directions,
        }
    }

    pub fn kind(&self) -> &TopologyKind {
        &self.kind
    }

    pub fn node_count(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Undirected edge count.
    pub fn edge_count(&self) -> usize {
        self.targets.len() / 2
    }

    /// Nominal degree `k`, used for the default spread fraction `1/k`.
    pub fn neighbor_count(&self) -> usize {
        self.nominal_degree
    }

    pub fn all_nodes(&self) -> Range<usize> {
        0..self.node_count()
    }

    /// Neighbors of `node`. Boundary and low-degree nodes return fewer than `k`.
    ///
    /// # Panics
    /// Panics if `node` is out of range.
    #[inline]
    pub fn neighbors(&self, node: usize) -> &[usize] {
        &self.targets[self.offsets[node]..self.offsets[node + 1]]
    }

    /// Actual neighbor count of `node`.
    #[inline]
    pub fn degree(&self, node: usize) -> usize {
        self.offsets[node + 1] - self.offsets[node]
    }

    pub fn contains(&self, node: usize) -> bool {
        node < self.node_count()
    }

    pub fn is_embedded(&self) -> bool {
        self.directions.is_some()
    }

    /// Unit vectors toward each neighbor of `node`, aligned with `neighbors(node)`.
    pub fn directions(&self, node: usize) -> Option<&[[f64; 3]]> {
        self.directions
            .as_deref()
            .map(|dirs| &dirs[self.offsets[node]..self.offsets[node + 1]])
    }

    pub(crate) fn check_node(&self, node: usize) -> Result<()> {
        if self.contains(node) {
            Ok(())
        } else {
            Err(FieldError::NodeOutOfRange {
                node,
                count: self.node_count(),
            })
        }
    }

    /// Shortest-path hop count between two nodes, or `None` if they are not connected.
    pub fn hop_distance(&self, from: usize, to: usize) -> Result<Option<usize>> {
        self.check_node(from)?;
        self.check_node(to)?;
        if from == to {
            return Ok(Some(0));
        }

        let mut dist = vec![usize::MAX; self.node_count()];
        let mut queue = VecDeque::new();
        dist[from] = 0;
        queue.push_back(from);

        while let Some(node) = queue.pop_front() {
            let next = dist[node] + 1;
            for &other in self.neighbors(node) {
                if dist[other] != usize::MAX {
                    continue;
                }
                if other == to {
                    return Ok(Some(next));
                }
                dist[other] = next;
                queue.push_back(other);
            }
        }
        Ok(None)
    }

    /// Hop distance from `from` to every node. Unreachable nodes are `None`.
    pub fn distances_from(&self, from: usize) -> Result<Vec<Option<usize>>> {
        self.check_node(from)?;
        let mut dist = vec![None; self.node_count()];
        let mut queue = VecDeque::new();
        dist[from] = Some(0);
        queue.push_back(from);

        while let Some(node) = queue.pop_front() {
            let next = dist[node].map(|d| d + 1);
            for &other in self.neighbors(node) {
                if dist[other].is_none() {
                    dist[other] = next;
                    queue.push_back(other);
                }
            }
        }
        Ok(dist)
    }

    /// Every node within `radius` hops of `from`, as `(node, hops)` in BFS order.
    pub fn nodes_within(&self, from: usize, radius: usize) -> Result<Vec<(usize, usize)>> {
        self.check_node(from)?;
        let mut seen = HashMap::from([(from, 0usize)]);
        let mut found = vec![(from, 0)];
        let mut queue = VecDeque::from([from]);

        while let Some(node) = queue.pop_front() {
            let hops = seen[&node];
            if hops == radius {
                continue;
            }
            for &other in self.neighbors(node) {
                if !seen.contains_key(&other) {
                    seen.insert(other, hops + 1);
                    found.push((other, hops + 1));
                    queue.push_back(other);
                }
            }
        }
        Ok(found)
    }
}
