//! Watts–Strogatz small-world graphs.
//!
//! Start from a ring where each node links to its `k/2` nearest neighbors on
//! either side, then rewire each ring edge with probability `p` to a uniformly
//! chosen node. Randomness comes only from the caller's RNG, so a seeded
//! generator reproduces the same graph.

use std::collections::BTreeSet;

use rand::Rng;

use crate::error::{FieldError, Result};

use super::{Topology, TopologyKind};

impl Topology {
    /// Small-world graph with `nodes` nodes, ring degree `degree` (even), and
    /// rewiring probability `rewire`.
    pub fn small_world<R: Rng + ?Sized>(
        nodes: usize,
        degree: usize,
        rewire: f64,
        rng: &mut R,
    ) -> Result<Self> {
        if degree < 2 || degree % 2 != 0 {
            return Err(FieldError::config(format!(
                "small-world degree must be even and >= 2, got {degree}"
            )));
        }
        if nodes <= degree {
            return Err(FieldError::config(format!(
                "small-world graph needs more than {degree} nodes, got {nodes}"
            )));
        }
        if !(0.0..=1.0).contains(&rewire) {
            return Err(FieldError::config(format!(
                "rewire probability must lie in [0, 1], got {rewire}"
            )));
        }

        let half = degree / 2;
        let mut adj: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); nodes];
        for i in 0..nodes {
            for j in 1..=half {
                let other = (i + j) % nodes;
                adj[i].insert(other);
                adj[other].insert(i);
            }
        }

        // Each node keeps the origin end of its own ring edges, so no node
        // drops below `half` neighbors.
        for j in 1..=half {
            for i in 0..nodes {
                if !rng.random_bool(rewire) {
                    continue;
                }
                let old = (i + j) % nodes;
                if !adj[i].contains(&old) || adj[i].len() >= nodes - 1 {
                    continue;
                }
                let target = loop {
                    let candidate = rng.random_range(0..nodes);
                    if candidate != i && !adj[i].contains(&candidate) {
                        break candidate;
                    }
                };
                adj[i].remove(&old);
                adj[old].remove(&i);
                adj[i].insert(target);
                adj[target].insert(i);
            }
        }

        let lists = adj.into_iter().map(|set| set.into_iter().collect()).collect();
        Ok(Self::from_parts(
            TopologyKind::SmallWorld {
                nodes,
                degree,
                rewire,
            },
            degree,
            lists,
            None,
        ))
    }
}
