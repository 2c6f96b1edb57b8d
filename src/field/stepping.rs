//! Synchronous spread kernels.
//!
//! Every pass reads only the generation-N snapshot and writes into a separate
//! buffer, so node iteration order (and thread count) cannot change the
//! result. Per-node gather sums run in fixed neighbor order, which keeps the
//! output bit-identical between sequential and parallel runs.
//!
//! Conservation: node `i` gives away exactly `outflow(i)`, and by symmetry of
//! the adjacency every share it sends is gathered by exactly one neighbor.

use rayon::prelude::*;

use crate::topology::Topology;

/// Below this many nodes per task rayon work-splitting costs more than it saves.
const MIN_CHUNK: usize = 4096;

/// Outflow of a node holding `gamma`: `alpha / (1 + g * gamma) * gamma`.
/// `g = 0` gives the linear rule.
#[inline]
pub fn outflow(gamma: f64, alpha: f64, g: f64) -> f64 {
    alpha / (1.0 + g * gamma) * gamma
}

/// Even split: each neighbor of `i` receives `outflow(i) / degree(i)`.
///
/// `shares` and `next` are scratch buffers of the same length as `gamma`; on
/// return `next` holds the new field.
pub fn spread_even(
    topology: &Topology,
    gamma: &[f64],
    shares: &mut [f64],
    next: &mut [f64],
    alpha: f64,
    g: f64,
) {
    shares
        .par_iter_mut()
        .with_min_len(MIN_CHUNK)
        .enumerate()
        .for_each(|(i, share)| {
            let degree = topology.degree(i);
            *share = if degree == 0 {
                0.0
            } else {
                outflow(gamma[i], alpha, g) / degree as f64
            };
        });

    let shares = &*shares;
    next.par_iter_mut()
        .with_min_len(MIN_CHUNK)
        .enumerate()
        .for_each(|(i, slot)| {
            let neighbors = topology.neighbors(i);
            // Isolated nodes keep everything
            let kept = if neighbors.is_empty() {
                gamma[i]
            } else {
                gamma[i] - outflow(gamma[i], alpha, g)
            };
            let incoming: f64 = neighbors.iter().map(|&j| shares[j]).sum();
            *slot = kept + incoming;
        });
}

/// Gradient-biased split: neighbor `j` of `i` receives
/// `outflow(i) * w(j) / sum(w(k) for k in neighbors(i))` with
/// `w(j) = 1 + g_attract * gamma[j]`.
///
/// With `c(i) = outflow(i) / W(i)` the receiving side reduces to
/// `w(j) * sum(c(i) for i in neighbors(j))`, so both passes stay O(edges).
pub fn spread_weighted(
    topology: &Topology,
    gamma: &[f64],
    coefficients: &mut [f64],
    next: &mut [f64],
    alpha: f64,
    g: f64,
    g_attract: f64,
) {
    let weight = |j: usize| 1.0 + g_attract * gamma[j];

    coefficients
        .par_iter_mut()
        .with_min_len(MIN_CHUNK)
        .enumerate()
        .for_each(|(i, coef)| {
            let neighbors = topology.neighbors(i);
            *coef = if neighbors.is_empty() {
                0.0
            } else {
                let total_weight: f64 = neighbors.iter().map(|&k| weight(k)).sum();
                outflow(gamma[i], alpha, g) / total_weight
            };
        });

    let coefficients = &*coefficients;
    next.par_iter_mut()
        .with_min_len(MIN_CHUNK)
        .enumerate()
        .for_each(|(j, slot)| {
            let neighbors = topology.neighbors(j);
            let kept = if neighbors.is_empty() {
                gamma[j]
            } else {
                gamma[j] - outflow(gamma[j], alpha, g)
            };
            let gathered: f64 = neighbors.iter().map(|&i| coefficients[i]).sum();
            *slot = kept + weight(j) * gathered;
        });
}
