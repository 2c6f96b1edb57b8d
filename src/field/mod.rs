//! The gamma field: one non-negative scalar per topology node.
//!
//! The field owns its value buffer plus two scratch buffers of the same size,
//! so a spread tick allocates nothing. Spread only redistributes; the total
//! changes through deposit, withdraw, decay, and direct seeding, each of which
//! is recorded in the [`EnergyLedger`].

pub mod ledger;
pub mod peaks;
pub mod region;
pub mod stepping;

use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, trace};

use crate::config::{validate_decay, FieldConfig, SpreadRule};
use crate::error::{FieldError, Result};
use crate::topology::Topology;

pub use ledger::{EnergyLedger, TickRecord};
pub use peaks::{Gradient, Peak, PeakSeparation, PeakTracker};

#[derive(Debug)]
pub struct GammaField {
    topology: Arc<Topology>,
    config: FieldConfig,
    alpha: f64,
    gamma: Vec<f64>,
    /// Per-node outflow shares (even split) or coefficients (weighted split).
    shares: Vec<f64>,
    next: Vec<f64>,
    generation: u64,
    ledger: EnergyLedger,
    pool: Option<ThreadPool>,
}

/// Run `op` inside the field's own pool, or on the global pool when it has none.
fn run_in<F>(pool: Option<&ThreadPool>, op: F)
where
    F: FnOnce() + Send,
{
    match pool {
        Some(pool) => pool.install(op),
        None => op(),
    }
}

pub(crate) fn check_amount(node: usize, amount: f64) -> Result<()> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(())
    } else {
        Err(FieldError::NegativeAmount { node, amount })
    }
}

impl GammaField {
    /// Zero-initialized field on `topology`.
    ///
    /// Fails with [`FieldError::Configuration`] when any parameter is out of
    /// range, and with [`FieldError::ThreadPool`] when a dedicated pool was
    /// requested and could not be built.
    pub fn new(topology: impl Into<Arc<Topology>>, config: FieldConfig) -> Result<Self> {
        let topology = topology.into();
        let alpha = config.resolve_alpha(topology.neighbor_count())?;
        let pool = if config.threads > 0 {
            Some(ThreadPoolBuilder::new().num_threads(config.threads).build()?)
        } else {
            None
        };

        let size = topology.node_count();
        debug!(
            nodes = size,
            nominal_degree = topology.neighbor_count(),
            alpha,
            self_gravity = config.self_gravity,
            attraction = config.attraction,
            rule = ?config.rule,
            threads = config.threads,
            "gamma field created"
        );

        Ok(GammaField {
            ledger: EnergyLedger::new(config.record_history),
            topology,
            config,
            alpha,
            gamma: vec![0.0; size],
            shares: vec![0.0; size],
            next: vec![0.0; size],
            generation: 0,
            pool,
        })
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Shared handle to the topology, for building sibling fields on it.
    pub fn shared_topology(&self) -> Arc<Topology> {
        Arc::clone(&self.topology)
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// Resolved spread fraction.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Number of spread ticks applied since creation or the last reset.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn ledger(&self) -> &EnergyLedger {
        &self.ledger
    }

    pub fn values(&self) -> &[f64] {
        &self.gamma
    }

    /// One synchronous redistribution tick with an even split over each
    /// node's actual neighbors.
    pub fn spread(&mut self) {
        let g = self.config.retention();
        let alpha = self.alpha;
        let topology = &*self.topology;
        let gamma = &self.gamma;
        let shares = &mut self.shares;
        let next = &mut self.next;
        run_in(self.pool.as_ref(), || {
            stepping::spread_even(topology, gamma, shares, next, alpha, g)
        });
        self.finish_tick();
    }

    /// One synchronous redistribution tick biased toward neighbors that
    /// already hold more energy.
    pub fn spread_attracting(&mut self) {
        let g = self.config.retention();
        let g_attract = self.config.attraction;
        let alpha = self.alpha;
        let topology = &*self.topology;
        let gamma = &self.gamma;
        let shares = &mut self.shares;
        let next = &mut self.next;
        run_in(self.pool.as_ref(), || {
            stepping::spread_weighted(topology, gamma, shares, next, alpha, g, g_attract)
        });
        self.finish_tick();
    }

    fn finish_tick(&mut self) {
        std::mem::swap(&mut self.gamma, &mut self.next);
        self.generation += 1;
        self.ledger.close_tick(self.generation);
        trace!(generation = self.generation, total = self.total(), "spread");
    }

    /// Full tick as configured: spread by the configured rule, then decay
    /// when the configured factor is below 1.
    pub fn step(&mut self) {
        match self.config.rule {
            SpreadRule::Linear | SpreadRule::SelfGravitating => self.spread(),
            SpreadRule::Attracting => self.spread_attracting(),
        }
        if self.config.decay < 1.0 {
            self.apply_decay(self.config.decay);
        }
    }

    /// Multiply every node by `factor` in `(0, 1]`. Returns the energy removed.
    pub fn decay(&mut self, factor: f64) -> Result<f64> {
        validate_decay(factor)?;
        Ok(self.apply_decay(factor))
    }

    fn apply_decay(&mut self, factor: f64) -> f64 {
        let removed: f64 = self
            .gamma
            .iter_mut()
            .map(|value| {
                let before = *value;
                *value *= factor;
                before - *value
            })
            .sum();
        self.ledger.record_decay(removed);
        trace!(generation = self.generation, factor, removed, "decay");
        removed
    }

    pub fn deposit(&mut self, node: usize, amount: f64) -> Result<()> {
        self.topology.check_node(node)?;
        check_amount(node, amount)?;
        self.gamma[node] += amount;
        self.ledger.record_deposit(amount);
        Ok(())
    }

    /// Remove up to `amount` from `node`, never driving it negative.
    /// Returns the amount actually removed.
    pub fn withdraw(&mut self, node: usize, amount: f64) -> Result<f64> {
        self.topology.check_node(node)?;
        check_amount(node, amount)?;
        let available = self.gamma[node];
        let removed = if amount >= available {
            if amount > available {
                trace!(node, requested = amount, available, "withdraw capped");
            }
            self.gamma[node] = 0.0;
            available
        } else {
            self.gamma[node] -= amount;
            amount
        };
        self.ledger.record_withdraw(removed);
        Ok(removed)
    }

    /// Overwrite one node. The change in total is recorded as seeded energy.
    pub fn set_value(&mut self, node: usize, value: f64) -> Result<()> {
        self.topology.check_node(node)?;
        check_amount(node, value)?;
        self.ledger.record_seed(value - self.gamma[node]);
        self.gamma[node] = value;
        Ok(())
    }

    pub fn total(&self) -> f64 {
        self.gamma.iter().sum()
    }

    /// Drift between the stored total and the total implied by the ledger.
    pub fn conservation_residual(&self) -> f64 {
        self.total() - self.ledger.expected_total()
    }

    pub fn value_at(&self, node: usize) -> Result<f64> {
        self.topology.check_node(node)?;
        Ok(self.gamma[node])
    }

    /// `(neighbor, value)` pairs in the topology's neighbor order.
    pub fn neighbor_values(&self, node: usize) -> Result<Vec<(usize, f64)>> {
        self.topology.check_node(node)?;
        Ok(self
            .topology
            .neighbors(node)
            .iter()
            .map(|&j| (j, self.gamma[j]))
            .collect())
    }

    pub fn hop_distance(&self, from: usize, to: usize) -> Result<Option<usize>> {
        self.topology.hop_distance(from, to)
    }

    /// Zero the field, the generation counter, and the ledger.
    pub fn reset(&mut self) {
        self.gamma.fill(0.0);
        self.generation = 0;
        self.ledger.clear();
        debug!(nodes = self.gamma.len(), "gamma field reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::Connectivity;

    fn cube(n: usize, config: FieldConfig) -> GammaField {
        let topo = Topology::cubic(n, n, n, Connectivity::Face).unwrap();
        GammaField::new(topo, config).unwrap()
    }

    #[test]
    fn test_new_field_is_zero() {
        let field = cube(4, FieldConfig::default());
        assert_eq!(field.values().len(), 64);
        assert!(field.values().iter().all(|&v| v == 0.0));
        assert_eq!(field.generation(), 0);
        assert!((field.alpha() - 1.0 / 6.0).abs() < 1e-15);
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let topo = Topology::cubic(3, 3, 3, Connectivity::Face).unwrap();
        let err = GammaField::new(topo, FieldConfig::linear().with_alpha(1.5)).unwrap_err();
        assert!(matches!(err, FieldError::Configuration(_)));
    }

    #[test]
    fn test_spread_conserves_and_advances_generation() {
        let mut field = cube(5, FieldConfig::self_gravitating(2.0));
        field.deposit(62, 10.0).unwrap();
        field.deposit(0, 3.0).unwrap();
        for _ in 0..25 {
            field.spread();
        }
        assert!((field.total() - 13.0).abs() < 1e-9);
        assert_eq!(field.generation(), 25);
        assert!(field.values().iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_single_spread_of_linear_field() {
        let mut field = cube(3, FieldConfig::linear());
        let center = field.topology().node_at([1, 1, 1]).unwrap();
        field.deposit(center, 6.0).unwrap();
        field.spread();
        assert!((field.value_at(center).unwrap() - 5.0).abs() < 1e-12);
        for (_, value) in field.neighbor_values(center).unwrap() {
            assert!((value - 1.0 / 6.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_dedicated_pool_matches_global_pool() {
        let mut a = cube(6, FieldConfig::attracting(1.0, 2.0));
        let mut b = cube(6, FieldConfig::attracting(1.0, 2.0).with_threads(2));
        for field in [&mut a, &mut b] {
            field.deposit(10, 5.0).unwrap();
            field.deposit(150, 8.0).unwrap();
            for _ in 0..20 {
                field.spread_attracting();
            }
        }
        assert_eq!(a.values(), b.values(), "thread count must not change the result");
    }

    #[test]
    fn test_withdraw_caps_at_available() {
        let mut field = cube(3, FieldConfig::linear());
        field.deposit(4, 2.0).unwrap();
        assert_eq!(field.withdraw(4, 0.5).unwrap(), 0.5);
        assert_eq!(field.withdraw(4, 10.0).unwrap(), 1.5);
        assert_eq!(field.value_at(4).unwrap(), 0.0);
        assert_eq!(field.withdraw(4, 1.0).unwrap(), 0.0);
        assert_eq!(field.ledger().withdrawn(), 2.0);
    }

    #[test]
    fn test_negative_amounts_rejected() {
        let mut field = cube(3, FieldConfig::linear());
        assert!(matches!(
            field.deposit(1, -1.0),
            Err(FieldError::NegativeAmount { node: 1, .. })
        ));
        assert!(field.withdraw(1, -0.5).is_err());
        assert!(field.deposit(1, f64::INFINITY).is_err());
        assert!(field.set_value(1, f64::NAN).is_err());
        assert_eq!(field.total(), 0.0);
    }

    #[test]
    fn test_out_of_range_node() {
        let mut field = cube(2, FieldConfig::linear());
        assert!(matches!(
            field.deposit(8, 1.0),
            Err(FieldError::NodeOutOfRange { node: 8, count: 8 })
        ));
        assert!(field.value_at(99).is_err());
        assert!(field.neighbor_values(8).is_err());
    }

    #[test]
    fn test_decay_reports_removed_energy() {
        let mut field = cube(3, FieldConfig::linear());
        field.deposit(0, 4.0).unwrap();
        field.deposit(1, 6.0).unwrap();
        let removed = field.decay(0.5).unwrap();
        assert!((removed - 5.0).abs() < 1e-12);
        assert!((field.total() - 5.0).abs() < 1e-12);
        assert!(field.decay(0.0).is_err());
        assert!(field.decay(1.01).is_err());
    }

    #[test]
    fn test_step_applies_configured_decay() {
        let mut field = cube(3, FieldConfig::linear().with_decay(0.9));
        field.deposit(13, 10.0).unwrap();
        field.step();
        assert!((field.total() - 9.0).abs() < 1e-12);
        assert_eq!(field.generation(), 1);
        assert!((field.ledger().decayed() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ledger_tracks_every_exchange() {
        let config = FieldConfig::self_gravitating(1.0)
            .with_decay(0.97)
            .with_history(true);
        let mut field = cube(4, config);
        field.set_value(5, 3.0).unwrap();
        for tick in 0..30 {
            field.deposit(tick % 64, 1.0).unwrap();
            field.withdraw((tick + 7) % 64, 0.4).unwrap();
            field.step();
        }
        assert!(field.conservation_residual().abs() < 1e-9);
        assert_eq!(field.ledger().history().len(), 30);
        assert_eq!(field.ledger().history()[0].deposited, 1.0);
    }

    #[test]
    fn test_history_is_off_by_default() {
        let mut field = cube(3, FieldConfig::linear());
        field.deposit(4, 2.0).unwrap();
        for _ in 0..50 {
            field.step();
        }
        assert!(field.ledger().history().is_empty());
        assert_eq!(field.ledger().deposited(), 2.0);
        assert!(field.conservation_residual().abs() < 1e-9);
    }

    #[test]
    fn test_set_value_records_seed_delta() {
        let mut field = cube(2, FieldConfig::linear());
        field.set_value(3, 5.0).unwrap();
        field.set_value(3, 2.0).unwrap();
        assert_eq!(field.ledger().seeded(), 2.0);
        assert_eq!(field.total(), 2.0);
    }

    #[test]
    fn test_reset() {
        let mut field = cube(3, FieldConfig::linear());
        field.deposit(3, 1.0).unwrap();
        field.spread();
        field.reset();
        assert_eq!(field.total(), 0.0);
        assert_eq!(field.generation(), 0);
        assert_eq!(field.ledger().deposited(), 0.0);
        assert!(field.ledger().history().is_empty());
    }

    #[test]
    fn test_fields_share_topology() {
        let field = cube(3, FieldConfig::linear());
        let sibling = GammaField::new(field.shared_topology(), FieldConfig::attracting(1.0, 1.0))
            .unwrap();
        assert_eq!(sibling.values().len(), field.values().len());
        assert_eq!(sibling.config().rule, SpreadRule::Attracting);
    }
}
