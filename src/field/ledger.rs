//! Energy bookkeeping.
//!
//! Spread is pure redistribution; every other change to the field total goes
//! through one of the counters here. Analysis code picks its own "energy"
//! metric from these raw quantities.

use serde::Serialize;

/// External exchanges recorded during one generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TickRecord {
    pub generation: u64,
    pub deposited: f64,
    pub withdrawn: f64,
    pub decayed: f64,
}

impl TickRecord {
    /// Net energy the tick added to the field.
    pub fn net(&self) -> f64 {
        self.deposited - self.withdrawn - self.decayed
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EnergyLedger {
    seeded: f64,
    deposited: f64,
    withdrawn: f64,
    decayed: f64,
    current: TickRecord,
    history: Vec<TickRecord>,
    keep_history: bool,
}

impl EnergyLedger {
    pub fn new(keep_history: bool) -> Self {
        EnergyLedger {
            keep_history,
            ..Default::default()
        }
    }

    /// Energy placed directly by initialization (may be negative when a value is lowered).
    pub(crate) fn record_seed(&mut self, delta: f64) {
        self.seeded += delta;
    }

    pub(crate) fn record_deposit(&mut self, amount: f64) {
        self.deposited += amount;
        self.current.deposited += amount;
    }

    pub(crate) fn record_withdraw(&mut self, amount: f64) {
        self.withdrawn += amount;
        self.current.withdrawn += amount;
    }

    pub(crate) fn record_decay(&mut self, amount: f64) {
        self.decayed += amount;
        self.current.decayed += amount;
    }

    /// Close the record for the finished generation and open one for `next`.
    pub(crate) fn close_tick(&mut self, next: u64) {
        if self.keep_history {
            self.history.push(self.current);
        }
        self.current = TickRecord {
            generation: next,
            ..Default::default()
        };
    }

    pub(crate) fn clear(&mut self) {
        *self = EnergyLedger::new(self.keep_history);
    }

    pub fn seeded(&self) -> f64 {
        self.seeded
    }

    pub fn deposited(&self) -> f64 {
        self.deposited
    }

    pub fn withdrawn(&self) -> f64 {
        self.withdrawn
    }

    pub fn decayed(&self) -> f64 {
        self.decayed
    }

    /// The total the field should hold if nothing but the recorded exchanges changed it.
    pub fn expected_total(&self) -> f64 {
        self.seeded + self.deposited - self.withdrawn - self.decayed
    }

    /// Exchanges recorded so far in the generation still in progress.
    pub fn current(&self) -> &TickRecord {
        &self.current
    }

    /// One record per completed generation, oldest first.
    pub fn history(&self) -> &[TickRecord] {
        &self.history
    }
}
