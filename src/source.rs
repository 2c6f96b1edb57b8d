//! Moving energy sources.
//!
//! A source is owned by the caller's entity logic; the field only sees the
//! deposit and withdraw calls it produces. In mass-conserving mode the source
//! pulls its deposit back out of the node it left, so a steadily moving
//! source adds roughly nothing to the field once it reaches steady state. In
//! unconditional mode it is a pure net source and the field total grows
//! unless decay balances it.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::field::{check_amount, GammaField};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositMode {
    /// Withdraw from the previous node, deposit at the current one.
    #[default]
    MassConserving,
    /// Deposit only.
    Unconditional,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourcePosition {
    pub node: usize,
    /// Node occupied before the most recent move. Kept until the next move.
    pub previous_node: Option<usize>,
    pub deposit_amount: f64,
}

impl SourcePosition {
    pub fn new(node: usize, deposit_amount: f64) -> Self {
        SourcePosition {
            node,
            previous_node: None,
            deposit_amount,
        }
    }

    /// Move to `node`. Staying on the same node keeps the old previous node.
    pub fn move_to(&mut self, node: usize) {
        if node != self.node {
            self.previous_node = Some(self.node);
            self.node = node;
        }
    }
}

/// What one source application exchanged with the field.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SourceExchange {
    pub deposited: f64,
    pub withdrawn: f64,
}

impl SourceExchange {
    pub fn net(&self) -> f64 {
        self.deposited - self.withdrawn
    }
}

impl GammaField {
    /// Apply one tick of `source` using the field's configured deposit mode.
    pub fn apply_source(&mut self, source: &SourcePosition) -> Result<SourceExchange> {
        self.apply_source_with(source, self.config().deposit_mode)
    }

    /// Apply one tick of `source` with an explicit deposit mode.
    ///
    /// The withdrawal comes first and is capped at what the previous node
    /// still holds after spread and decay drained it. Nodes and amount are
    /// checked up front, so a rejected source leaves the field untouched.
    pub fn apply_source_with(
        &mut self,
        source: &SourcePosition,
        mode: DepositMode,
    ) -> Result<SourceExchange> {
        self.topology().check_node(source.node)?;
        if let (DepositMode::MassConserving, Some(previous)) = (mode, source.previous_node) {
            self.topology().check_node(previous)?;
        }
        check_amount(source.node, source.deposit_amount)?;

        let withdrawn = match (mode, source.previous_node) {
            (DepositMode::MassConserving, Some(previous)) => {
                self.withdraw(previous, source.deposit_amount)?
            }
            _ => 0.0,
        };
        self.deposit(source.node, source.deposit_amount)?;
        Ok(SourceExchange {
            deposited: source.deposit_amount,
            withdrawn,
        })
    }
}
