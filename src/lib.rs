//! Gamma Field - conservative diffusion with self-gravitation
//!
//! A scalar energy field lives on the nodes of a fixed topology (cubic or hex
//! lattice, small-world graph, or explicit adjacency). Each tick every node
//! hands a fraction of its value to its neighbors; that fraction shrinks as the
//! node fills up, so concentrations resist dispersal. A gradient-biased variant
//! steers outflow toward fuller neighbors, which lets separate peaks draw
//! together.
//!
//! The crate is usable from Rust directly and, through the `gf_*` C ABI in
//! [`ffi`], from sweep scripts loading it as a shared library.

pub mod config;
pub mod error;
pub mod ffi;
pub mod field;
pub mod source;
pub mod topology;

pub use config::{FieldConfig, SpreadRule};
pub use error::{FieldError, Result};
pub use field::{
    EnergyLedger, GammaField, Gradient, Peak, PeakSeparation, PeakTracker, TickRecord,
};
pub use source::{DepositMode, SourceExchange, SourcePosition};
pub use topology::{Connectivity, Topology, TopologyKind};
