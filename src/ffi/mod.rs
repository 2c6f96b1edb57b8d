//! C ABI for sweep harnesses and scripting hosts.
//!
//! All functions are `#[no_mangle] extern "C"` and take an opaque
//! `GammaField` pointer created by one of the `gf_create_*` functions.
//!
//! The actual logic lives in the `field` module. These functions are thin
//! wrappers that handle null checks, pointer safety, and mapping errors to
//! status codes. Rejected calls are logged at `warn` level.

pub mod field;
pub mod lifecycle;
pub mod region;

pub use field::{
    gf_conservation_residual, gf_decay, gf_deposit, gf_hop_distance, gf_peak_separation,
    gf_spread, gf_spread_attracting, gf_step, gf_total, gf_value_at, gf_withdraw,
};
pub use lifecycle::{
    gf_create_cubic, gf_create_hex, gf_create_small_world, gf_destroy, gf_get_generation,
    gf_node_count, gf_reset,
};
pub use region::{gf_copy_values, gf_extract_region, gf_import_region};
