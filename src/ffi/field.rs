//! Stepping, source exchange, and diagnostics.
//!
//! Status-returning calls use 0 for success and 1 for failure. Distance
//! queries return a negative code when there is no answer.

use tracing::warn;

use crate::field::{GammaField, PeakSeparation};

/// # Safety
/// - `ptr` must be a valid field pointer, or null
///
/// # Returns
/// 0 on success, 1 on null pointer.
#[no_mangle]
pub unsafe extern "C" fn gf_spread(ptr: *mut GammaField) -> i32 {
    match ptr.as_mut() {
        Some(field) => {
            field.spread();
            0
        }
        None => 1,
    }
}

/// # Safety
/// - `ptr` must be a valid field pointer, or null
///
/// # Returns
/// 0 on success, 1 on null pointer.
#[no_mangle]
pub unsafe extern "C" fn gf_spread_attracting(ptr: *mut GammaField) -> i32 {
    match ptr.as_mut() {
        Some(field) => {
            field.spread_attracting();
            0
        }
        None => 1,
    }
}

/// One configured tick: spread by the configured rule, then decay.
///
/// # Safety
/// - `ptr` must be a valid field pointer, or null
#[no_mangle]
pub unsafe extern "C" fn gf_step(ptr: *mut GammaField) -> i32 {
    match ptr.as_mut() {
        Some(field) => {
            field.step();
            0
        }
        None => 1,
    }
}

/// # Safety
/// - `ptr` must be a valid field pointer, or null
///
/// # Returns
/// 0 on success, 1 on null pointer or a factor outside (0, 1].
#[no_mangle]
pub unsafe extern "C" fn gf_decay(ptr: *mut GammaField, factor: f64) -> i32 {
    let Some(field) = ptr.as_mut() else {
        return 1;
    };
    match field.decay(factor) {
        Ok(_) => 0,
        Err(err) => {
            warn!(%err, "gf_decay rejected");
            1
        }
    }
}

/// # Safety
/// - `ptr` must be a valid field pointer, or null
///
/// # Returns
/// 0 on success, 1 on null pointer, bad node, or negative amount.
#[no_mangle]
pub unsafe extern "C" fn gf_deposit(ptr: *mut GammaField, node: u64, amount: f64) -> i32 {
    let Some(field) = ptr.as_mut() else {
        return 1;
    };
    match field.deposit(node as usize, amount) {
        Ok(()) => 0,
        Err(err) => {
            warn!(%err, "gf_deposit rejected");
            1
        }
    }
}

/// # Safety
/// - `ptr` must be a valid field pointer, or null
///
/// # Returns
/// The amount actually removed, or -1.0 on error.
#[no_mangle]
pub unsafe extern "C" fn gf_withdraw(ptr: *mut GammaField, node: u64, amount: f64) -> f64 {
    let Some(field) = ptr.as_mut() else {
        return -1.0;
    };
    match field.withdraw(node as usize, amount) {
        Ok(removed) => removed,
        Err(err) => {
            warn!(%err, "gf_withdraw rejected");
            -1.0
        }
    }
}

/// # Safety
/// - `ptr` must be a valid field pointer, or null
///
/// # Returns
/// Sum over all nodes, or 0.0 if ptr is null.
#[no_mangle]
pub unsafe extern "C" fn gf_total(ptr: *const GammaField) -> f64 {
    ptr.as_ref().map_or(0.0, GammaField::total)
}

/// # Safety
/// - `ptr` must be a valid field pointer, or null
///
/// # Returns
/// Drift between the field total and its ledger, or 0.0 if ptr is null.
#[no_mangle]
pub unsafe extern "C" fn gf_conservation_residual(ptr: *const GammaField) -> f64 {
    ptr.as_ref().map_or(0.0, GammaField::conservation_residual)
}

/// # Safety
/// - `ptr` must be a valid field pointer, or null
///
/// # Returns
/// The node's value, or 0.0 for a null pointer or out-of-range node.
#[no_mangle]
pub unsafe extern "C" fn gf_value_at(ptr: *const GammaField, node: u64) -> f64 {
    ptr.as_ref()
        .and_then(|field| field.value_at(node as usize).ok())
        .unwrap_or(0.0)
}

/// # Safety
/// - `ptr` must be a valid field pointer, or null
///
/// # Returns
/// Hop count, or -1 when the nodes are disconnected or invalid.
#[no_mangle]
pub unsafe extern "C" fn gf_hop_distance(ptr: *const GammaField, from: u64, to: u64) -> i64 {
    let Some(field) = ptr.as_ref() else {
        return -1;
    };
    match field.hop_distance(from as usize, to as usize) {
        Ok(Some(hops)) => hops as i64,
        Ok(None) => -1,
        Err(err) => {
            warn!(%err, "gf_hop_distance rejected");
            -1
        }
    }
}

/// Hop distance between the two highest peaks at or above `min_value`.
///
/// # Safety
/// - `ptr` must be a valid field pointer, or null
///
/// # Returns
/// The distance (>= 1), -1 with fewer than two peaks, -2 when the peaks are
/// disconnected, -3 for a null pointer.
#[no_mangle]
pub unsafe extern "C" fn gf_peak_separation(ptr: *const GammaField, min_value: f64) -> i64 {
    let Some(field) = ptr.as_ref() else {
        return -3;
    };
    match field.peak_separation(min_value) {
        PeakSeparation::Apart(hops) => hops as i64,
        PeakSeparation::TooFewPeaks => -1,
        PeakSeparation::Disconnected => -2,
    }
}
