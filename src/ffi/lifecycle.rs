//! Field creation, destruction, and generation queries.

use std::ffi::{c_char, CStr};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::warn;

use crate::config::FieldConfig;
use crate::error::Result;
use crate::field::GammaField;
use crate::topology::{Connectivity, Topology};

/// Parse an optional NUL-terminated JSON config. Null means defaults.
unsafe fn config_from_ptr(config_json: *const c_char) -> Option<FieldConfig> {
    if config_json.is_null() {
        return Some(FieldConfig::default());
    }
    let text = match CStr::from_ptr(config_json).to_str() {
        Ok(text) => text,
        Err(err) => {
            warn!(%err, "field config is not valid UTF-8");
            return None;
        }
    };
    match FieldConfig::from_json_str(text) {
        Ok(config) => Some(config),
        Err(err) => {
            warn!(%err, "rejected field config");
            None
        }
    }
}

fn into_handle(field: Result<GammaField>) -> *mut GammaField {
    match field {
        Ok(field) => Box::into_raw(Box::new(field)),
        Err(err) => {
            warn!(%err, "field creation failed");
            std::ptr::null_mut()
        }
    }
}

/// Creates a field on a cubic lattice.
///
/// `moore != 0` selects the 26-neighbor lattice, otherwise 6 face neighbors.
///
/// # Safety
/// - `config_json` must be null or a valid NUL-terminated string
///
/// # Returns
/// A pointer to a new field, or null on invalid dimensions or config.
/// Free it with `gf_destroy()`.
#[no_mangle]
pub unsafe extern "C" fn gf_create_cubic(
    width: u32,
    height: u32,
    depth: u32,
    moore: u8,
    config_json: *const c_char,
) -> *mut GammaField {
    let Some(config) = config_from_ptr(config_json) else {
        return std::ptr::null_mut();
    };
    let connectivity = if moore != 0 {
        Connectivity::Moore
    } else {
        Connectivity::Face
    };
    into_handle(
        Topology::cubic(width as usize, height as usize, depth as usize, connectivity)
            .and_then(|topo| GammaField::new(topo, config)),
    )
}

/// Creates a field on a `width` x `height` axial hex lattice.
///
/// # Safety
/// - `config_json` must be null or a valid NUL-terminated string
///
/// # Returns
/// A pointer to a new field, or null on failure.
#[no_mangle]
pub unsafe extern "C" fn gf_create_hex(
    width: u32,
    height: u32,
    config_json: *const c_char,
) -> *mut GammaField {
    let Some(config) = config_from_ptr(config_json) else {
        return std::ptr::null_mut();
    };
    into_handle(
        Topology::hex(width as usize, height as usize).and_then(|topo| GammaField::new(topo, config)),
    )
}

/// Creates a field on a small-world graph built from `seed`.
///
/// # Safety
/// - `config_json` must be null or a valid NUL-terminated string
///
/// # Returns
/// A pointer to a new field, or null on failure.
#[no_mangle]
pub unsafe extern "C" fn gf_create_small_world(
    nodes: u32,
    degree: u32,
    rewire: f64,
    seed: u64,
    config_json: *const c_char,
) -> *mut GammaField {
    let Some(config) = config_from_ptr(config_json) else {
        return std::ptr::null_mut();
    };
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    into_handle(
        Topology::small_world(nodes as usize, degree as usize, rewire, &mut rng)
            .and_then(|topo| GammaField::new(topo, config)),
    )
}

/// Destroys a field and frees its memory.
///
/// # Safety
/// - `ptr` must be a pointer returned by one of the `gf_create_*` functions, or null
/// - `ptr` must not be used after this call
#[no_mangle]
pub unsafe extern "C" fn gf_destroy(ptr: *mut GammaField) {
    if !ptr.is_null() {
        drop(Box::from_raw(ptr));
    }
}

/// # Safety
/// - `ptr` must be a valid field pointer, or null
///
/// # Returns
/// The generation counter, or 0 if ptr is null.
#[no_mangle]
pub unsafe extern "C" fn gf_get_generation(ptr: *const GammaField) -> u64 {
    match ptr.as_ref() {
        Some(field) => field.generation(),
        None => 0,
    }
}

/// # Safety
/// - `ptr` must be a valid field pointer, or null
///
/// # Returns
/// Number of nodes, or 0 if ptr is null.
#[no_mangle]
pub unsafe extern "C" fn gf_node_count(ptr: *const GammaField) -> u64 {
    match ptr.as_ref() {
        Some(field) => field.topology().node_count() as u64,
        None => 0,
    }
}

/// Zeroes the field, its generation, and its ledger.
///
/// # Safety
/// - `ptr` must be a valid field pointer, or null
///
/// # Returns
/// 0 on success, 1 on null pointer.
#[no_mangle]
pub unsafe extern "C" fn gf_reset(ptr: *mut GammaField) -> i32 {
    match ptr.as_mut() {
        Some(field) => {
            field.reset();
            0
        }
        None => 1,
    }
}
