//! Bulk value copies between a field and caller-owned buffers.

use tracing::warn;

use crate::field::GammaField;

/// Copies every node value into `out_buf` in node order.
///
/// # Safety
/// - `ptr` must be a valid field pointer, or null
/// - `out_buf` must point to at least `out_len` writable doubles, or be null
///
/// # Returns
/// Number of values written, or 0 on error.
#[no_mangle]
pub unsafe extern "C" fn gf_copy_values(
    ptr: *const GammaField,
    out_buf: *mut f64,
    out_len: u64,
) -> u64 {
    let Some(field) = ptr.as_ref() else {
        return 0;
    };
    if out_buf.is_null() {
        return 0;
    }
    let out = std::slice::from_raw_parts_mut(out_buf, out_len as usize);
    match field.copy_values(out) {
        Ok(written) => written as u64,
        Err(err) => {
            warn!(%err, "gf_copy_values rejected");
            0
        }
    }
}

/// Extracts the box `[min, max)` of a cubic-lattice field into a flat buffer.
///
/// # Layout
/// The buffer is filled in z,y,x order (z changes slowest, x changes fastest).
/// This matches the layout expected by `gf_import_region`.
///
/// # Safety
/// - `ptr` must be a valid field pointer, or null
/// - `out_buf` must point to at least `out_len` writable doubles, or be null
///
/// # Returns
/// Number of values written, or 0 on error or an empty box.
#[no_mangle]
pub unsafe extern "C" fn gf_extract_region(
    ptr: *const GammaField,
    out_buf: *mut f64,
    out_len: u64,
    min_x: i64,
    min_y: i64,
    min_z: i64,
    max_x: i64,
    max_y: i64,
    max_z: i64,
) -> u64 {
    let Some(field) = ptr.as_ref() else {
        return 0;
    };
    if out_buf.is_null() {
        return 0;
    }
    let out = std::slice::from_raw_parts_mut(out_buf, out_len as usize);
    match field.extract_region(out, [min_x, min_y, min_z], [max_x, max_y, max_z]) {
        Ok(written) => written as u64,
        Err(err) => {
            warn!(%err, "gf_extract_region rejected");
            0
        }
    }
}

/// Overwrites the box `[min, max)` of a cubic-lattice field from a flat buffer.
///
/// # Layout
/// The buffer is read in z,y,x order (matching `gf_extract_region`).
/// Negative or non-finite values reject the whole import.
///
/// # Safety
/// - `ptr` must be a valid field pointer, or null
/// - `in_buf` must point to at least `in_len` readable doubles, or be null
///
/// # Returns
/// Number of values read, or 0 on error or an empty box.
#[no_mangle]
pub unsafe extern "C" fn gf_import_region(
    ptr: *mut GammaField,
    in_buf: *const f64,
    in_len: u64,
    min_x: i64,
    min_y: i64,
    min_z: i64,
    max_x: i64,
    max_y: i64,
    max_z: i64,
) -> u64 {
    let Some(field) = ptr.as_mut() else {
        return 0;
    };
    if in_buf.is_null() {
        return 0;
    }
    let input = std::slice::from_raw_parts(in_buf, in_len as usize);
    match field.import_region(input, [min_x, min_y, min_z], [max_x, max_y, max_z]) {
        Ok(read) => read as u64,
        Err(err) => {
            warn!(%err, "gf_import_region rejected");
            0
        }
    }
}
