//! Box copies between a cubic-lattice field and flat buffers.
//!
//! Buffers are laid out in z,y,x order (z slowest, x fastest), the same order
//! the lattice uses for node indices. Bounds are half-open `[min, max)` and
//! clamped to the lattice, so callers may pass boxes that hang off the edge.

use crate::error::{FieldError, Result};
use crate::topology::lattice::index_of;
use crate::topology::TopologyKind;

use super::GammaField;

/// Clamped, non-empty box in lattice coordinates.
struct Bounds {
    min: [usize; 3],
    max: [usize; 3],
}

impl Bounds {
    fn len(&self) -> usize {
        (0..3).map(|axis| self.max[axis] - self.min[axis]).product()
    }

    /// Node indices in z,y,x order.
    fn nodes(&self, width: usize, height: usize) -> impl Iterator<Item = usize> + '_ {
        (self.min[2]..self.max[2]).flat_map(move |z| {
            (self.min[1]..self.max[1]).flat_map(move |y| {
                (self.min[0]..self.max[0]).map(move |x| index_of(width, height, x, y, z))
            })
        })
    }
}

impl GammaField {
    fn cubic_dims(&self) -> Result<[usize; 3]> {
        match self.topology().kind() {
            TopologyKind::Cubic {
                width,
                height,
                depth,
                ..
            } => Ok([*width, *height, *depth]),
            _ => Err(FieldError::NotCubicLattice),
        }
    }

    /// `None` when the clamped box is empty.
    fn clamp_box(&self, min: [i64; 3], max: [i64; 3]) -> Result<Option<Bounds>> {
        let dims = self.cubic_dims()?;
        let clamp = |v: i64, limit: usize| v.clamp(0, limit as i64) as usize;
        let lo = [clamp(min[0], dims[0]), clamp(min[1], dims[1]), clamp(min[2], dims[2])];
        let hi = [clamp(max[0], dims[0]), clamp(max[1], dims[1]), clamp(max[2], dims[2])];
        if (0..3).any(|axis| lo[axis] >= hi[axis]) {
            return Ok(None);
        }
        Ok(Some(Bounds { min: lo, max: hi }))
    }

    /// Copy the box `[min, max)` into `out`. Returns the number of values written.
    pub fn extract_region(&self, out: &mut [f64], min: [i64; 3], max: [i64; 3]) -> Result<usize> {
        let Some(bounds) = self.clamp_box(min, max)? else {
            return Ok(0);
        };
        let needed = bounds.len();
        if out.len() < needed {
            return Err(FieldError::BufferTooSmall {
                needed,
                got: out.len(),
            });
        }

        let [width, height, _] = self.cubic_dims()?;
        let gamma = self.values();
        for (slot, node) in out.iter_mut().zip(bounds.nodes(width, height)) {
            *slot = gamma[node];
        }
        Ok(needed)
    }

    /// Overwrite the box `[min, max)` from `input`. Returns the number of
    /// values read. The change in total is recorded as seeded energy.
    ///
    /// Nothing is written unless every value in range is finite and non-negative.
    pub fn import_region(&mut self, input: &[f64], min: [i64; 3], max: [i64; 3]) -> Result<usize> {
        let Some(bounds) = self.clamp_box(min, max)? else {
            return Ok(0);
        };
        let needed = bounds.len();
        if input.len() < needed {
            return Err(FieldError::BufferTooSmall {
                needed,
                got: input.len(),
            });
        }

        let [width, height, _] = self.cubic_dims()?;
        let nodes: Vec<usize> = bounds.nodes(width, height).collect();
        if let Some((&node, &amount)) = nodes
            .iter()
            .zip(input)
            .find(|(_, v)| !(v.is_finite() && **v >= 0.0))
        {
            return Err(FieldError::NegativeAmount { node, amount });
        }

        for (node, &value) in nodes.into_iter().zip(input) {
            self.set_value(node, value)?;
        }
        Ok(needed)
    }

    /// Copy the whole field into `out` in node order. Returns the node count.
    pub fn copy_values(&self, out: &mut [f64]) -> Result<usize> {
        let gamma = self.values();
        if out.len() < gamma.len() {
            return Err(FieldError::BufferTooSmall {
                needed: gamma.len(),
                got: out.len(),
            });
        }
        out[..gamma.len()].copy_from_slice(gamma);
        Ok(gamma.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldConfig;
    use crate::topology::{Connectivity, Topology};

    fn cube(w: usize, h: usize, d: usize) -> GammaField {
        let topo = Topology::cubic(w, h, d, Connectivity::Face).unwrap();
        GammaField::new(topo, FieldConfig::linear()).unwrap()
    }

    fn at(field: &GammaField, x: usize, y: usize, z: usize) -> usize {
        field.topology().node_at([x, y, z]).unwrap()
    }

    #[test]
    fn test_extract_region_layout() {
        let mut field = cube(8, 8, 8);
        let (a, b, c) = (at(&field, 2, 2, 2), at(&field, 3, 2, 2), at(&field, 2, 3, 2));
        field.set_value(a, 1.0).unwrap();
        field.set_value(b, 2.0).unwrap();
        field.set_value(c, 3.0).unwrap();

        let mut buffer = vec![0.0; 64];
        let written = field.extract_region(&mut buffer, [2, 2, 2], [6, 6, 6]).unwrap();
        assert_eq!(written, 64);
        assert_eq!(buffer[0], 1.0); // (2,2,2)
        assert_eq!(buffer[1], 2.0); // (3,2,2)
        assert_eq!(buffer[4], 3.0); // (2,3,2)
    }

    #[test]
    fn test_extract_region_is_clamped() {
        let field = cube(4, 4, 4);
        let mut buffer = vec![0.0; 512];
        let written = field
            .extract_region(&mut buffer, [-2, -2, -2], [10, 10, 10])
            .unwrap();
        assert_eq!(written, 64);
    }

    #[test]
    fn test_empty_or_inverted_region() {
        let mut field = cube(4, 4, 4);
        let mut buffer = vec![0.0; 8];
        assert_eq!(field.extract_region(&mut buffer, [3, 0, 0], [1, 4, 4]).unwrap(), 0);
        assert_eq!(field.import_region(&buffer, [5, 5, 5], [9, 9, 9]).unwrap(), 0);
    }

    #[test]
    fn test_buffer_too_small() {
        let field = cube(4, 4, 4);
        let mut buffer = vec![0.0; 7];
        assert!(matches!(
            field.extract_region(&mut buffer, [0, 0, 0], [2, 2, 2]),
            Err(FieldError::BufferTooSmall { needed: 8, got: 7 })
        ));
    }

    #[test]
    fn test_import_rejects_negative_without_writing() {
        let mut field = cube(2, 2, 2);
        let input = [1.0, 1.0, -1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        assert!(matches!(
            field.import_region(&input, [0, 0, 0], [2, 2, 2]),
            Err(FieldError::NegativeAmount { node: 2, .. })
        ));
        assert_eq!(field.total(), 0.0);
    }

    #[test]
    fn test_extract_import_symmetry() {
        let mut source = cube(8, 8, 8);
        let (a, b) = (at(&source, 2, 2, 2), at(&source, 3, 3, 3));
        source.set_value(a, 4.5).unwrap();
        source.set_value(b, 1.25).unwrap();
        source.spread();

        let mut buffer = vec![0.0; 64];
        source.extract_region(&mut buffer, [0, 0, 0], [4, 4, 4]).unwrap();

        let mut target = cube(8, 8, 8);
        assert_eq!(target.import_region(&buffer, [0, 0, 0], [4, 4, 4]).unwrap(), 64);
        assert_eq!(target.value_at(a).unwrap(), source.value_at(a).unwrap());
        assert_eq!(target.value_at(b).unwrap(), source.value_at(b).unwrap());
        assert!(target.conservation_residual().abs() < 1e-12);
    }

    #[test]
    fn test_region_requires_cubic_lattice() {
        let topo = Topology::hex(3, 3).unwrap();
        let field = GammaField::new(topo, FieldConfig::linear()).unwrap();
        let mut buffer = vec![0.0; 9];
        assert!(matches!(
            field.extract_region(&mut buffer, [0, 0, 0], [3, 3, 1]),
            Err(FieldError::NotCubicLattice)
        ));
        assert_eq!(field.copy_values(&mut buffer).unwrap(), 9);
    }
}
